use serde::{Deserialize, Serialize};

/// Application settings from `settings.yaml` and `FXPRESETS_*` environment variables.
///
/// Missing keys fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Directory for rolling log files
    pub log_dir: String,

    /// File name prefix for log files
    pub log_prefix: String,

    /// Log at debug level instead of info
    pub debug_mode: bool,

    /// Mirror log output to the console
    pub console_output: bool,

    /// Capacity of the state change broadcast channel
    pub event_buffer: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            log_prefix: "fxpresets".to_string(),
            debug_mode: false,
            console_output: true,
            event_buffer: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.log_dir, "logs");
        assert_eq!(settings.log_prefix, "fxpresets");
        assert!(!settings.debug_mode);
        assert!(settings.console_output);
        assert_eq!(settings.event_buffer, 100);
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: AppSettings = serde_yaml_ng::from_str("debug_mode: true").unwrap();
        assert!(settings.debug_mode);
        assert_eq!(settings.log_dir, "logs");
    }
}
