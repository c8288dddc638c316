use crate::models::{AppSettings, ConfigDocument};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::Write;
use thiserror::Error;

/// Errors raised while writing the configuration document
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] serde_yaml_ng::Error),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Durable storage for the configuration document.
///
/// Implementations must make each `save` atomic: a crash mid-write leaves
/// either the old or the new document, never a mix.
#[cfg_attr(test, mockall::automock)]
pub trait PersistenceGateway: Send + Sync {
    fn save(&self, document: &ConfigDocument) -> Result<(), PersistError>;
}

/// Configuration manager for loading and saving YAML configuration files.
///
/// Manages two files in the configuration directory:
/// - `config.yaml`: The configuration document (presets, devices, anything else)
/// - `settings.yaml`: Optional application settings, overridable via `FXPRESETS_*` variables
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    document_path: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing configuration files (e.g., "fxpresets-data")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            document_path: config_dir.join("config.yaml"),
            settings_path: config_dir.join("settings.yaml"),
            config_dir,
        })
    }

    /// Load the configuration document.
    ///
    /// # Returns
    /// The loaded document, or an empty one if the file doesn't exist
    pub fn load_document(&self) -> Result<ConfigDocument> {
        if !self.document_path.exists() {
            tracing::warn!(
                "Config file not found at {}, starting with an empty document",
                self.document_path
            );
            return Ok(ConfigDocument::default());
        }

        let file_contents = fs::read_to_string(&self.document_path)
            .with_context(|| format!("Failed to read config: {}", self.document_path))?;

        let document: ConfigDocument = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse config: {}", self.document_path))?;

        tracing::info!(
            "Loaded config from {} ({} devices, {} presets)",
            self.document_path,
            document.devices.len(),
            document.preset_count()
        );
        Ok(document)
    }

    /// Save the configuration document atomically.
    ///
    /// Writes to a temp file beside the target, syncs it, then renames it over
    /// the target.
    pub fn save_document(&self, document: &ConfigDocument) -> Result<(), PersistError> {
        let yaml_string = serde_yaml_ng::to_string(document)?;
        let temp_path = self.document_path.with_extension("yaml.tmp");

        let mut file = fs::File::create(&temp_path).map_err(io_error(&temp_path))?;
        file.write_all(yaml_string.as_bytes())
            .map_err(io_error(&temp_path))?;
        file.sync_all().map_err(io_error(&temp_path))?;
        drop(file);

        fs::rename(&temp_path, &self.document_path).map_err(io_error(&self.document_path))?;

        tracing::debug!("Saved config to {}", self.document_path);
        Ok(())
    }

    /// Load application settings.
    ///
    /// Layers, lowest priority first: built-in defaults, `settings.yaml` if
    /// present, then `FXPRESETS_*` environment variables (e.g. `FXPRESETS_DEBUG_MODE=true`).
    pub fn load_settings(&self) -> Result<AppSettings> {
        let settings = config::Config::builder()
            .add_source(
                config::File::new(self.settings_path.as_str(), config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(config::Environment::with_prefix("FXPRESETS").try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let settings: AppSettings = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        Ok(settings)
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the configuration document path.
    pub fn document_path(&self) -> &Utf8Path {
        &self.document_path
    }
}

fn io_error(path: &Utf8Path) -> impl FnOnce(std::io::Error) -> PersistError + use<> {
    let path = path.to_path_buf();
    move |source| PersistError::Io { path, source }
}

impl PersistenceGateway for ConfigManager {
    fn save(&self, document: &ConfigDocument) -> Result<(), PersistError> {
        self.save_document(document)
    }
}
