use crate::models::{EffectConfig, PresetNamespaces, PresetRecord};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("Invalid preset id regex"));

/// Derive a preset id from a display name.
///
/// Lowercases the name, collapses every run of characters outside `[a-z0-9]`
/// into a single `-` and trims separators from both ends. Distinct names that
/// normalise to the same id share a slot; the later save wins.
///
/// # Example
///
/// ```
/// use fxpresets::presets::derive_id;
///
/// assert_eq!(derive_id("My Red"), "my-red");
/// assert_eq!(derive_id("  Fire!! & Ice "), "fire-ice");
/// ```
pub fn derive_id(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Why a preset lookup failed.
///
/// Callers branch on "not found" only; the variants exist for diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Effect {0} has no presets")]
    NoPresetsForEffect(String),

    #[error("Preset {preset_id} does not exist for effect {effect_type}")]
    PresetMissing {
        effect_type: String,
        preset_id: String,
    },
}

/// In-memory preset namespace, partitioned by effect type.
#[derive(Debug, Clone, Default)]
pub struct PresetStore {
    presets: PresetNamespaces,
    dirty: bool,
}

impl PresetStore {
    pub fn new(presets: PresetNamespaces) -> Self {
        Self {
            presets,
            dirty: false,
        }
    }

    /// Look up a preset
    pub fn get(&self, effect_type: &str, preset_id: &str) -> Result<&PresetRecord, LookupError> {
        let namespace = self
            .presets
            .get(effect_type)
            .ok_or_else(|| LookupError::NoPresetsForEffect(effect_type.to_string()))?;

        namespace
            .get(preset_id)
            .ok_or_else(|| LookupError::PresetMissing {
                effect_type: effect_type.to_string(),
                preset_id: preset_id.to_string(),
            })
    }

    /// Insert or overwrite a preset, creating the effect namespace if needed.
    ///
    /// The config is stored as given; validation happens when a preset is applied.
    pub fn put(&mut self, effect_type: &str, preset_id: &str, name: &str, config: EffectConfig) {
        let previous = self
            .presets
            .entry(effect_type.to_string())
            .or_default()
            .insert(
                preset_id.to_string(),
                PresetRecord {
                    name: name.to_string(),
                    config,
                },
            );

        if previous.is_some() {
            tracing::debug!("Overwrote preset {}/{}", effect_type, preset_id);
        }
        self.dirty = true;
    }

    /// True if `effect_type` has a presets namespace (possibly empty)
    pub fn contains_effect(&self, effect_type: &str) -> bool {
        self.presets.contains_key(effect_type)
    }

    /// Presets of one effect type in insertion order
    pub fn list(&self, effect_type: &str) -> Vec<(&str, &PresetRecord)> {
        self.presets
            .get(effect_type)
            .map(|namespace| {
                namespace
                    .iter()
                    .map(|(id, preset)| (id.as_str(), preset))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of presets across all namespaces
    pub fn len(&self) -> usize {
        self.presets.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn namespaces(&self) -> &PresetNamespaces {
        &self.presets
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_yaml_ng::Value;

    fn color(name: &str) -> EffectConfig {
        let mut config = EffectConfig::new();
        config.insert("color".to_string(), Value::from(name));
        config
    }

    #[test]
    fn test_derive_id_basic() {
        assert_eq!(derive_id("My Red"), "my-red");
        assert_eq!(derive_id("red"), "red");
        assert_eq!(derive_id("Warm White 2700K"), "warm-white-2700k");
    }

    #[test]
    fn test_derive_id_collapses_separators() {
        assert_eq!(derive_id("  Fire!! & Ice "), "fire-ice");
        assert_eq!(derive_id("a__b--c"), "a-b-c");
        assert_eq!(derive_id("---"), "");
        assert_eq!(derive_id(""), "");
    }

    #[test]
    fn test_derive_id_collision() {
        assert_eq!(derive_id("My Red"), derive_id("my-red"));
        assert_eq!(derive_id("My Red"), derive_id("MY  RED!"));
    }

    #[test]
    fn test_get_distinguishes_reasons() {
        let mut store = PresetStore::default();
        assert_eq!(
            store.get("solid", "red").unwrap_err(),
            LookupError::NoPresetsForEffect("solid".to_string())
        );

        store.put("solid", "blue", "Blue", color("blue"));
        assert!(matches!(
            store.get("solid", "red").unwrap_err(),
            LookupError::PresetMissing { .. }
        ));
    }

    #[test]
    fn test_put_overwrites() {
        let mut store = PresetStore::default();
        store.put("solid", "my-red", "My Red", color("red"));
        store.put("solid", "my-red", "my red", color("#ff0000"));

        assert_eq!(store.len(), 1);
        let preset = store.get("solid", "my-red").unwrap();
        assert_eq!(preset.name, "my red");
        assert_eq!(preset.config, color("#ff0000"));
    }

    #[test]
    fn test_ids_scoped_per_effect_type() {
        let mut store = PresetStore::default();
        store.put("solid", "party", "Party", color("red"));
        store.put("strobe", "party", "Party", color("blue"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.list("solid").len(), 1);
        assert_eq!(
            store.namespaces().keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["solid", "strobe"]
        );
        assert!(store.list("rainbow").is_empty());
    }

    #[test]
    fn test_dirty_tracking() {
        let mut store = PresetStore::default();
        assert!(!store.is_dirty());

        store.put("solid", "red", "Red", color("red"));
        assert!(store.is_dirty());

        store.mark_clean();
        assert!(!store.is_dirty());
        assert!(store.contains_effect("solid"));
    }

    proptest! {
        #[test]
        fn derive_id_is_idempotent(name in ".{0,40}") {
            let id = derive_id(&name);
            prop_assert_eq!(derive_id(&id), id.clone());
        }

        #[test]
        fn derive_id_charset(name in ".{0,40}") {
            let id = derive_id(&name);
            prop_assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!id.starts_with('-') && !id.ends_with('-'));
            prop_assert!(!id.contains("--"));
        }
    }
}
