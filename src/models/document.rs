use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;

/// Parameter name to value mapping for an effect.
///
/// Insertion order is preserved so a saved document reads back the way it was written.
pub type EffectConfig = IndexMap<String, Value>;

/// Presets partitioned by effect type, then by preset id.
pub type PresetNamespaces = IndexMap<String, IndexMap<String, PresetRecord>>;

/// Durable root record stored in `config.yaml`.
///
/// Only `presets` and `devices` are interpreted by this crate. Every other
/// top-level key is carried through load/save untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub presets: PresetNamespaces,

    #[serde(default)]
    pub devices: Vec<DeviceRecord>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A saved preset: display name plus a snapshot of an effect configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetRecord {
    pub name: String,

    #[serde(default)]
    pub config: EffectConfig,
}

/// Persisted description of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: String,

    #[serde(rename = "type", default)]
    pub device_type: String,

    #[serde(default)]
    pub config: IndexMap<String, Value>,

    /// Mirrors the device's active effect. Absent when the slot is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<EffectRecord>,
}

/// The `effect` sub-record of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRecord {
    #[serde(rename = "type")]
    pub effect_type: String,

    #[serde(default)]
    pub config: EffectConfig,
}

impl DeviceRecord {
    /// Create a record with no device config and no effect
    pub fn new(id: impl Into<String>, device_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            device_type: device_type.into(),
            config: IndexMap::new(),
            effect: None,
        }
    }

    /// Display name from the device config, falling back to the id
    pub fn display_name(&self) -> &str {
        self.config
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(&self.id)
    }
}

impl ConfigDocument {
    /// Find a device record by id
    pub fn device(&self, device_id: &str) -> Option<&DeviceRecord> {
        self.devices.iter().find(|d| d.id == device_id)
    }

    /// Total number of presets across all effect types
    pub fn preset_count(&self) -> usize {
        self.presets.values().map(IndexMap::len).sum()
    }
}
