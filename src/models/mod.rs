//! Data models for fxpresets.
//!
//! - [`ConfigDocument`]: The durable root record (`config.yaml`) holding presets and device records
//! - [`PresetRecord`]: A named snapshot of an effect configuration
//! - [`DeviceRecord`] / [`EffectRecord`]: Persisted device descriptions and their active effect binding
//! - [`AppSettings`]: Logging and runtime settings loaded from `settings.yaml` and the environment
//!
//! All document structs derive `Serialize`/`Deserialize` for YAML persistence. Runtime
//! state lives elsewhere: devices in [`crate::devices`], the locked in-memory document
//! in [`crate::state::ConfigContext`].

pub mod document;
pub mod settings;

pub use document::{
    ConfigDocument, DeviceRecord, EffectConfig, EffectRecord, PresetNamespaces, PresetRecord,
};
pub use settings::AppSettings;
