//! Preset storage and the operations that move presets between the store
//! and devices.
//!
//! [`PresetStore`] is the in-memory namespace of presets keyed by effect type
//! and preset id. [`PresetManager`] implements the four device operations
//! (query, apply, capture, clear) on top of the device registry, the effect
//! registry and the shared [`ConfigContext`](crate::state::ConfigContext).

pub mod manager;
pub mod store;

pub use manager::{
    ApplyPresetRequest, CapturePresetRequest, DeviceSummary, EffectTypeInfo, ParameterInfo,
    PresetDescriptor, PresetError, PresetManager,
};
pub use store::{LookupError, PresetStore, derive_id};
