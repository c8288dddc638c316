// fxpresets - Effect presets for LED devices
//
// This is the library crate containing the preset store, the device and effect
// registries and the configuration context. The binary crate (main.rs) provides
// the command-line entry point.

pub mod cli;
pub mod config;
pub mod devices;
pub mod effects;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod presets;
pub mod state;

// Re-export commonly used types for convenience
pub use config::{ConfigManager, PersistError, PersistenceGateway};
pub use devices::{Device, DeviceRegistry};
pub use effects::{Effect, EffectDescriptor, EffectError, EffectRegistry, EffectSlot};
pub use metrics::Metrics;
pub use models::{AppSettings, ConfigDocument};
pub use presets::{ApplyPresetRequest, CapturePresetRequest, PresetError, PresetManager};
pub use state::{ConfigContext, StateChange};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
