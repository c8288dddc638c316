//! fxpresets - command-line entry point.
//!
//! # Execution Flow
//!
//! 1. Parse arguments
//! 2. Load `settings.yaml` and `FXPRESETS_*` overrides from the config directory
//! 3. Initialize logging → `<log_dir>/<log_prefix>.<date>`
//! 4. Load `config.yaml` and restore devices with their saved effects
//! 5. Run the command and print its YAML result
//! 6. Log the metrics summary
//!
//! Any error is reported by `main` returning `Err`, which exits non-zero.

use anyhow::Result;
use fxpresets::cli::{self, Cli};
use fxpresets::{APP_NAME, ConfigManager, EffectRegistry, Metrics, PresetManager, VERSION};
use std::sync::Arc;

fn main() -> Result<()> {
    let args = Cli::parse_args();

    let config_manager = Arc::new(ConfigManager::new(&args.config_dir)?);

    let mut settings = config_manager.load_settings()?;
    settings.debug_mode |= args.debug;

    let _guard = fxpresets::logging::setup_logging(&settings)?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let document = config_manager.load_document()?;
    let effects = Arc::new(EffectRegistry::with_builtin_effects());
    tracing::debug!("Effect registry initialized with {} types", effects.len());

    let metrics = Arc::new(Metrics::new());
    let manager = PresetManager::from_document(
        document,
        effects,
        config_manager.clone(),
        settings.event_buffer,
    )
    .with_metrics(metrics.clone());

    let result = cli::execute(&args.command, &manager);
    metrics.log_summary();

    match result {
        Ok(output) => {
            print!("{}", output);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Command failed: {:#}", e);
            Err(e)
        }
    }
}
