//! Command-line front end for the preset manager.
//!
//! Every command prints its result as YAML on stdout. Failures propagate as
//! errors so the binary exits non-zero.

use crate::presets::{ApplyPresetRequest, CapturePresetRequest, PresetManager};
use anyhow::Result;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use serde::Serialize;

/// fxpresets - manage LED effect presets for configured devices
#[derive(Parser, Debug)]
#[command(name = "fxpresets")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding config.yaml and settings.yaml
    #[arg(long, global = true, default_value = "fxpresets-data")]
    pub config_dir: Utf8PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List devices and their active effects
    Devices,

    /// List registered effect types
    Effects,

    /// List stored presets, optionally for one effect type
    Presets {
        /// Effect type to list
        effect_type: Option<String>,
    },

    /// Show a device's active effect
    Show {
        /// Device id
        device: String,
    },

    /// Apply a stored preset to a device
    Apply {
        /// Device id
        device: String,

        /// Effect type of the preset
        #[arg(long = "effect")]
        effect: Option<String>,

        /// Preset id
        #[arg(long = "preset")]
        preset: Option<String>,
    },

    /// Save a device's active effect as a named preset
    Capture {
        /// Device id
        device: String,

        /// Display name of the new preset
        #[arg(long)]
        name: Option<String>,
    },

    /// Clear a device's active effect
    Clear {
        /// Device id
        device: String,
    },
}

/// Run one command against the manager and render its result as YAML.
pub fn execute(command: &Command, manager: &PresetManager) -> Result<String> {
    match command {
        Command::Devices => render(&manager.device_summaries()),
        Command::Effects => render(&manager.effect_types()),
        Command::Presets { effect_type } => match effect_type {
            Some(effect_type) => render(&manager.list_presets(effect_type)),
            None => render(&manager.context().snapshot().presets),
        },
        Command::Show { device } => render(&manager.active_effect(device)?),
        Command::Apply {
            device,
            effect,
            preset,
        } => {
            let request = ApplyPresetRequest {
                effect_id: effect.clone(),
                preset_id: preset.clone(),
            };
            render(&manager.apply_preset(device, &request)?)
        }
        Command::Capture { device, name } => {
            let request = CapturePresetRequest { name: name.clone() };
            render(&manager.capture_preset(device, &request)?)
        }
        Command::Clear { device } => render(&manager.clear_effect(device)?),
    }
}

fn render<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_yaml_ng::to_string(value)?)
}
