//! Built-in effects
//!
//! The standard effect types that ship with fxpresets. Each definition parses
//! its validated config into typed fields once, at construction.

use serde_yaml_ng::Value;

use super::registry::{EffectDefinition, EffectRegistry, ParamKind, ParamSpec};
use super::{Effect, EffectError};
use crate::models::EffectConfig;

/// Register all built-in effects with the registry
pub fn register_builtin_effects(registry: &mut EffectRegistry) {
    registry.register(SolidDefinition);
    registry.register(GradientDefinition);
    registry.register(RainbowDefinition);
    registry.register(StrobeDefinition);
}

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("orange", [255, 120, 0]),
    ("yellow", [255, 200, 0]),
    ("green", [0, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("blue", [0, 0, 255]),
    ("purple", [128, 0, 255]),
    ("magenta", [255, 0, 255]),
    ("pink", [255, 0, 120]),
];

/// Parse a named color or a `#rrggbb` hex string
pub fn parse_color(value: &str) -> Option<[u8; 3]> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some([channel(0)?, channel(2)?, channel(4)?]);
    }

    NAMED_COLORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(value))
        .map(|(_, rgb)| *rgb)
}

fn color_param(config: &EffectConfig, name: &str, default: [u8; 3]) -> [u8; 3] {
    config
        .get(name)
        .and_then(Value::as_str)
        .and_then(parse_color)
        .unwrap_or(default)
}

fn float_param(config: &EffectConfig, name: &str, default: f64) -> f64 {
    config.get(name).and_then(Value::as_f64).unwrap_or(default)
}

// Solid

pub struct SolidDefinition;

#[derive(Debug)]
pub struct SolidEffect {
    config: EffectConfig,
    pub color: [u8; 3],
    pub brightness: f64,
}

static SOLID_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("color", ParamKind::Color, "Fill color"),
    ParamSpec::new(
        "brightness",
        ParamKind::Float { min: 0.0, max: 1.0 },
        "Output brightness",
    ),
];

impl EffectDefinition for SolidDefinition {
    fn effect_type(&self) -> &'static str {
        "solid"
    }

    fn display_name(&self) -> &'static str {
        "Solid"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        SOLID_PARAMS
    }

    fn build(&self, config: EffectConfig) -> Result<Box<dyn Effect>, EffectError> {
        Ok(Box::new(SolidEffect {
            color: color_param(&config, "color", [255, 255, 255]),
            brightness: float_param(&config, "brightness", 1.0),
            config,
        }))
    }
}

impl Effect for SolidEffect {
    fn effect_type(&self) -> &str {
        "solid"
    }

    fn name(&self) -> &str {
        "Solid"
    }

    fn config(&self) -> &EffectConfig {
        &self.config
    }
}

// Gradient

pub struct GradientDefinition;

#[derive(Debug)]
pub struct GradientEffect {
    config: EffectConfig,
    pub start: [u8; 3],
    pub end: [u8; 3],
    pub speed: f64,
    pub mirror: bool,
}

static GRADIENT_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("color_start", ParamKind::Color, "First gradient stop"),
    ParamSpec::new("color_end", ParamKind::Color, "Last gradient stop"),
    ParamSpec::new(
        "speed",
        ParamKind::Float { min: 0.0, max: 10.0 },
        "Scroll speed",
    ),
    ParamSpec::new("mirror", ParamKind::Bool, "Mirror around the strip center"),
];

impl EffectDefinition for GradientDefinition {
    fn effect_type(&self) -> &'static str {
        "gradient"
    }

    fn display_name(&self) -> &'static str {
        "Gradient"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        GRADIENT_PARAMS
    }

    fn build(&self, config: EffectConfig) -> Result<Box<dyn Effect>, EffectError> {
        let start = color_param(&config, "color_start", [255, 0, 0]);
        let end = color_param(&config, "color_end", [0, 0, 255]);
        if start == end {
            return Err(EffectError::InvalidParameter {
                effect_type: "gradient".to_string(),
                param: "color_end".to_string(),
                reason: "gradient stops must differ".to_string(),
            });
        }

        Ok(Box::new(GradientEffect {
            start,
            end,
            speed: float_param(&config, "speed", 1.0),
            mirror: config.get("mirror").and_then(Value::as_bool).unwrap_or(false),
            config,
        }))
    }
}

impl Effect for GradientEffect {
    fn effect_type(&self) -> &str {
        "gradient"
    }

    fn name(&self) -> &str {
        "Gradient"
    }

    fn config(&self) -> &EffectConfig {
        &self.config
    }
}

// Rainbow

pub struct RainbowDefinition;

#[derive(Debug)]
pub struct RainbowEffect {
    config: EffectConfig,
    pub speed: f64,
    pub frequency: f64,
}

static RAINBOW_PARAMS: &[ParamSpec] = &[
    ParamSpec::new(
        "speed",
        ParamKind::Float { min: 0.1, max: 10.0 },
        "Hue rotation speed",
    ),
    ParamSpec::new(
        "frequency",
        ParamKind::Float { min: 0.1, max: 10.0 },
        "Number of hue cycles across the strip",
    ),
];

impl EffectDefinition for RainbowDefinition {
    fn effect_type(&self) -> &'static str {
        "rainbow"
    }

    fn display_name(&self) -> &'static str {
        "Rainbow"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        RAINBOW_PARAMS
    }

    fn build(&self, config: EffectConfig) -> Result<Box<dyn Effect>, EffectError> {
        Ok(Box::new(RainbowEffect {
            speed: float_param(&config, "speed", 1.0),
            frequency: float_param(&config, "frequency", 1.0),
            config,
        }))
    }
}

impl Effect for RainbowEffect {
    fn effect_type(&self) -> &str {
        "rainbow"
    }

    fn name(&self) -> &str {
        "Rainbow"
    }

    fn config(&self) -> &EffectConfig {
        &self.config
    }
}

// Strobe

pub struct StrobeDefinition;

#[derive(Debug)]
pub struct StrobeEffect {
    config: EffectConfig,
    pub color: [u8; 3],
    pub frequency: String,
    pub decay: i64,
}

static STROBE_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("color", ParamKind::Color, "Flash color"),
    ParamSpec::new(
        "frequency",
        ParamKind::Choice(&["1/2", "1/4", "1/8", "1/16"]),
        "Flash rate as a fraction of a beat",
    ),
    ParamSpec::new(
        "decay",
        ParamKind::Integer { min: 0, max: 100 },
        "Fade-out after each flash, in percent",
    ),
];

impl EffectDefinition for StrobeDefinition {
    fn effect_type(&self) -> &'static str {
        "strobe"
    }

    fn display_name(&self) -> &'static str {
        "Strobe"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        STROBE_PARAMS
    }

    fn build(&self, config: EffectConfig) -> Result<Box<dyn Effect>, EffectError> {
        Ok(Box::new(StrobeEffect {
            color: color_param(&config, "color", [255, 255, 255]),
            frequency: config
                .get("frequency")
                .and_then(Value::as_str)
                .unwrap_or("1/4")
                .to_string(),
            decay: config.get("decay").and_then(Value::as_i64).unwrap_or(50),
            config,
        }))
    }
}

impl Effect for StrobeEffect {
    fn effect_type(&self) -> &str {
        "strobe"
    }

    fn name(&self) -> &str {
        "Strobe"
    }

    fn config(&self) -> &EffectConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_colors() {
        assert_eq!(parse_color("red"), Some([255, 0, 0]));
        assert_eq!(parse_color("Blue"), Some([0, 0, 255]));
        assert_eq!(parse_color("chartreuse"), None);
    }

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(parse_color("#ff8000"), Some([255, 128, 0]));
        assert_eq!(parse_color("#FF8000"), Some([255, 128, 0]));
        assert_eq!(parse_color("#ff80"), None);
        assert_eq!(parse_color("#gg0000"), None);
    }

    #[test]
    fn test_solid_defaults() {
        let effect = SolidDefinition.build(EffectConfig::new()).unwrap();
        assert_eq!(effect.effect_type(), "solid");
        assert!(effect.config().is_empty());
    }

    #[test]
    fn test_gradient_rejects_identical_stops() {
        let mut config = EffectConfig::new();
        config.insert("color_start".to_string(), Value::from("red"));
        config.insert("color_end".to_string(), Value::from("#ff0000"));

        let err = GradientDefinition.build(config).unwrap_err();
        assert!(matches!(err, EffectError::InvalidParameter { ref param, .. } if param == "color_end"));
    }

    #[test]
    fn test_descriptor_uses_display_name() {
        let mut config = EffectConfig::new();
        config.insert("speed".to_string(), Value::from(2.5));

        let effect = RainbowDefinition.build(config.clone()).unwrap();
        let descriptor = effect.descriptor();
        assert_eq!(descriptor.effect_type, "rainbow");
        assert_eq!(descriptor.name, "Rainbow");
        assert_eq!(descriptor.config, config);
    }
}
