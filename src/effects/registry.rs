//! Effect registry for managing available effects
//!
//! The registry holds every registered effect definition and is the single
//! place where a configuration blob is checked against an effect's parameter
//! schema before an instance is built.

use indexmap::IndexMap;
use serde_yaml_ng::Value;
use std::sync::Arc;

use super::builtin::{parse_color, register_builtin_effects};
use super::{Effect, EffectError};
use crate::models::EffectConfig;

/// Value type accepted by an effect parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// Any number within the inclusive range
    Float { min: f64, max: f64 },
    /// Whole number within the inclusive range
    Integer { min: i64, max: i64 },
    Bool,
    /// Named color or `#rrggbb`
    Color,
    /// One of a fixed set of strings
    Choice(&'static [&'static str]),
}

/// Schema entry for a single effect parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn new(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
        }
    }

    /// Check a value against this parameter's kind.
    ///
    /// Returns a human-readable reason on mismatch.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self.kind {
            ParamKind::Float { min, max } => {
                let v = value.as_f64().ok_or("expected a number")?;
                if v < min || v > max {
                    return Err(format!("{} is outside {}..={}", v, min, max));
                }
            }
            ParamKind::Integer { min, max } => {
                let v = value.as_i64().ok_or("expected an integer")?;
                if v < min || v > max {
                    return Err(format!("{} is outside {}..={}", v, min, max));
                }
            }
            ParamKind::Bool => {
                value.as_bool().ok_or("expected true or false")?;
            }
            ParamKind::Color => {
                let s = value.as_str().ok_or("expected a color string")?;
                if parse_color(s).is_none() {
                    return Err(format!("unrecognised color {:?}", s));
                }
            }
            ParamKind::Choice(options) => {
                let s = value.as_str().ok_or("expected a string")?;
                if !options.contains(&s) {
                    return Err(format!("{:?} is not one of {:?}", s, options));
                }
            }
        }
        Ok(())
    }
}

/// Factory for one effect type.
///
/// Implementations may assume [`build`](Self::build) only receives configs whose
/// keys and value types already passed the schema in [`parameters`](Self::parameters).
pub trait EffectDefinition: Send + Sync {
    /// Unique type identifier, e.g. `"solid"`
    fn effect_type(&self) -> &'static str;

    /// Name shown to users
    fn display_name(&self) -> &'static str;

    /// Parameter schema
    fn parameters(&self) -> &'static [ParamSpec];

    /// Build an instance from a validated config
    fn build(&self, config: EffectConfig) -> Result<Box<dyn Effect>, EffectError>;
}

/// Registry of available effects
pub struct EffectRegistry {
    /// Effect definitions by type identifier, in registration order
    effects: IndexMap<String, Arc<dyn EffectDefinition>>,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            effects: IndexMap::new(),
        }
    }

    /// Create a registry holding the built-in effects
    pub fn with_builtin_effects() -> Self {
        let mut registry = Self::new();
        register_builtin_effects(&mut registry);
        registry
    }

    /// Register an effect definition, replacing any previous one of the same type
    pub fn register(&mut self, definition: impl EffectDefinition + 'static) {
        let effect_type = definition.effect_type().to_string();
        tracing::debug!("Registering effect type {}", effect_type);
        self.effects.insert(effect_type, Arc::new(definition));
    }

    /// Get an effect definition by type
    pub fn get(&self, effect_type: &str) -> Option<Arc<dyn EffectDefinition>> {
        self.effects.get(effect_type).cloned()
    }

    pub fn contains(&self, effect_type: &str) -> bool {
        self.effects.contains_key(effect_type)
    }

    /// Registered effect types in registration order
    pub fn effect_types(&self) -> impl Iterator<Item = &str> {
        self.effects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Construct a new effect of `effect_type` from `config`.
    ///
    /// The config is validated first. Nothing is built on failure.
    pub fn construct(
        &self,
        effect_type: &str,
        config: &EffectConfig,
    ) -> Result<Box<dyn Effect>, EffectError> {
        let definition = self
            .get(effect_type)
            .ok_or_else(|| EffectError::UnknownEffectType(effect_type.to_string()))?;
        Self::check_config(definition.as_ref(), config)?;
        definition.build(config.clone())
    }

    fn check_config(
        definition: &dyn EffectDefinition,
        config: &EffectConfig,
    ) -> Result<(), EffectError> {
        let params = definition.parameters();
        for (key, value) in config {
            let spec = params.iter().find(|p| p.name == key.as_str()).ok_or_else(|| {
                EffectError::UnknownParameter {
                    effect_type: definition.effect_type().to_string(),
                    param: key.clone(),
                }
            })?;
            spec.check(value)
                .map_err(|reason| EffectError::InvalidParameter {
                    effect_type: definition.effect_type().to_string(),
                    param: key.clone(),
                    reason,
                })?;
        }
        Ok(())
    }
}
