//! Effects: the uniform `{type, name, config}` abstraction and its registry.
//!
//! - [`Effect`]: trait implemented by every running effect instance
//! - [`EffectRegistry`]: maps effect type ids to [`EffectDefinition`]s and validates configs
//! - [`builtin`]: the effect types shipped with fxpresets
//!
//! Rendering is not modelled here. An effect is only its identity and configuration.

pub mod builtin;
pub mod registry;

pub use registry::{EffectDefinition, EffectRegistry, ParamKind, ParamSpec};

use crate::models::EffectConfig;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// A configured effect that can be installed on a device.
pub trait Effect: Send + fmt::Debug {
    /// Registry key of this effect
    fn effect_type(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Parameter configuration the effect was built from
    fn config(&self) -> &EffectConfig;

    /// Snapshot of type, name and config
    fn descriptor(&self) -> EffectDescriptor {
        EffectDescriptor {
            effect_type: self.effect_type().to_string(),
            name: self.name().to_string(),
            config: self.config().clone(),
        }
    }
}

/// Serializable snapshot of an effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDescriptor {
    #[serde(rename = "type")]
    pub effect_type: String,
    pub name: String,
    pub config: EffectConfig,
}

/// Contents of a device's effect slot.
///
/// `Empty` serializes as an empty mapping, `Active` as the descriptor itself.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectSlot {
    Empty,
    Active(EffectDescriptor),
}

impl EffectSlot {
    pub fn is_empty(&self) -> bool {
        matches!(self, EffectSlot::Empty)
    }

    pub fn descriptor(&self) -> Option<&EffectDescriptor> {
        match self {
            EffectSlot::Empty => None,
            EffectSlot::Active(descriptor) => Some(descriptor),
        }
    }
}

impl From<Option<&dyn Effect>> for EffectSlot {
    fn from(effect: Option<&dyn Effect>) -> Self {
        match effect {
            Some(effect) => EffectSlot::Active(effect.descriptor()),
            None => EffectSlot::Empty,
        }
    }
}

impl Serialize for EffectSlot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            EffectSlot::Empty => serializer.serialize_map(Some(0))?.end(),
            EffectSlot::Active(descriptor) => descriptor.serialize(serializer),
        }
    }
}

/// Errors raised while constructing an effect
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectError {
    #[error("Unknown effect type: {0}")]
    UnknownEffectType(String),

    #[error("Effect {effect_type} has no parameter named {param}")]
    UnknownParameter { effect_type: String, param: String },

    #[error("Invalid value for {effect_type}.{param}: {reason}")]
    InvalidParameter {
        effect_type: String,
        param: String,
        reason: String,
    },
}
