use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use super::store::{LookupError, derive_id};
use crate::config::{PersistError, PersistenceGateway};
use crate::devices::{DeviceHandle, DeviceRegistry, lock_device};
use crate::effects::{EffectDescriptor, EffectError, EffectRegistry, EffectSlot};
use crate::metrics::Metrics;
use crate::models::{ConfigDocument, EffectConfig};
use crate::state::{ConfigContext, ConfigState, StateChange};

/// Errors returned by [`PresetManager`] operations.
///
/// Every variant is recoverable by the caller; none are retried internally.
#[derive(Error, Debug)]
pub enum PresetError {
    #[error("Device {0} not found")]
    DeviceNotFound(String),

    #[error("Required attribute \"{0}\" was not provided")]
    MissingField(&'static str),

    #[error("Effect {0} has no presets")]
    EffectHasNoPresets(String),

    #[error("Preset {preset_id} does not exist for effect {effect_type}")]
    PresetNotFound {
        effect_type: String,
        preset_id: String,
    },

    #[error("Device {0} has no active effect")]
    NoActiveEffect(String),

    #[error("Failed to construct effect: {0}")]
    EffectConstructionFailed(#[source] EffectError),

    /// The in-memory change already happened; only the save failed.
    #[error("Failed to persist configuration: {0}")]
    PersistFailed(#[source] PersistError),
}

impl From<LookupError> for PresetError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NoPresetsForEffect(effect_type) => {
                PresetError::EffectHasNoPresets(effect_type)
            }
            LookupError::PresetMissing {
                effect_type,
                preset_id,
            } => PresetError::PresetNotFound {
                effect_type,
                preset_id,
            },
        }
    }
}

/// Request to apply a stored preset to a device
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplyPresetRequest {
    pub effect_id: Option<String>,
    pub preset_id: Option<String>,
}

impl ApplyPresetRequest {
    pub fn new(effect_id: impl Into<String>, preset_id: impl Into<String>) -> Self {
        Self {
            effect_id: Some(effect_id.into()),
            preset_id: Some(preset_id.into()),
        }
    }
}

/// Request to save a device's active effect as a preset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CapturePresetRequest {
    pub name: Option<String>,
}

impl CapturePresetRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// A stored preset as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetDescriptor {
    pub id: String,
    pub name: String,
    pub config: EffectConfig,
}

/// A registered effect type and its parameter schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectTypeInfo {
    #[serde(rename = "type")]
    pub effect_type: String,
    pub name: String,
    pub parameters: Vec<ParameterInfo>,
}

/// One parameter of an effect type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    pub name: String,
    pub description: String,
}

/// A device and the contents of its effect slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSummary {
    pub id: String,
    pub name: String,
    pub effect: EffectSlot,
}

/// Orchestrates preset lookup, application, capture and persistence.
///
/// # Locking
///
/// Each mutating operation holds the target device's mutex for its whole
/// read-modify-persist sequence, so operations on one device never interleave.
/// The [`ConfigContext`] lock is taken after the device lock and held across
/// the persistence call.
pub struct PresetManager {
    devices: Arc<DeviceRegistry>,
    effects: Arc<EffectRegistry>,
    context: ConfigContext,
    gateway: Arc<dyn PersistenceGateway>,
    metrics: Arc<Metrics>,
}

impl PresetManager {
    pub fn new(
        devices: Arc<DeviceRegistry>,
        effects: Arc<EffectRegistry>,
        context: ConfigContext,
        gateway: Arc<dyn PersistenceGateway>,
    ) -> Self {
        Self {
            devices,
            effects,
            context,
            gateway,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Build devices and context from a loaded document.
    ///
    /// Devices come back with the effect recorded in their `effect` sub-record.
    /// A binding whose effect can no longer be built is dropped, leaving the
    /// context dirty so the next save records the empty slot.
    pub fn from_document(
        document: ConfigDocument,
        effects: Arc<EffectRegistry>,
        gateway: Arc<dyn PersistenceGateway>,
        event_buffer: usize,
    ) -> Self {
        let (devices, unrestored) = DeviceRegistry::from_records(&document.devices, &effects);
        let context = ConfigContext::with_event_buffer(document, event_buffer);

        if !unrestored.is_empty() {
            let mut state = context.lock();
            for device_id in &unrestored {
                state.bindings.clear_effect(device_id);
            }
        }

        Self::new(Arc::new(devices), effects, context, gateway)
    }

    /// Share an existing metrics instance
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn context(&self) -> &ConfigContext {
        &self.context
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    pub fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Return the device's active effect, or [`EffectSlot::Empty`]
    pub fn active_effect(&self, device_id: &str) -> Result<EffectSlot, PresetError> {
        let handle = self.lookup(device_id)?;
        let slot = lock_device(&handle).slot();
        Ok(slot)
    }

    /// Apply a stored preset to a device.
    ///
    /// Preconditions are checked in a fixed order and the first failure is
    /// returned. The new effect is fully constructed before the old one is
    /// replaced, so a construction failure leaves the device untouched.
    pub fn apply_preset(
        &self,
        device_id: &str,
        request: &ApplyPresetRequest,
    ) -> Result<EffectDescriptor, PresetError> {
        let handle = self.lookup(device_id)?;
        let effect_type = request
            .effect_id
            .as_deref()
            .ok_or_else(|| self.reject(PresetError::MissingField("effect_id")))?;

        let mut device = lock_device(&handle);

        let (preset_id, config) = {
            let state = self.context.lock();
            if !state.presets.contains_effect(effect_type) {
                return Err(self.reject(PresetError::EffectHasNoPresets(
                    effect_type.to_string(),
                )));
            }

            let preset_id = request
                .preset_id
                .as_deref()
                .ok_or_else(|| self.reject(PresetError::MissingField("preset_id")))?;

            let preset = state
                .presets
                .get(effect_type, preset_id)
                .map_err(|e| self.reject(e.into()))?;
            (preset_id, preset.config.clone())
        };

        let effect = self
            .effects
            .construct(effect_type, &config)
            .map_err(|e| {
                self.metrics.record_construction_failure();
                tracing::warn!(
                    "Preset {}/{} could not be applied to device {}: {}",
                    effect_type,
                    preset_id,
                    device_id,
                    e
                );
                PresetError::EffectConstructionFailed(e)
            })?;

        let descriptor = effect.descriptor();
        device.install_effect(effect);

        self.metrics.record_preset_applied();
        tracing::info!(
            "Applied preset {}/{} to device {}",
            effect_type,
            preset_id,
            device_id
        );
        self.context.emit(StateChange::EffectApplied {
            device_id: device_id.to_string(),
            effect_type: effect_type.to_string(),
        });

        let mut state = self.context.lock();
        bind_effect(&mut state, device_id, effect_type, config);
        self.persist(&mut state)?;

        Ok(descriptor)
    }

    /// Save the device's active effect as a preset named `request.name`.
    ///
    /// The effect type recorded is the one running on the device at the time
    /// of the call. A name that normalises to an empty id counts as missing.
    pub fn capture_preset(
        &self,
        device_id: &str,
        request: &CapturePresetRequest,
    ) -> Result<PresetDescriptor, PresetError> {
        let handle = self.lookup(device_id)?;
        let device = lock_device(&handle);

        let effect = device
            .active_effect()
            .ok_or_else(|| self.reject(PresetError::NoActiveEffect(device_id.to_string())))?;

        let name = request
            .name
            .as_deref()
            .ok_or_else(|| self.reject(PresetError::MissingField("name")))?;

        let preset_id = derive_id(name);
        if preset_id.is_empty() {
            return Err(self.reject(PresetError::MissingField("name")));
        }

        let effect_type = effect.effect_type().to_string();
        let config = effect.config().clone();

        let mut state = self.context.lock();
        state
            .presets
            .put(&effect_type, &preset_id, name, config.clone());

        self.metrics.record_preset_captured();
        tracing::info!(
            "Saved preset {}/{} from device {}",
            effect_type,
            preset_id,
            device_id
        );
        self.context.emit(StateChange::PresetSaved {
            effect_type,
            preset_id: preset_id.clone(),
        });

        self.persist(&mut state)?;

        Ok(PresetDescriptor {
            id: preset_id,
            name: name.to_string(),
            config,
        })
    }

    /// Empty the device's effect slot. Clearing an empty slot succeeds.
    pub fn clear_effect(&self, device_id: &str) -> Result<EffectSlot, PresetError> {
        let handle = self.lookup(device_id)?;
        let mut device = lock_device(&handle);

        match device.clear_effect() {
            Some(previous) => tracing::info!(
                "Cleared effect {} from device {}",
                previous.effect_type(),
                device_id
            ),
            None => tracing::debug!("Device {} had no active effect", device_id),
        }
        self.metrics.record_effect_cleared();
        self.context.emit(StateChange::EffectCleared {
            device_id: device_id.to_string(),
        });

        let mut state = self.context.lock();
        state.bindings.clear_effect(device_id);
        self.persist(&mut state)?;

        Ok(EffectSlot::Empty)
    }

    /// Presets stored for `effect_type`, empty if it has none
    pub fn list_presets(&self, effect_type: &str) -> Vec<PresetDescriptor> {
        self.context.read(|state| {
            state
                .presets
                .list(effect_type)
                .into_iter()
                .map(|(id, preset)| PresetDescriptor {
                    id: id.to_string(),
                    name: preset.name.clone(),
                    config: preset.config.clone(),
                })
                .collect()
        })
    }

    /// Registered effect types with their parameters
    pub fn effect_types(&self) -> Vec<EffectTypeInfo> {
        self.effects
            .effect_types()
            .filter_map(|effect_type| self.effects.get(effect_type))
            .map(|definition| EffectTypeInfo {
                effect_type: definition.effect_type().to_string(),
                name: definition.display_name().to_string(),
                parameters: definition
                    .parameters()
                    .iter()
                    .map(|p| ParameterInfo {
                        name: p.name.to_string(),
                        description: p.description.to_string(),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Every device with the contents of its effect slot
    pub fn device_summaries(&self) -> Vec<DeviceSummary> {
        self.devices
            .ids()
            .into_iter()
            .filter_map(|id| self.devices.lookup(&id))
            .map(|handle| {
                let device = lock_device(&handle);
                DeviceSummary {
                    id: device.id().to_string(),
                    name: device.name().to_string(),
                    effect: device.slot(),
                }
            })
            .collect()
    }

    fn lookup(&self, device_id: &str) -> Result<DeviceHandle, PresetError> {
        self.devices
            .lookup(device_id)
            .ok_or_else(|| self.reject(PresetError::DeviceNotFound(device_id.to_string())))
    }

    fn reject(&self, err: PresetError) -> PresetError {
        self.metrics.record_request_rejected();
        tracing::warn!("Rejected request: {}", err);
        err
    }

    /// Write the full document while the context lock is held
    fn persist(&self, state: &mut ConfigState) -> Result<(), PresetError> {
        match self.gateway.save(&state.to_document()) {
            Ok(()) => {
                state.mark_clean();
                self.context.emit(StateChange::DocumentSaved);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_persist_failure();
                tracing::error!("Failed to persist configuration: {}", e);
                Err(PresetError::PersistFailed(e))
            }
        }
    }
}

/// Point the device's persisted record at the new effect. Devices without a
/// record are live-only; their records belong to whoever registered them.
fn bind_effect(state: &mut ConfigState, device_id: &str, effect_type: &str, config: EffectConfig) {
    if !state.bindings.set_effect(device_id, effect_type, config) {
        tracing::debug!("Device {} has no persisted record, binding not saved", device_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockPersistenceGateway;
    use crate::devices::Device;
    use crate::models::{DeviceRecord, EffectRecord, PresetRecord};
    use serde_yaml_ng::Value;

    fn color(name: &str) -> EffectConfig {
        let mut config = EffectConfig::new();
        config.insert("color".to_string(), Value::from(name));
        config
    }

    fn document() -> ConfigDocument {
        let mut document = ConfigDocument {
            devices: vec![DeviceRecord::new("d1", "e131"), DeviceRecord::new("d2", "udp")],
            ..Default::default()
        };
        let solid = document.presets.entry("solid".to_string()).or_default();
        solid.insert(
            "red".to_string(),
            PresetRecord {
                name: "Red".to_string(),
                config: color("red"),
            },
        );
        solid.insert(
            "broken".to_string(),
            PresetRecord {
                name: "Broken".to_string(),
                config: color("not-a-color"),
            },
        );
        document
    }

    fn manager_with(gateway: MockPersistenceGateway) -> PresetManager {
        PresetManager::from_document(
            document(),
            Arc::new(EffectRegistry::with_builtin_effects()),
            Arc::new(gateway),
            16,
        )
    }

    fn saving_gateway() -> MockPersistenceGateway {
        let mut gateway = MockPersistenceGateway::new();
        gateway.expect_save().returning(|_| Ok(()));
        gateway
    }

    fn failing_gateway() -> MockPersistenceGateway {
        let mut gateway = MockPersistenceGateway::new();
        gateway.expect_save().returning(|_| {
            Err(PersistError::Io {
                path: "config.yaml".into(),
                source: std::io::Error::other("disk full"),
            })
        });
        gateway
    }

    #[test]
    fn test_apply_checks_in_order() {
        let manager = manager_with(MockPersistenceGateway::new());

        let unknown = manager.apply_preset("d9", &ApplyPresetRequest::default());
        assert!(matches!(unknown, Err(PresetError::DeviceNotFound(_))));

        let no_effect = manager.apply_preset("d1", &ApplyPresetRequest::default());
        assert!(matches!(no_effect, Err(PresetError::MissingField("effect_id"))));

        let no_namespace = manager.apply_preset(
            "d1",
            &ApplyPresetRequest {
                effect_id: Some("rainbow".to_string()),
                preset_id: None,
            },
        );
        assert!(matches!(no_namespace, Err(PresetError::EffectHasNoPresets(_))));

        let no_preset_id = manager.apply_preset(
            "d1",
            &ApplyPresetRequest {
                effect_id: Some("solid".to_string()),
                preset_id: None,
            },
        );
        assert!(matches!(no_preset_id, Err(PresetError::MissingField("preset_id"))));

        let missing = manager.apply_preset("d1", &ApplyPresetRequest::new("solid", "blue"));
        assert!(matches!(missing, Err(PresetError::PresetNotFound { .. })));

        assert_eq!(
            manager
                .metrics()
                .requests_rejected
                .load(std::sync::atomic::Ordering::Relaxed),
            5
        );
    }

    #[test]
    fn test_apply_persists_binding() {
        let mut gateway = MockPersistenceGateway::new();
        gateway
            .expect_save()
            .withf(|doc| {
                doc.device("d1")
                    .and_then(|d| d.effect.as_ref())
                    .is_some_and(|e| e.effect_type == "solid" && e.config == color("red"))
            })
            .times(1)
            .returning(|_| Ok(()));
        let manager = manager_with(gateway);

        let descriptor = manager
            .apply_preset("d1", &ApplyPresetRequest::new("solid", "red"))
            .unwrap();

        assert_eq!(descriptor.effect_type, "solid");
        assert_eq!(descriptor.config, color("red"));
        assert_eq!(
            manager.active_effect("d1").unwrap(),
            EffectSlot::Active(descriptor)
        );
        assert!(!manager.context().read(ConfigState::is_dirty));
    }

    #[test]
    fn test_construction_failure_leaves_device_untouched() {
        let mut gateway = MockPersistenceGateway::new();
        gateway.expect_save().times(1).returning(|_| Ok(()));
        let manager = manager_with(gateway);

        manager
            .apply_preset("d1", &ApplyPresetRequest::new("solid", "red"))
            .unwrap();

        let err = manager
            .apply_preset("d1", &ApplyPresetRequest::new("solid", "broken"))
            .unwrap_err();
        assert!(matches!(err, PresetError::EffectConstructionFailed(_)));

        let slot = manager.active_effect("d1").unwrap();
        assert_eq!(slot.descriptor().unwrap().config, color("red"));
        assert_eq!(
            manager
                .metrics()
                .construction_failures
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[test]
    fn test_persist_failure_keeps_live_effect() {
        let manager = manager_with(failing_gateway());

        let err = manager
            .apply_preset("d1", &ApplyPresetRequest::new("solid", "red"))
            .unwrap_err();
        assert!(matches!(err, PresetError::PersistFailed(_)));

        assert!(!manager.active_effect("d1").unwrap().is_empty());
        assert!(manager.context().read(ConfigState::is_dirty));
        assert_eq!(
            manager
                .metrics()
                .persist_failures
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[test]
    fn test_capture_requires_active_effect_then_name() {
        let manager = manager_with(saving_gateway());

        let err = manager
            .capture_preset("d1", &CapturePresetRequest::default())
            .unwrap_err();
        assert!(matches!(err, PresetError::NoActiveEffect(_)));

        manager
            .apply_preset("d1", &ApplyPresetRequest::new("solid", "red"))
            .unwrap();

        let err = manager
            .capture_preset("d1", &CapturePresetRequest::default())
            .unwrap_err();
        assert!(matches!(err, PresetError::MissingField("name")));

        let err = manager
            .capture_preset("d1", &CapturePresetRequest::new("!!!"))
            .unwrap_err();
        assert!(matches!(err, PresetError::MissingField("name")));
    }

    #[test]
    fn test_capture_uses_current_effect_type() {
        let manager = manager_with(saving_gateway());
        let handle = manager.devices().lookup("d2").unwrap();
        let rainbow = manager
            .effects()
            .construct("rainbow", &EffectConfig::new())
            .unwrap();
        lock_device(&handle).install_effect(rainbow);

        let preset = manager
            .capture_preset("d2", &CapturePresetRequest::new("Slow Rainbow"))
            .unwrap();

        assert_eq!(preset.id, "slow-rainbow");
        assert_eq!(manager.list_presets("rainbow").len(), 1);
        assert!(manager.list_presets("solid").iter().all(|p| p.id != "slow-rainbow"));
    }

    #[test]
    fn test_clear_removes_binding_and_is_idempotent() {
        let manager = manager_with(saving_gateway());
        manager
            .apply_preset("d1", &ApplyPresetRequest::new("solid", "red"))
            .unwrap();

        assert!(manager.clear_effect("d1").unwrap().is_empty());
        assert!(manager.clear_effect("d1").unwrap().is_empty());

        assert!(manager.active_effect("d1").unwrap().is_empty());
        let snapshot = manager.context().snapshot();
        assert!(snapshot.device("d1").unwrap().effect.is_none());
    }

    #[test]
    fn test_clear_unknown_device() {
        let manager = manager_with(MockPersistenceGateway::new());
        assert!(matches!(
            manager.clear_effect("d9"),
            Err(PresetError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_apply_on_unrecorded_device_adds_no_record() {
        let mut gateway = MockPersistenceGateway::new();
        gateway
            .expect_save()
            .withf(|doc| doc.device("d3").is_none() && doc.devices.len() == 2)
            .times(1)
            .returning(|_| Ok(()));
        let manager = manager_with(gateway);
        manager.devices().register(Device::new("d3", "Late Arrival"));

        manager
            .apply_preset("d3", &ApplyPresetRequest::new("solid", "red"))
            .unwrap();

        assert!(!manager.active_effect("d3").unwrap().is_empty());
        assert!(manager.context().snapshot().device("d3").is_none());
    }

    #[test]
    fn test_unrestorable_binding_is_dropped() {
        let mut document = document();
        document.devices[1].effect = Some(EffectRecord {
            effect_type: "plasma".to_string(),
            config: EffectConfig::new(),
        });

        let mut gateway = MockPersistenceGateway::new();
        gateway
            .expect_save()
            .withf(|doc| doc.device("d2").is_some_and(|d| d.effect.is_none()))
            .times(1)
            .returning(|_| Ok(()));
        let manager = PresetManager::from_document(
            document,
            Arc::new(EffectRegistry::with_builtin_effects()),
            Arc::new(gateway),
            16,
        );

        assert!(manager.active_effect("d2").unwrap().is_empty());
        assert!(manager.context().read(ConfigState::is_dirty));

        manager
            .apply_preset("d1", &ApplyPresetRequest::new("solid", "red"))
            .unwrap();
        assert!(manager.context().snapshot().device("d2").unwrap().effect.is_none());
    }

    #[test]
    fn test_listing_helpers() {
        let manager = manager_with(MockPersistenceGateway::new());

        let types = manager.effect_types();
        assert_eq!(types[0].effect_type, "solid");
        let names: Vec<_> = types[0].parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["color", "brightness"]);
        assert_eq!(types[0].parameters[0].description, "Fill color");

        let devices = manager.device_summaries();
        assert_eq!(devices.len(), 2);
        assert!(devices.iter().all(|d| d.effect.is_empty()));

        let presets = manager.list_presets("solid");
        assert_eq!(presets[0].id, "red");
        assert_eq!(presets[0].name, "Red");
    }
}
