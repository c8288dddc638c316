//! Devices and the registry that looks them up.
//!
//! Every device lives behind its own `Mutex`. Holding that mutex is the
//! per-device critical section: the preset manager keeps it from the first
//! read of the effect slot until the document has been persisted.

pub mod bindings;

pub use bindings::DeviceBindings;

use crate::effects::{Effect, EffectRegistry, EffectSlot};
use crate::models::DeviceRecord;
use indexmap::IndexMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// An output target hosting zero or one active effect.
#[derive(Debug)]
pub struct Device {
    id: String,
    name: String,
    active_effect: Option<Box<dyn Effect>>,
}

impl Device {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            active_effect: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Install `effect`, returning the effect it replaced
    pub fn install_effect(&mut self, effect: Box<dyn Effect>) -> Option<Box<dyn Effect>> {
        self.active_effect.replace(effect)
    }

    /// Empty the effect slot, returning the removed effect if there was one
    pub fn clear_effect(&mut self) -> Option<Box<dyn Effect>> {
        self.active_effect.take()
    }

    pub fn active_effect(&self) -> Option<&dyn Effect> {
        self.active_effect.as_deref()
    }

    pub fn slot(&self) -> EffectSlot {
        EffectSlot::from(self.active_effect())
    }
}

/// Shared handle to a device
pub type DeviceHandle = Arc<Mutex<Device>>;

/// Lock a device, recovering from a poisoned mutex.
///
/// A panic while holding a device lock cannot leave the slot half-written,
/// since every slot mutation is a single `Option` swap.
pub fn lock_device(handle: &DeviceHandle) -> MutexGuard<'_, Device> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lookup of devices by id
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<IndexMap<String, DeviceHandle>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build devices from persisted records, restoring each saved effect.
    ///
    /// A saved effect that no longer constructs is logged and skipped; the
    /// device starts with an empty slot and its id is returned so the caller
    /// can drop the stale binding. On duplicate ids the first record wins,
    /// matching [`DeviceBindings`].
    pub fn from_records(
        records: &[DeviceRecord],
        effects: &EffectRegistry,
    ) -> (Self, Vec<String>) {
        let registry = Self::new();
        let mut unrestored = Vec::new();

        for record in records {
            if registry.contains(&record.id) {
                tracing::warn!("Ignoring duplicate record for device {}", record.id);
                continue;
            }

            let mut device = Device::new(&record.id, record.display_name());

            if let Some(saved) = &record.effect {
                match effects.construct(&saved.effect_type, &saved.config) {
                    Ok(effect) => {
                        tracing::debug!(
                            "Restored effect {} on device {}",
                            saved.effect_type,
                            record.id
                        );
                        device.install_effect(effect);
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Could not restore effect {} on device {}: {}",
                            saved.effect_type,
                            record.id,
                            e
                        );
                        unrestored.push(record.id.clone());
                    }
                }
            }

            registry.register(device);
        }

        tracing::info!("Loaded {} devices", registry.len());
        (registry, unrestored)
    }

    /// Add a device, replacing any device with the same id
    pub fn register(&self, device: Device) -> DeviceHandle {
        let id = device.id().to_string();
        let handle = Arc::new(Mutex::new(device));
        self.devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::clone(&handle));
        handle
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(device_id)
    }

    pub fn lookup(&self, device_id: &str) -> Option<DeviceHandle> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(device_id)
            .cloned()
    }

    /// Device ids in registration order
    pub fn ids(&self) -> Vec<String> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
