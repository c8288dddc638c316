use crate::models::{DeviceRecord, EffectConfig, EffectRecord};
use std::collections::HashMap;

/// Persisted device records with an index from device id to position.
///
/// Records are never removed here, so positions stay valid for the lifetime
/// of the index.
#[derive(Debug, Clone, Default)]
pub struct DeviceBindings {
    records: Vec<DeviceRecord>,
    index: HashMap<String, usize>,
    dirty: bool,
}

impl DeviceBindings {
    pub fn new(records: Vec<DeviceRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            // First record wins on duplicate ids
            index.entry(record.id.clone()).or_insert(position);
        }

        Self {
            records,
            index,
            dirty: false,
        }
    }

    pub fn get(&self, device_id: &str) -> Option<&DeviceRecord> {
        self.index.get(device_id).map(|&i| &self.records[i])
    }

    fn get_mut(&mut self, device_id: &str) -> Option<&mut DeviceRecord> {
        let position = *self.index.get(device_id)?;
        self.records.get_mut(position)
    }

    /// Set the persisted effect of a device.
    ///
    /// Returns false if the device has no persisted record.
    pub fn set_effect(&mut self, device_id: &str, effect_type: &str, config: EffectConfig) -> bool {
        let Some(record) = self.get_mut(device_id) else {
            return false;
        };
        record.effect = Some(EffectRecord {
            effect_type: effect_type.to_string(),
            config,
        });
        self.dirty = true;
        true
    }

    /// Remove the persisted effect of a device.
    ///
    /// Returns true only if a binding was actually removed.
    pub fn clear_effect(&mut self, device_id: &str) -> bool {
        let removed = self
            .get_mut(device_id)
            .and_then(|record| record.effect.take())
            .is_some();
        if removed {
            self.dirty = true;
        }
        removed
    }

    pub fn records(&self) -> &[DeviceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
