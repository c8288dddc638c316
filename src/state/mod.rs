// Configuration context module
//
// This module provides the ConfigContext which owns the in-memory configuration
// document behind a single Mutex and emits change events for interested listeners.

use crate::devices::DeviceBindings;
use crate::models::ConfigDocument;
use crate::presets::PresetStore;
use indexmap::IndexMap;
use serde_yaml_ng::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// Change events emitted after the in-memory configuration is modified
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// A device received a new active effect
    EffectApplied {
        device_id: String,
        effect_type: String,
    },

    /// A device's effect slot was emptied
    EffectCleared { device_id: String },

    /// A preset was created or overwritten
    PresetSaved {
        effect_type: String,
        preset_id: String,
    },

    /// The document was written to durable storage
    DocumentSaved,
}

/// The in-memory configuration document, split into the parts this crate mutates.
#[derive(Debug, Default)]
pub struct ConfigState {
    pub presets: PresetStore,
    pub bindings: DeviceBindings,

    /// Top-level document keys carried through untouched
    extra: IndexMap<String, Value>,
}

impl ConfigState {
    pub fn from_document(document: ConfigDocument) -> Self {
        Self {
            presets: PresetStore::new(document.presets),
            bindings: DeviceBindings::new(document.devices),
            extra: document.extra,
        }
    }

    /// Assemble the full document for persistence
    pub fn to_document(&self) -> ConfigDocument {
        ConfigDocument {
            presets: self.presets.namespaces().clone(),
            devices: self.bindings.records().to_vec(),
            extra: self.extra.clone(),
        }
    }

    /// True if anything changed since the last successful save
    pub fn is_dirty(&self) -> bool {
        self.presets.is_dirty() || self.bindings.is_dirty()
    }

    pub fn mark_clean(&mut self) {
        self.presets.mark_clean();
        self.bindings.mark_clean();
    }
}

/// Owned, shareable configuration context
///
/// Passed explicitly to whoever needs the configuration. It:
/// - Guards [`ConfigState`] with one `Mutex`, the coarse lock of the locking discipline
/// - Emits [`StateChange`] events via a tokio broadcast channel
///
/// # Locking
///
/// Callers that also hold a device lock must take the device lock first.
/// Persistence happens while the context lock is held so the last document
/// written always matches the in-memory state.
pub struct ConfigContext {
    /// The configuration protected by a Mutex for thread-safe access
    state: Arc<Mutex<ConfigState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl ConfigContext {
    /// Create a context with a broadcast buffer of 100 events
    pub fn new(document: ConfigDocument) -> Self {
        Self::with_event_buffer(document, 100)
    }

    pub fn with_event_buffer(document: ConfigDocument, event_buffer: usize) -> Self {
        let (state_tx, _) = broadcast::channel(event_buffer.max(1));
        Self {
            state: Arc::new(Mutex::new(ConfigState::from_document(document))),
            state_tx,
        }
    }

    /// Acquire the context lock for a read-modify-persist sequence
    pub fn lock(&self) -> MutexGuard<'_, ConfigState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let count = context.read(|state| state.presets.len());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&ConfigState) -> R,
    {
        let state = self.lock();
        f(&state)
    }

    /// Clone of the current document
    pub fn snapshot(&self) -> ConfigDocument {
        self.read(ConfigState::to_document)
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver that will get notified of all future state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Emit a change event
    pub fn emit(&self, change: StateChange) {
        // Ignore send errors - it's OK if no one is listening
        let _ = self.state_tx.send(change);
    }
}

// Make ConfigContext cloneable for sharing across threads
impl Clone for ConfigContext {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
