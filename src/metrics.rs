// Performance metrics module
//
// Provides lightweight counters for preset manager activity

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Preset manager metrics
///
/// Uses atomic operations for thread-safe metric tracking without locks.
/// Counters are bumped by [`crate::presets::PresetManager`] and can be
/// logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Presets successfully applied to a device
    pub presets_applied: AtomicU64,

    /// Presets captured from an active effect
    pub presets_captured: AtomicU64,

    /// Effect slots cleared
    pub effects_cleared: AtomicU64,

    /// Requests rejected by validation (unknown device, missing field, unknown preset)
    pub requests_rejected: AtomicU64,

    /// Effect constructions refused by the registry
    pub construction_failures: AtomicU64,

    /// Document saves that failed after an in-memory change
    pub persist_failures: AtomicU64,

    /// Metrics start time
    start_time: Instant,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            presets_applied: AtomicU64::new(0),
            presets_captured: AtomicU64::new(0),
            effects_cleared: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            construction_failures: AtomicU64::new(0),
            persist_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_preset_applied(&self) {
        self.presets_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_preset_captured(&self) {
        self.presets_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_effect_cleared(&self) {
        self.effects_cleared.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_construction_failure(&self) {
        self.construction_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persist_failure(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Total mutating operations that completed, including ones whose save failed
    pub fn operations_completed(&self) -> u64 {
        self.presets_applied.load(Ordering::Relaxed)
            + self.presets_captured.load(Ordering::Relaxed)
            + self.effects_cleared.load(Ordering::Relaxed)
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Preset Metrics Summary ===");
        tracing::info!(
            "Uptime: {:.2}s, operations completed: {}",
            self.uptime().as_secs_f64(),
            self.operations_completed()
        );
        tracing::info!(
            "Presets: {} applied, {} captured; effects cleared: {}",
            self.presets_applied.load(Ordering::Relaxed),
            self.presets_captured.load(Ordering::Relaxed),
            self.effects_cleared.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Failures: {} rejected, {} construction, {} persist",
            self.requests_rejected.load(Ordering::Relaxed),
            self.construction_failures.load(Ordering::Relaxed),
            self.persist_failures.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
