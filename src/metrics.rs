//! Store Metrics
//!
//! Operation counters and sweep timing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metrics collector shared by a store and its reaper
#[derive(Debug, Default)]
pub struct StoreMetrics {
    created: AtomicU64,
    reads: AtomicU64,
    read_misses: AtomicU64,
    updates: AtomicU64,
    update_misses: AtomicU64,
    deleted: AtomicU64,
    key_failures: AtomicU64,

    /// Sweep tracking
    sweeps: AtomicU64,
    evicted: AtomicU64,
    sweep_sum_us: AtomicU64,
    sweep_max_us: AtomicU64,
}

/// Point-in-time copy of [`StoreMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub created: u64,
    pub reads: u64,
    pub read_misses: u64,
    pub updates: u64,
    pub update_misses: u64,
    pub deleted: u64,
    pub key_failures: u64,
    pub sweeps: u64,
    pub evicted: u64,
}

impl StoreMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_create(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_key_failure(&self) {
        self.key_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read(&self, hit: bool) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if !hit {
            self.read_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_update(&self, hit: bool) {
        self.updates.fetch_add(1, Ordering::Relaxed);
        if !hit {
            self.update_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_delete(&self) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one sweep and how many entries it evicted
    pub(crate) fn record_sweep(&self, evicted: usize, elapsed: Duration) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
        self.evicted.fetch_add(evicted as u64, Ordering::Relaxed);

        let us = elapsed.as_micros() as u64;
        self.sweep_sum_us.fetch_add(us, Ordering::Relaxed);
        self.sweep_max_us.fetch_max(us, Ordering::Relaxed);
    }

    /// Copy all counters at once
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            created: self.created.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            read_misses: self.read_misses.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            update_misses: self.update_misses.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
            key_failures: self.key_failures.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }

    /// Get average sweep duration in microseconds
    pub fn avg_sweep_us(&self) -> f64 {
        let count = self.sweeps.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.sweep_sum_us.load(Ordering::Relaxed) as f64 / count as f64
    }

    /// Get the longest sweep in microseconds
    pub fn max_sweep_us(&self) -> u64 {
        self.sweep_max_us.load(Ordering::Relaxed)
    }

    /// Get a summary of metrics
    pub fn summary(&self) -> String {
        let s = self.snapshot();
        format!(
            "Created: {} | Reads: {} ({} missed) | Updates: {} ({} missed) | Evicted: {} in {} sweeps (µs): avg={:.1}, max={}",
            s.created,
            s.reads,
            s.read_misses,
            s.updates,
            s.update_misses,
            s.evicted,
            s.sweeps,
            self.avg_sweep_us(),
            self.max_sweep_us()
        )
    }
}
