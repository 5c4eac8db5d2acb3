//! Scoreboard counters
//!
//! Counters only, monotonic, reset on process start. Relaxed atomics: a
//! reader may see one counter a step ahead of another.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Commits made by the coordinator
    updates_applied: AtomicU64,
    /// Requests answered with a failure, exhausted conflicts included
    updates_rejected: AtomicU64,
    /// Version conflicts seen, one per failed CAS
    conflicts: AtomicU64,
    /// Requests that ran out of retries
    retries_exhausted: AtomicU64,
    /// Requests dropped because their connection went away
    updates_abandoned: AtomicU64,
    broadcasts_fired: AtomicU64,
    broadcast_failures: AtomicU64,
    /// Per-subscriber sends that hit a full or closed outbox
    deliveries_failed: AtomicU64,
}

impl MetricsRegistry {
    /// Registry with every counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_updates_applied(&self) {
        self.updates_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_updates_rejected(&self) {
        self.updates_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_conflicts(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retries_exhausted(&self) {
        self.retries_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_updates_abandoned(&self) {
        self.updates_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_broadcasts_fired(&self) {
        self.broadcasts_fired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_broadcast_failures(&self) {
        self.broadcast_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deliveries_failed(&self) {
        self.deliveries_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            updates_applied: self.updates_applied.load(Ordering::Relaxed),
            updates_rejected: self.updates_rejected.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            retries_exhausted: self.retries_exhausted.load(Ordering::Relaxed),
            updates_abandoned: self.updates_abandoned.load(Ordering::Relaxed),
            broadcasts_fired: self.broadcasts_fired.load(Ordering::Relaxed),
            broadcast_failures: self.broadcast_failures.load(Ordering::Relaxed),
            deliveries_failed: self.deliveries_failed.load(Ordering::Relaxed),
        }
    }

    /// Counters as a JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub updates_applied: u64,
    pub updates_rejected: u64,
    pub conflicts: u64,
    pub retries_exhausted: u64,
    pub updates_abandoned: u64,
    pub broadcasts_fired: u64,
    pub broadcast_failures: u64,
    pub deliveries_failed: u64,
}
