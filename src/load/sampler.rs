//! Connection and update-rate sampling
//!
//! The update rate is sampled, not sliding: commits accumulate in the
//! current window and `rotate` publishes that count as the rate for the
//! window just finished.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// Load figures attached to failures and echoes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSnapshot {
    pub connections: usize,
    pub updates_per_second: u64,
}

/// Keepalive reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoReply {
    /// Milliseconds since the Unix epoch
    pub server_time: i64,
    pub connections: usize,
    pub updates_per_second: u64,
}

/// Tracks active subscribers and the committed-update rate
#[derive(Debug, Default)]
pub struct LoadSampler {
    active_connections: AtomicUsize,
    current_window: AtomicU64,
    last_rate: AtomicU64,
}

impl LoadSampler {
    /// Create a sampler with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a newly subscribed connection
    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a connection that went away
    pub fn connection_closed(&self) {
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Count one committed update in the current window
    pub fn record_update(&self) {
        self.current_window.fetch_add(1, Ordering::Relaxed);
    }

    /// Close the current window and publish its count
    pub fn rotate(&self) {
        let count = self.current_window.swap(0, Ordering::Relaxed);
        self.last_rate.store(count, Ordering::Relaxed);
    }

    /// Connections currently subscribed
    pub fn connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Commits in the last completed sampling window
    pub fn updates_per_second(&self) -> u64 {
        self.last_rate.load(Ordering::Relaxed)
    }

    /// Load figures attached to update failures
    pub fn snapshot(&self) -> LoadSnapshot {
        LoadSnapshot {
            connections: self.connections(),
            updates_per_second: self.updates_per_second(),
        }
    }

    /// Keepalive reply stamped with the current time
    pub fn echo(&self) -> EchoReply {
        EchoReply {
            server_time: Utc::now().timestamp_millis(),
            connections: self.connections(),
            updates_per_second: self.updates_per_second(),
        }
    }
}

/// Rotate `sampler` every `interval` until the task is aborted
pub fn spawn_sampler(sampler: Arc<LoadSampler>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sampler.rotate();
        }
    })
}
