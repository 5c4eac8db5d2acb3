//! Connection quality classification
//!
//! Callers derive round-trip latency from an echo and combine it with the
//! reported update rate. Thresholds belong to the caller.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Coarse connection quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionQuality {
    Good,
    Moderate,
    Poor,
}

/// Latency and load limits for each quality band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// Latency above this is at best moderate
    pub moderate_latency_ms: u64,
    /// Latency above this is poor
    pub poor_latency_ms: u64,
    /// Update rate above this is at best moderate
    pub moderate_updates_per_second: u64,
    /// Update rate above this is poor
    pub poor_updates_per_second: u64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            moderate_latency_ms: 150,
            poor_latency_ms: 500,
            moderate_updates_per_second: 50,
            poor_updates_per_second: 200,
        }
    }
}

impl ConnectionQuality {
    /// Classify by the worse of the latency band and the load band
    pub fn classify(
        latency: Duration,
        updates_per_second: u64,
        thresholds: &QualityThresholds,
    ) -> Self {
        let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);

        if latency_ms > thresholds.poor_latency_ms
            || updates_per_second > thresholds.poor_updates_per_second
        {
            ConnectionQuality::Poor
        } else if latency_ms > thresholds.moderate_latency_ms
            || updates_per_second > thresholds.moderate_updates_per_second
        {
            ConnectionQuality::Moderate
        } else {
            ConnectionQuality::Good
        }
    }
}
