//! # Load Sampling
//!
//! Active subscriber count and a once-per-interval update rate, reported back
//! to callers so they can tell isolated contention from systemic overload.

mod quality;
mod sampler;

pub use quality::{ConnectionQuality, QualityThresholds};
pub use sampler::{spawn_sampler, EchoReply, LoadSampler, LoadSnapshot};
