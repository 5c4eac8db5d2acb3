//! # Broadcast Scheduling
//!
//! Coalesces bursts of commits into a single snapshot broadcast fired once
//! the burst has been quiet for the configured delay.

mod debouncer;

pub use debouncer::BroadcastDebouncer;
