//! # Fan-out Channel
//!
//! Holds live subscribers and pushes the ranked snapshot to all of them.
//! A joining subscriber gets the current snapshot immediately rather than
//! waiting for the next broadcast.

mod channel;

pub use channel::{DeliveryReport, FanoutChannel};
