//! # Update Coordinator
//!
//! Applies field updates with optimistic concurrency:
//! - read the record version, then compare-and-swap
//! - back off with jitter on conflict, up to a retry ceiling
//! - reply exactly once to the originating connection
//! - schedule a debounced broadcast after every commit
//!
//! A connection that goes away abandons its in-flight retries.

#[allow(clippy::module_inception)]
mod coordinator;
mod outcome;
mod policy;
mod worker;

pub use coordinator::UpdateCoordinator;
pub use outcome::{FailureKind, UpdateApplied, UpdateFailed, UpdateOutcome, UpdateRequest};
pub use policy::RetryPolicy;
pub use worker::{spawn_update_worker, submit, RequestQueue};
