//! # Versioned Record Store
//!
//! Persists score records and exposes a single atomic write primitive: a
//! compare-and-swap on one field of one record, guarded by the record's
//! version.
//!
//! ## Guarantees
//!
//! - `total` equals the field sum in every state a reader can observe
//! - `version` grows by exactly 1 per committed mutation
//! - A failed version check leaves the record untouched
//! - Records are never deleted

mod errors;
mod memory;

use uuid::Uuid;

use crate::record::{NewRecord, ScoreRecord, Snapshot};

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryRecordStore;

/// Backing store for score records
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Read the current committed state of a record
    fn get(&self, id: &Uuid) -> StoreResult<ScoreRecord>;

    /// Set `field` to `new_value` if the record is still at `expected_version`.
    ///
    /// Field and value are validated before any mutation is attempted.
    fn update(
        &self,
        id: &Uuid,
        field: &str,
        new_value: i64,
        expected_version: u64,
    ) -> StoreResult<ScoreRecord>;

    /// Ranked view of all records.
    ///
    /// `sequence` is never lower than the number of commits the records
    /// reflect; it may count a commit that landed while the copy was taken.
    fn snapshot(&self) -> StoreResult<Snapshot>;

    /// Seed a new record at version 0
    fn insert(&self, record: NewRecord) -> StoreResult<ScoreRecord>;
}
