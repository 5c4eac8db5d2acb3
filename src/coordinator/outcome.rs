//! Update requests and their outcomes

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::load::LoadSnapshot;
use crate::record::ScoreRecord;
use crate::store::StoreError;

/// "Set `field` of `record_id` to `value`"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub record_id: Uuid,
    pub field: String,
    /// Raw value as received; converted to an integer before use
    pub value: Value,
}

impl UpdateRequest {
    /// Request to set `field` of `record_id` to the raw `value`
    pub fn new(record_id: Uuid, field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            record_id,
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Why an update was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    InvalidField,
    InvalidValue,
    ConflictExhausted,
    Unavailable,
    /// The connection's request queue was full
    Busy,
}

impl FailureKind {
    /// Failure kind for a store error that ends the retry loop
    pub fn from_store_error(err: &StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => FailureKind::NotFound,
            StoreError::InvalidField(_) => FailureKind::InvalidField,
            StoreError::InvalidValue(_) => FailureKind::InvalidValue,
            StoreError::Conflict { .. } => FailureKind::ConflictExhausted,
            StoreError::Unavailable(_) => FailureKind::Unavailable,
        }
    }
}

/// Success reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateApplied {
    pub record_id: Uuid,
    pub field: String,
    pub value: u64,
    /// Attempts including the successful one
    pub attempts: u32,
    pub record: ScoreRecord,
}

/// Failure reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFailed {
    /// The id as the client sent it, which may not be a valid UUID
    pub record_id: String,
    pub field: String,
    pub kind: FailureKind,
    pub message: String,
    /// Retries performed before giving up
    pub retry_count: u32,
    pub server_load: LoadSnapshot,
}

impl UpdateFailed {
    /// Failure reply for `request`
    pub fn new(
        request: &UpdateRequest,
        kind: FailureKind,
        message: impl Into<String>,
        retry_count: u32,
        server_load: LoadSnapshot,
    ) -> Self {
        Self {
            record_id: request.record_id.to_string(),
            field: request.field.clone(),
            kind,
            message: message.into(),
            retry_count,
            server_load,
        }
    }

    /// `not_found` reply for an update whose `record_id` is not a UUID
    pub fn unknown_record(
        record_id: impl Into<String>,
        field: impl Into<String>,
        server_load: LoadSnapshot,
    ) -> Self {
        let record_id = record_id.into();
        Self {
            message: format!("Record not found: {}", record_id),
            record_id,
            field: field.into(),
            kind: FailureKind::NotFound,
            retry_count: 0,
            server_load,
        }
    }
}

/// What became of one update request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied(UpdateApplied),
    Failed(UpdateFailed),
    /// The originating connection went away; nothing was committed for the
    /// pending attempt and no reply was sent
    Abandoned { attempts: u32 },
}

impl UpdateOutcome {
    /// True when the update committed
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied(_))
    }
}
