//! # Store Errors
//!
//! Error types for the versioned record store.

use thiserror::Error;
use uuid::Uuid;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    // ==================
    // Client Input Errors
    // ==================
    /// Unknown record id
    #[error("Record not found: {0}")]
    NotFound(Uuid),

    /// Field name outside the fixed score set
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Non-numeric or negative score
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    // ==================
    // Concurrency Errors
    // ==================
    /// Version check failed; state unchanged
    #[error("Version conflict (expected {expected}, found {actual})")]
    Conflict { expected: u64, actual: u64 },

    // ==================
    // Persistence Errors
    // ==================
    /// Backing store could not serve the request
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "SCORE_NOT_FOUND",
            StoreError::InvalidField(_) => "SCORE_INVALID_FIELD",
            StoreError::InvalidValue(_) => "SCORE_INVALID_VALUE",
            StoreError::Conflict { .. } => "SCORE_VERSION_CONFLICT",
            StoreError::Unavailable(_) => "SCORE_STORE_UNAVAILABLE",
        }
    }

    /// Only version conflicts are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    pub(crate) fn poisoned() -> Self {
        StoreError::Unavailable("Lock poisoned".into())
    }
}
