//! CLI error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;

use crate::config::ConfigError;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file missing, unparseable or invalid
    ConfigError,
    /// Seed data could not be loaded
    SeedFailed,
    /// Runtime or listener failure
    ServeFailed,
}

impl CliErrorCode {
    /// Stable code printed with the error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "SCORE_CLI_CONFIG_ERROR",
            Self::SeedFailed => "SCORE_CLI_SEED_FAILED",
            Self::ServeFailed => "SCORE_CLI_SERVE_FAILED",
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Error with an explicit code
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Configuration could not be loaded
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// Seed records could not be loaded
    pub fn seed_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::SeedFailed, msg)
    }

    /// Server could not start or stopped with an error
    pub fn serve_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ServeFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Stable code string for this error
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(format!("{} ({})", e, e.code()))
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::seed_failed(format!("{} ({})", e, e.code()))
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
