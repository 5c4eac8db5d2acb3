//! Server configuration
//!
//! Loaded from a JSON file. Every field has a default, so `{}` is a valid
//! configuration. Values are validated once at load time; nothing downstream
//! re-checks them.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coordinator::RetryPolicy;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "SCORE_CONFIG_UNREADABLE",
            ConfigError::Parse(_) => "SCORE_CONFIG_PARSE",
            ConfigError::Invalid(_) => "SCORE_CONFIG_INVALID",
        }
    }

    fn invalid(msg: impl Into<String>) -> Self {
        ConfigError::Invalid(msg.into())
    }
}

/// Retry settings for conflicting updates, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_delay_ms() -> u64 {
    50
}
fn default_max_delay_ms() -> u64 {
    1000
}
fn default_jitter_ms() -> u64 {
    50
}
fn default_max_retries() -> u32 {
    5
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_ms: default_jitter_ms(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreboardConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Quiet period after the last commit before a snapshot goes out
    #[serde(default = "default_broadcast_delay_ms")]
    pub broadcast_delay_ms: u64,

    /// Width of the updates-per-second window
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    #[serde(default)]
    pub retry: RetryConfig,

    /// Updates a single connection may have queued at once
    #[serde(default = "default_request_queue_capacity")]
    pub request_queue_capacity: usize,

    /// Outgoing frames buffered per connection
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,

    /// Records loaded into the store at startup
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}
fn default_broadcast_delay_ms() -> u64 {
    100
}
fn default_sample_interval_ms() -> u64 {
    1000
}
fn default_request_queue_capacity() -> usize {
    16
}
fn default_outbox_capacity() -> usize {
    64
}

impl Default for ScoreboardConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            broadcast_delay_ms: default_broadcast_delay_ms(),
            sample_interval_ms: default_sample_interval_ms(),
            retry: RetryConfig::default(),
            request_queue_capacity: default_request_queue_capacity(),
            outbox_capacity: default_outbox_capacity(),
            seed_file: None,
        }
    }
}

impl ScoreboardConfig {
    /// Load and validate configuration from `path`
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: ScoreboardConfig = serde_json::from_str(&content)?;

        // A relative seed path is relative to the config file
        if let Some(seed) = config.seed_file.as_mut() {
            if seed.is_relative() {
                if let Some(dir) = path.parent() {
                    *seed = dir.join(&*seed);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::invalid("host must not be empty"));
        }
        if self.broadcast_delay_ms == 0 {
            return Err(ConfigError::invalid("broadcast_delay_ms must be > 0"));
        }
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::invalid("sample_interval_ms must be > 0"));
        }
        if self.request_queue_capacity == 0 {
            return Err(ConfigError::invalid("request_queue_capacity must be > 0"));
        }
        if self.outbox_capacity == 0 {
            return Err(ConfigError::invalid("outbox_capacity must be > 0"));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::invalid(format!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }
        Ok(())
    }

    /// Retry policy built from the `retry` section
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            jitter: Duration::from_millis(self.retry.jitter_ms),
            max_retries: self.retry.max_retries,
        }
    }

    /// Quiet period before a snapshot broadcast
    pub fn broadcast_delay(&self) -> Duration {
        Duration::from_millis(self.broadcast_delay_ms)
    }

    /// Length of one load sampling window
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// `host:port` to bind
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let file = write_config("{}");
        let config = ScoreboardConfig::load(file.path()).unwrap();
        assert_eq!(config, ScoreboardConfig::default());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_partial_retry_section() {
        let file = write_config(r#"{"port": 9000, "retry": {"max_retries": 2}}"#);
        let config = ScoreboardConfig::load(file.path()).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.base_delay_ms, 50);
        assert_eq!(config.socket_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_zero_delay_rejected() {
        let file = write_config(r#"{"broadcast_delay_ms": 0}"#);
        let err = ScoreboardConfig::load(file.path()).unwrap_err();
        assert_eq!(err.code(), "SCORE_CONFIG_INVALID");
    }

    #[test]
    fn test_inverted_backoff_rejected() {
        let config = ScoreboardConfig {
            retry: RetryConfig {
                base_delay_ms: 500,
                max_delay_ms: 100,
                ..RetryConfig::default()
            },
            ..ScoreboardConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_json() {
        let file = write_config("{ not json");
        let err = ScoreboardConfig::load(file.path()).unwrap_err();
        assert_eq!(err.code(), "SCORE_CONFIG_PARSE");
    }

    #[test]
    fn test_missing_file() {
        let err = ScoreboardConfig::load(Path::new("/nonexistent/scoreboard.json")).unwrap_err();
        assert_eq!(err.code(), "SCORE_CONFIG_UNREADABLE");
    }

    #[test]
    fn test_relative_seed_resolved_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scoreboard.json");
        fs::write(&path, r#"{"seed_file": "teams.json"}"#).unwrap();

        let config = ScoreboardConfig::load(&path).unwrap();
        assert_eq!(config.seed_file, Some(dir.path().join("teams.json")));
    }
}
