//! Score records
//!
//! A record's identity, name and creation time never change. Scores, total
//! and version change together, only through the store's compare-and-swap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::field::{ScoreField, Scores};

/// A scored entity as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Stable identity
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// The five score fields
    pub scores: Scores,

    /// Sum of `scores`, maintained by delta on every commit
    pub total: u64,

    /// Concurrency token, +1 per committed mutation
    pub version: u64,

    /// Creation time, used as the ranking tie-break
    pub created_at: DateTime<Utc>,
}

impl ScoreRecord {
    /// Build a fresh record at version 0
    pub fn new(name: impl Into<String>, scores: Scores, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            total: scores.sum(),
            scores,
            version: 0,
            created_at,
        }
    }

    /// Read one score field
    pub fn score(&self, field: ScoreField) -> u64 {
        self.scores.get(field)
    }

    /// Whether `total` agrees with the field sum
    pub fn is_consistent(&self) -> bool {
        self.total == self.scores.sum()
    }
}

/// Seeding input for a record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRecord {
    pub name: String,

    #[serde(default)]
    pub scores: Scores,

    /// Defaults to the insertion time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewRecord {
    /// Record named `name` with every score at zero
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Seed with `scores`
    pub fn with_scores(mut self, scores: Scores) -> Self {
        self.scores = scores;
        self
    }

    /// Override the creation time used for tie-breaks
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub(crate) fn into_record(self) -> ScoreRecord {
        let created_at = self.created_at.unwrap_or_else(Utc::now);
        ScoreRecord::new(self.name, self.scores, created_at)
    }
}
