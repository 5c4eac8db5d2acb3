//! Ranked snapshots
//!
//! Rank is never stored. It is derived for each snapshot: total descending,
//! then creation time ascending, then id so equal timestamps still order
//! deterministically.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::record::ScoreRecord;

/// A record annotated with its 1-based position in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedRecord {
    pub rank: usize,

    #[serde(flatten)]
    pub record: ScoreRecord,
}

/// The full ranked view at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Store commit sequence at read time; a higher sequence supersedes
    pub sequence: u64,

    pub records: Vec<RankedRecord>,
}

impl Snapshot {
    /// Rank `records` and wrap them with `sequence`
    pub fn ranked(sequence: u64, records: Vec<ScoreRecord>) -> Self {
        Self {
            sequence,
            records: rank(records),
        }
    }

    /// Find a record by id
    pub fn find(&self, id: &uuid::Uuid) -> Option<&RankedRecord> {
        self.records.iter().find(|r| &r.record.id == id)
    }
}

fn compare(a: &ScoreRecord, b: &ScoreRecord) -> Ordering {
    b.total
        .cmp(&a.total)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort and assign ranks
pub fn rank(mut records: Vec<ScoreRecord>) -> Vec<RankedRecord> {
    records.sort_by(compare);
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| RankedRecord { rank: i + 1, record })
        .collect()
}
