//! # Score Records
//!
//! Data model shared by the store, coordinator and fan-out:
//!
//! - `ScoreField` / `Scores` - the closed set of five score fields
//! - `ScoreRecord` - a versioned scored entity
//! - `Snapshot` / `RankedRecord` - the ranked view delivered to viewers

mod field;
mod ranking;
#[allow(clippy::module_inception)]
mod record;

pub use field::{parse_score_value, ScoreField, Scores};
pub use ranking::{rank, RankedRecord, Snapshot};
pub use record::{NewRecord, ScoreRecord};
