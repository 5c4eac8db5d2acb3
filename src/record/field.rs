//! Score field names and values
//!
//! The field set is closed: exactly five named scores exist on every record.
//! Anything else is rejected before a store mutation is attempted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::StoreError;

/// One of the five score fields carried by every record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreField {
    Innovation,
    Design,
    Technical,
    Presentation,
    Impact,
}

impl ScoreField {
    /// All fields, in storage order
    pub const ALL: [ScoreField; 5] = [
        ScoreField::Innovation,
        ScoreField::Design,
        ScoreField::Technical,
        ScoreField::Presentation,
        ScoreField::Impact,
    ];

    /// Wire name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreField::Innovation => "innovation",
            ScoreField::Design => "design",
            ScoreField::Technical => "technical",
            ScoreField::Presentation => "presentation",
            ScoreField::Impact => "impact",
        }
    }

    fn index(&self) -> usize {
        match self {
            ScoreField::Innovation => 0,
            ScoreField::Design => 1,
            ScoreField::Technical => 2,
            ScoreField::Presentation => 3,
            ScoreField::Impact => 4,
        }
    }
}

impl fmt::Display for ScoreField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScoreField {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScoreField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| StoreError::InvalidField(s.to_string()))
    }
}

/// The five score values of a record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    #[serde(default)]
    pub innovation: u64,
    #[serde(default)]
    pub design: u64,
    #[serde(default)]
    pub technical: u64,
    #[serde(default)]
    pub presentation: u64,
    #[serde(default)]
    pub impact: u64,
}

impl Scores {
    /// Read a single field
    pub fn get(&self, field: ScoreField) -> u64 {
        self.as_array()[field.index()]
    }

    /// Overwrite a single field, returning the previous value
    pub fn set(&mut self, field: ScoreField, value: u64) -> u64 {
        let slot = match field {
            ScoreField::Innovation => &mut self.innovation,
            ScoreField::Design => &mut self.design,
            ScoreField::Technical => &mut self.technical,
            ScoreField::Presentation => &mut self.presentation,
            ScoreField::Impact => &mut self.impact,
        };
        std::mem::replace(slot, value)
    }

    /// Sum of all five fields
    pub fn sum(&self) -> u64 {
        self.as_array().iter().sum()
    }

    fn as_array(&self) -> [u64; 5] {
        [
            self.innovation,
            self.design,
            self.technical,
            self.presentation,
            self.impact,
        ]
    }
}

/// Convert a raw wire value into an integer score.
///
/// Accepts JSON integers and strings of an optionally signed integer. Sign
/// is preserved so the store can reject negatives with its own error.
pub fn parse_score_value(value: &Value) -> Result<i64, StoreError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| StoreError::InvalidValue(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_known_fields() {
        for field in ScoreField::ALL {
            assert_eq!(field.as_str().parse::<ScoreField>().unwrap(), field);
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = "foo".parse::<ScoreField>().unwrap_err();
        assert!(matches!(err, StoreError::InvalidField(ref f) if f == "foo"));
    }

    #[test]
    fn test_set_returns_previous() {
        let mut scores = Scores::default();
        assert_eq!(scores.set(ScoreField::Design, 7), 0);
        assert_eq!(scores.set(ScoreField::Design, 3), 7);
        assert_eq!(scores.get(ScoreField::Design), 3);
        assert_eq!(scores.sum(), 3);
    }

    #[test]
    fn test_parse_score_value() {
        assert_eq!(parse_score_value(&json!(12)).unwrap(), 12);
        assert_eq!(parse_score_value(&json!("42")).unwrap(), 42);
        assert_eq!(parse_score_value(&json!(-3)).unwrap(), -3);
        assert!(parse_score_value(&json!(1.5)).is_err());
        assert!(parse_score_value(&json!("ten")).is_err());
        assert!(parse_score_value(&json!(null)).is_err());
    }
}
