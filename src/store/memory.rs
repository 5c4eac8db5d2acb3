//! In-memory versioned record store
//!
//! Each record sits behind its own mutex; the id map is only write-locked to
//! insert. A compare-and-swap therefore holds exactly one record lock, and
//! readers cloning a record take the same lock, so no reader observes a
//! half-applied update.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use uuid::Uuid;

use super::errors::{StoreError, StoreResult};
use super::RecordStore;
use crate::record::{NewRecord, ScoreField, ScoreRecord, Snapshot};

/// Record store held entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    /// Records by id
    records: RwLock<HashMap<Uuid, Arc<Mutex<ScoreRecord>>>>,

    /// Store-wide commit counter
    sequence: AtomicU64,
}

impl MemoryRecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `seed`
    pub fn with_records(seed: Vec<NewRecord>) -> StoreResult<Self> {
        let store = Self::new();
        for record in seed {
            store.insert(record)?;
        }
        Ok(store)
    }

    /// Create a store from a JSON seed file (an array of new records)
    pub fn from_seed_file(path: &Path) -> StoreResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StoreError::Unavailable(format!("Failed to read seed file {}: {}", path.display(), e))
        })?;

        let seed: Vec<NewRecord> = serde_json::from_str(&content)
            .map_err(|e| StoreError::Unavailable(format!("Invalid seed file: {}", e)))?;

        Self::with_records(seed)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, id: &Uuid) -> StoreResult<Arc<Mutex<ScoreRecord>>> {
        let records = self.records.read().map_err(|_| StoreError::poisoned())?;
        records.get(id).cloned().ok_or(StoreError::NotFound(*id))
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, id: &Uuid) -> StoreResult<ScoreRecord> {
        let slot = self.slot(id)?;
        let record = slot.lock().map_err(|_| StoreError::poisoned())?;
        Ok(record.clone())
    }

    fn update(
        &self,
        id: &Uuid,
        field: &str,
        new_value: i64,
        expected_version: u64,
    ) -> StoreResult<ScoreRecord> {
        let field: ScoreField = field.parse()?;
        let new_value = u64::try_from(new_value)
            .map_err(|_| StoreError::InvalidValue(new_value.to_string()))?;

        let slot = self.slot(id)?;
        let mut record = slot.lock().map_err(|_| StoreError::poisoned())?;

        if record.version != expected_version {
            return Err(StoreError::Conflict {
                expected: expected_version,
                actual: record.version,
            });
        }

        // Delta from the same locked state used for the version check
        let old_value = record.score(field);
        let total = (record.total - old_value)
            .checked_add(new_value)
            .ok_or_else(|| StoreError::InvalidValue(new_value.to_string()))?;

        record.scores.set(field, new_value);
        record.total = total;
        record.version += 1;
        self.sequence.fetch_add(1, Ordering::SeqCst);

        Ok(record.clone())
    }

    fn snapshot(&self) -> StoreResult<Snapshot> {
        let records = self.records.read().map_err(|_| StoreError::poisoned())?;

        let mut copies = Vec::with_capacity(records.len());
        for slot in records.values() {
            let record = slot.lock().map_err(|_| StoreError::poisoned())?;
            copies.push(record.clone());
        }

        // Commits bump the sequence under the record lock, so loading it after
        // the copies counts every commit they contain.
        let sequence = self.sequence.load(Ordering::SeqCst);

        Ok(Snapshot::ranked(sequence, copies))
    }

    fn insert(&self, new_record: NewRecord) -> StoreResult<ScoreRecord> {
        let record = new_record.into_record();
        let mut records = self.records.write().map_err(|_| StoreError::poisoned())?;
        records.insert(record.id, Arc::new(Mutex::new(record.clone())));
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Scores;
    use std::io::Write;

    fn store_with_one() -> (MemoryRecordStore, Uuid) {
        let store = MemoryRecordStore::new();
        let record = store
            .insert(NewRecord::named("alpha").with_scores(Scores {
                design: 4,
                impact: 6,
                ..Default::default()
            }))
            .unwrap();
        (store, record.id)
    }

    #[test]
    fn test_insert_starts_at_version_zero() {
        let (store, id) = store_with_one();
        let record = store.get(&id).unwrap();
        assert_eq!(record.version, 0);
        assert_eq!(record.total, 10);
        assert!(record.is_consistent());
    }

    #[test]
    fn test_update_applies_delta() {
        let (store, id) = store_with_one();

        let updated = store.update(&id, "design", 1, 0).unwrap();
        assert_eq!(updated.scores.design, 1);
        assert_eq!(updated.total, 7);
        assert_eq!(updated.version, 1);
        assert!(updated.is_consistent());

        let updated = store.update(&id, "technical", 9, 1).unwrap();
        assert_eq!(updated.total, 16);
        assert_eq!(updated.version, 2);
    }

    #[test]
    fn test_stale_version_conflicts_without_change() {
        let (store, id) = store_with_one();
        store.update(&id, "design", 5, 0).unwrap();

        let err = store.update(&id, "design", 50, 0).unwrap_err();
        assert_eq!(err, StoreError::Conflict { expected: 0, actual: 1 });

        let record = store.get(&id).unwrap();
        assert_eq!(record.scores.design, 5);
        assert_eq!(record.version, 1);
    }

    #[test]
    fn test_invalid_field_leaves_version() {
        let (store, id) = store_with_one();
        let err = store.update(&id, "foo", 1, 0).unwrap_err();
        assert!(matches!(err, StoreError::InvalidField(_)));
        assert_eq!(store.get(&id).unwrap().version, 0);
    }

    #[test]
    fn test_negative_value_rejected() {
        let (store, id) = store_with_one();
        let err = store.update(&id, "impact", -1, 0).unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue(_)));
        assert_eq!(store.get(&id).unwrap().version, 0);
    }

    #[test]
    fn test_unknown_record() {
        let store = MemoryRecordStore::new();
        let id = Uuid::new_v4();
        assert_eq!(store.get(&id).unwrap_err(), StoreError::NotFound(id));
        assert_eq!(
            store.update(&id, "impact", 1, 0).unwrap_err(),
            StoreError::NotFound(id)
        );
    }

    #[test]
    fn test_snapshot_sequence_tracks_commits() {
        let (store, id) = store_with_one();
        assert_eq!(store.snapshot().unwrap().sequence, 0);

        store.update(&id, "impact", 1, 0).unwrap();
        store.update(&id, "impact", 2, 1).unwrap();
        let _ = store.update(&id, "impact", 3, 0);

        assert_eq!(store.snapshot().unwrap().sequence, 2);
    }

    #[test]
    fn test_from_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "red", "scores": {{"technical": 3}}}}, {{"name": "blue"}}]"#
        )
        .unwrap();

        let store = MemoryRecordStore::from_seed_file(file.path()).unwrap();
        assert_eq!(store.len(), 2);

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.records[0].record.name, "red");
        assert_eq!(snapshot.records[0].record.total, 3);
    }

    #[test]
    fn test_missing_seed_file() {
        let err = MemoryRecordStore::from_seed_file(Path::new("/nonexistent/seed.json"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
