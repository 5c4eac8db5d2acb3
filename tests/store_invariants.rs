//! Record Store Invariant Tests
//!
//! - `total` equals the field sum after every commit
//! - `version` grows by exactly 1 per commit
//! - a failed version check leaves the record untouched
//! - invalid input is rejected before any mutation
//! - concurrent readers never observe a half-applied commit

use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use scoreboard::record::{NewRecord, ScoreField, Scores};
use scoreboard::store::{MemoryRecordStore, RecordStore, StoreError};

fn seeded_store() -> (MemoryRecordStore, uuid::Uuid) {
    let store = MemoryRecordStore::new();
    let record = store
        .insert(NewRecord::named("alpha").with_scores(Scores {
            innovation: 4,
            design: 6,
            ..Scores::default()
        }))
        .unwrap();
    (store, record.id)
}

// =============================================================================
// Total and Version Tests
// =============================================================================

/// Seeded totals are computed from the seeded scores.
#[test]
fn test_seed_total_is_field_sum() {
    let (store, id) = seeded_store();
    let record = store.get(&id).unwrap();
    assert_eq!(record.total, 10);
    assert_eq!(record.version, 0);
}

/// Random overwrites keep total consistent and bump version by one each.
#[test]
fn test_total_tracks_random_updates() {
    let (store, id) = seeded_store();
    let mut rng = rand::thread_rng();

    for expected_version in 0..200u64 {
        let field = ScoreField::ALL[rng.gen_range(0..ScoreField::ALL.len())];
        let value: i64 = rng.gen_range(0..1_000);

        let committed = store
            .update(&id, field.as_str(), value, expected_version)
            .unwrap();
        assert_eq!(committed.version, expected_version + 1);
        assert_eq!(committed.score(field), value as u64);
        assert_eq!(committed.total, committed.scores.sum());
        assert!(committed.is_consistent());
    }
}

/// Every commit advances the snapshot sequence.
#[test]
fn test_snapshot_sequence_advances() {
    let (store, id) = seeded_store();
    let before = store.snapshot().unwrap().sequence;

    store.update(&id, "impact", 1, 0).unwrap();
    store.update(&id, "impact", 2, 1).unwrap();

    assert_eq!(store.snapshot().unwrap().sequence, before + 2);
}

// =============================================================================
// Rejection Tests
// =============================================================================

/// A stale version is rejected and nothing changes.
#[test]
fn test_stale_version_leaves_record_untouched() {
    let (store, id) = seeded_store();
    store.update(&id, "design", 9, 0).unwrap();
    let before = store.get(&id).unwrap();

    let err = store.update(&id, "design", 1, 0).unwrap_err();
    assert_eq!(err, StoreError::Conflict { expected: 0, actual: 1 });
    assert!(err.is_retryable());
    assert_eq!(store.get(&id).unwrap(), before);
}

/// Unknown fields are rejected even with a stale version.
#[test]
fn test_invalid_field_checked_first() {
    let (store, id) = seeded_store();
    store.update(&id, "design", 9, 0).unwrap();

    let err = store.update(&id, "foo", 1, 0).unwrap_err();
    assert_eq!(err, StoreError::InvalidField("foo".to_string()));
    assert!(!err.is_retryable());
    assert_eq!(store.get(&id).unwrap().version, 1);
}

/// Negative values are rejected.
#[test]
fn test_negative_value_rejected() {
    let (store, id) = seeded_store();
    let err = store.update(&id, "technical", -3, 0).unwrap_err();
    assert_eq!(err.code(), "SCORE_INVALID_VALUE");
    assert_eq!(store.get(&id).unwrap().version, 0);
}

/// Records are never removed by updates.
#[test]
fn test_record_count_stable() {
    let store = MemoryRecordStore::with_records(vec![
        NewRecord::named("alpha"),
        NewRecord::named("beta"),
        NewRecord::named("gamma"),
    ])
    .unwrap();
    let ids: Vec<_> = store
        .snapshot()
        .unwrap()
        .records
        .iter()
        .map(|r| r.record.id)
        .collect();

    for id in &ids {
        store.update(id, "presentation", 5, 0).unwrap();
        let _ = store.update(id, "presentation", 5, 0);
    }

    assert_eq!(store.len(), 3);
}

// =============================================================================
// Concurrent Reader Tests
// =============================================================================

/// Readers racing writers only ever see consistent records, and a snapshot's
/// sequence covers every commit it reflects.
#[test]
fn test_readers_never_see_partial_commits() {
    let store = MemoryRecordStore::with_records(vec![
        NewRecord::named("alpha"),
        NewRecord::named("beta"),
    ])
    .unwrap();
    let ids: Vec<_> = store
        .snapshot()
        .unwrap()
        .records
        .iter()
        .map(|r| r.record.id)
        .collect();
    let done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        let writers: Vec<_> = (0..4)
            .map(|writer| {
                let store = &store;
                let ids = &ids;
                scope.spawn(move || {
                    let mut rng = rand::thread_rng();
                    let mut commits = 0;
                    while commits < 300 {
                        let id = ids[(writer + commits) % ids.len()];
                        let field = ScoreField::ALL[rng.gen_range(0..ScoreField::ALL.len())];
                        let current = store.get(&id).unwrap();
                        let value: i64 = rng.gen_range(0..100);
                        match store.update(&id, field.as_str(), value, current.version) {
                            Ok(_) => commits += 1,
                            Err(StoreError::Conflict { .. }) => {}
                            Err(e) => panic!("Unexpected error: {}", e),
                        }
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..3)
            .map(|_| {
                let store = &store;
                let ids = &ids;
                let done = &done;
                scope.spawn(move || {
                    let mut observed = 0u64;
                    loop {
                        let finished = done.load(Ordering::SeqCst);
                        for id in ids {
                            assert!(store.get(id).unwrap().is_consistent());
                        }
                        let snapshot = store.snapshot().unwrap();
                        let versions: u64 =
                            snapshot.records.iter().map(|r| r.record.version).sum();
                        for ranked in &snapshot.records {
                            assert!(ranked.record.is_consistent());
                        }
                        assert!(versions <= snapshot.sequence);
                        observed += 1;
                        if finished {
                            break observed;
                        }
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }
        done.store(true, Ordering::SeqCst);
        for reader in readers {
            assert!(reader.join().unwrap() > 0);
        }
    });

    let snapshot = store.snapshot().unwrap();
    let versions: u64 = snapshot.records.iter().map(|r| r.record.version).sum();
    assert_eq!(versions, 1_200);
    assert_eq!(snapshot.sequence, 1_200);
}
