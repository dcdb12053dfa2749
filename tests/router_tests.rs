//! Tests for the storage router and partitions
//!
//! These tests verify:
//! - Deterministic, stable key routing
//! - Store/fetch round trips and batch fetch equivalence
//! - Brute-force scan semantics (short-circuit, full visit)
//! - Idempotent clear
//! - File-backed partition durability and unavailability errors

use distritree::storage::{
    FilePartition, Key, MemoryPartition, Partition, StorageRouter,
};
use distritree::DistriError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn memory_router(n: u32) -> StorageRouter {
    let partitions: Vec<Box<dyn Partition>> = (0..n)
        .map(|id| Box::new(MemoryPartition::new(id)) as Box<dyn Partition>)
        .collect();
    StorageRouter::new(partitions).unwrap()
}

fn value(k: i64) -> Vec<u8> {
    format!("value-{}", k).into_bytes()
}

// =============================================================================
// Routing Tests
// =============================================================================

#[test]
fn test_routing_is_deterministic_and_stable() {
    let mut router = memory_router(3);

    let keys: Vec<Key> = (0..20)
        .map(Key::Int)
        .chain(["alpha", "beta", "gamma"].iter().map(|s| Key::from(*s)))
        .collect();
    let first: Vec<_> = keys.iter().map(|k| router.route(k)).collect();

    // Unrelated insertions must not perturb routing.
    for k in 100..150 {
        router.store(Key::Int(k), value(k)).unwrap();
    }

    let second: Vec<_> = keys.iter().map(|k| router.route(k)).collect();
    assert_eq!(first, second);
}

#[test]
fn test_integer_routing_is_key_mod_partition_count() {
    let router = memory_router(3);
    assert_eq!(router.route(&Key::Int(0)), 0);
    assert_eq!(router.route(&Key::Int(7)), 1);
    assert_eq!(router.route(&Key::Int(9)), 0);
    // Negative keys still land in range.
    let p = router.route(&Key::Int(-5));
    assert!((p as usize) < router.partition_count());
    assert_eq!(router.route(&Key::Int(-5)), router.route(&Key::Int(-5)));
}

#[test]
fn test_text_routing_in_range_and_stable() {
    let router = memory_router(5);
    for name in ["a", "longer key", "ünïcode", ""] {
        let p = router.route(&Key::from(name));
        assert!((p as usize) < router.partition_count());
        assert_eq!(p, router.route(&Key::from(name)));
    }
}

#[test]
fn test_single_partition_routes_everything_to_zero() {
    let router = memory_router(1);
    for k in -10..10 {
        assert_eq!(router.route(&Key::Int(k)), 0);
    }
}

// =============================================================================
// Store / Fetch Tests
// =============================================================================

#[test]
fn test_store_then_fetch_round_trip() {
    let mut router = memory_router(3);
    let pointer = router.store(Key::Int(42), value(42)).unwrap();

    assert_eq!(pointer.partition_id, router.route(&Key::Int(42)));

    let record = router
        .fetch(pointer.partition_id, pointer.record_id)
        .unwrap()
        .expect("stored record must be fetchable");
    assert_eq!(record.key, Key::Int(42));
    assert_eq!(record.value, value(42));
    assert_eq!(record.record_id, pointer.record_id);
    assert!(record.inserted_at > 0);
}

#[test]
fn test_record_ids_are_unique_across_partitions() {
    let mut router = memory_router(3);
    let mut ids = std::collections::HashSet::new();
    for k in 0..50 {
        let pointer = router.store(Key::Int(k), value(k)).unwrap();
        assert!(ids.insert(pointer.record_id), "record id reused");
    }
}

#[test]
fn test_fetch_absent_record_is_none_not_error() {
    let router = memory_router(3);
    assert!(router.fetch(0, 9999).unwrap().is_none());
}

#[test]
fn test_fetch_unknown_partition_is_an_error() {
    let router = memory_router(3);
    assert!(matches!(
        router.fetch(7, 1),
        Err(DistriError::UnknownPartition(7))
    ));
}

#[test]
fn test_batch_fetch_matches_individual_fetches() {
    let mut router = memory_router(3);
    let pointers: Vec<_> = (0..30)
        .map(|k| (k, router.store(Key::Int(k), value(k)).unwrap()))
        .collect();

    for partition_id in 0..3 {
        let ids: Vec<_> = pointers
            .iter()
            .filter(|(_, p)| p.partition_id == partition_id)
            .map(|(_, p)| p.record_id)
            .collect();

        let mut batched = router.fetch_batch(partition_id, &ids).unwrap();
        batched.sort_by(|a, b| a.key.cmp(&b.key));

        let mut individual: Vec<_> = ids
            .iter()
            .map(|&id| router.fetch(partition_id, id).unwrap().unwrap())
            .collect();
        individual.sort_by(|a, b| a.key.cmp(&b.key));

        assert_eq!(batched, individual);
    }
}

#[test]
fn test_batch_fetch_skips_missing_ids() {
    let mut router = memory_router(1);
    let p = router.store(Key::Int(1), value(1)).unwrap();
    let records = router.fetch_batch(0, &[p.record_id, 4242]).unwrap();
    assert_eq!(records.len(), 1);
}

// =============================================================================
// Scan Tests
// =============================================================================

#[test]
fn test_scan_all_short_circuits_on_first_match() {
    let mut router = memory_router(3);
    for k in 0..9 {
        router.store(Key::Int(k), value(k)).unwrap();
    }

    // Key 1 routes to partition 1: partition 0 is visited first, partition
    // 2 never is.
    let scan = router.scan_all(&Key::Int(1)).unwrap();
    let (pointer, record) = scan.result.expect("key 1 was stored");
    assert_eq!(pointer.partition_id, 1);
    assert_eq!(record.key, Key::Int(1));
    assert_eq!(scan.visited, vec!["partition_0", "partition_1"]);
    assert!(scan.trace.iter().any(|s| s.contains("found in partition_1")));

    // Key 0 lives in the first partition, which is still visited.
    let scan = router.scan_all(&Key::Int(0)).unwrap();
    assert_eq!(scan.visited, vec!["partition_0"]);
}

#[test]
fn test_scan_all_miss_visits_every_partition() {
    let mut router = memory_router(3);
    for k in 0..9 {
        router.store(Key::Int(k), value(k)).unwrap();
    }

    let scan = router.scan_all(&Key::Int(99)).unwrap();
    assert!(scan.result.is_none());
    assert_eq!(
        scan.visited,
        vec!["partition_0", "partition_1", "partition_2"]
    );
}

#[test]
fn test_scan_range_visits_all_and_sorts_ascending() {
    let mut router = memory_router(3);
    // Insert out of order so sorting is observable.
    for k in [9, 2, 7, 4, 1, 8, 3, 6, 5] {
        router.store(Key::Int(k), value(k)).unwrap();
    }

    let scan = router.scan_range(&Key::Int(3), &Key::Int(8)).unwrap();
    assert_eq!(
        scan.visited,
        vec!["partition_0", "partition_1", "partition_2"]
    );
    let keys: Vec<_> = scan.results.iter().map(|(_, r)| r.key.clone()).collect();
    assert_eq!(keys, (3..=8).map(Key::Int).collect::<Vec<_>>());
}

#[test]
fn test_scan_range_rejects_inverted_bounds() {
    let router = memory_router(3);
    assert!(matches!(
        router.scan_range(&Key::Int(5), &Key::Int(3)),
        Err(DistriError::InvalidRange { .. })
    ));
}

// =============================================================================
// Clear Tests
// =============================================================================

#[test]
fn test_clear_all_is_idempotent() {
    let mut router = memory_router(3);
    for k in 0..12 {
        router.store(Key::Int(k), value(k)).unwrap();
    }
    assert_eq!(router.total_records(), 12);

    router.clear_all().unwrap();
    assert_eq!(router.total_records(), 0);

    // Repeatable with no effect.
    router.clear_all().unwrap();
    assert_eq!(router.total_records(), 0);

    // Still usable afterwards.
    router.store(Key::Int(1), value(1)).unwrap();
    assert_eq!(router.total_records(), 1);
}

// =============================================================================
// File Partition Tests
// =============================================================================

#[test]
fn test_file_partition_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partition_0.jsonl");

    let pointer = {
        let partitions: Vec<Box<dyn Partition>> =
            vec![Box::new(FilePartition::open(0, &path).unwrap())];
        let mut router = StorageRouter::new(partitions).unwrap();
        router.store(Key::Int(3), value(3)).unwrap()
    };

    // Reopen the same file: the record is still there.
    let reopened = FilePartition::open(0, &path).unwrap();
    assert_eq!(reopened.len(), 1);
    let record = reopened.get(pointer.record_id).unwrap().unwrap();
    assert_eq!(record.key, Key::Int(3));
    assert_eq!(record.value, value(3));
}

#[test]
fn test_file_partition_clear_truncates_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partition_0.jsonl");

    let mut partition = FilePartition::open(0, &path).unwrap();
    partition
        .insert(distritree::Record {
            record_id: 1,
            key: Key::Int(1),
            value: value(1),
            inserted_at: 0,
        })
        .unwrap();
    assert_eq!(partition.len(), 1);

    partition.clear().unwrap();
    assert_eq!(partition.len(), 0);
    drop(partition);

    let reopened = FilePartition::open(0, &path).unwrap();
    assert!(reopened.is_empty());
}

#[test]
fn test_unreadable_path_is_unavailable_not_absent() {
    // Opening a partition file under a path that cannot exist must surface
    // as PartitionUnavailable, never as an empty/absent result.
    let result = FilePartition::open(0, "/nonexistent-dir/deeper/partition_0.jsonl");
    match result {
        Err(DistriError::PartitionUnavailable { partition, .. }) => {
            assert_eq!(partition, "partition_0");
        }
        other => panic!("expected PartitionUnavailable, got {:?}", other.map(|_| ())),
    }
}
