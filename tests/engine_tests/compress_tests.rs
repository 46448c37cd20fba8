//! Tests for Engine::compress
//!
//! These tests verify:
//! - Live payloads and keys survive compaction
//! - Deleted and superseded records are dropped
//! - Keys are not reused afterwards
//! - Temporary files are cleaned up
//! - The engine keeps working on the compacted files

use std::fs;

use atlasrec::{AtlasError, Config, Engine, Key, RecordState};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn config_in(temp_dir: &TempDir) -> Config {
    Config::builder()
        .data_dir(temp_dir.path())
        .data_page_count(64)
        .build()
}

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir);
    Engine::create(&config).unwrap();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

fn payload(engine: &mut Engine, key: u32) -> Option<Vec<u8>> {
    engine
        .fetch_raw(Key::new(key))
        .unwrap()
        .map(|stored| stored.payload)
}

fn keys_and_states(engine: &Engine) -> Vec<(u32, RecordState)> {
    engine
        .index_records()
        .unwrap()
        .into_iter()
        .map(|(_, r)| (r.key.value(), r.state))
        .collect()
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_compress_empty_store() {
    let (_temp_dir, mut engine) = setup_temp_engine();

    let stats = engine.compress().unwrap();

    assert_eq!(stats.slots_scanned, 0);
    assert_eq!(stats.records_copied, 0);
    assert_eq!(engine.slot_count(), 0);
}

#[test]
fn test_compress_keeps_live_records() {
    let (_temp_dir, mut engine) = setup_temp_engine();
    for i in 1..=5 {
        engine.add_raw("Blob", format!("value-{}", i).as_bytes()).unwrap();
    }

    let stats = engine.compress().unwrap();

    assert_eq!(stats.records_copied, 5);
    assert_eq!(stats.bytes_reclaimed(), 0);
    for i in 1..=5 {
        assert_eq!(payload(&mut engine, i), Some(format!("value-{}", i).into_bytes()));
    }
}

#[test]
fn test_compress_drops_deleted_records() {
    let (_temp_dir, mut engine) = setup_temp_engine();
    for _ in 0..4 {
        engine.add_raw("Blob", b"payload").unwrap();
    }
    engine.delete(Key::new(2)).unwrap();
    engine.delete(Key::new(4)).unwrap();

    let stats = engine.compress().unwrap();

    assert_eq!(stats.slots_scanned, 4);
    assert_eq!(stats.records_copied, 2);
    assert_eq!(
        keys_and_states(&engine),
        vec![(1, RecordState::Ok), (3, RecordState::Ok)]
    );
    assert!(payload(&mut engine, 2).is_none());
    assert!(payload(&mut engine, 4).is_none());
}

#[test]
fn test_compress_flattens_chains() {
    let (_temp_dir, mut engine) = setup_temp_engine();
    let a = engine.add_raw("Blob", b"a").unwrap();
    let b = engine.add_raw("Blob", b"b").unwrap();
    engine.update_raw(a, "Blob", b"aaaa").unwrap();
    engine.update_raw(a, "Blob", b"aaaaaaaa").unwrap();
    engine.update_raw(b, "Blob", b"bbbbbb").unwrap();

    let stats = engine.compress().unwrap();

    assert_eq!(stats.slots_scanned, 5);
    assert_eq!(stats.records_copied, 2);
    assert!(stats.bytes_reclaimed() > 0);
    assert_eq!(
        keys_and_states(&engine),
        vec![(1, RecordState::Ok), (2, RecordState::Ok)]
    );
    assert_eq!(payload(&mut engine, 1), Some(b"aaaaaaaa".to_vec()));
    assert_eq!(payload(&mut engine, 2), Some(b"bbbbbb".to_vec()));
}

#[test]
fn test_compress_drops_deleted_chain() {
    let (_temp_dir, mut engine) = setup_temp_engine();
    let a = engine.add_raw("Blob", b"a").unwrap();
    engine.add_raw("Blob", b"b").unwrap();
    engine.update_raw(a, "Blob", b"a much longer value").unwrap();
    engine.delete(a).unwrap();

    let stats = engine.compress().unwrap();

    assert_eq!(stats.records_copied, 1);
    assert_eq!(keys_and_states(&engine), vec![(2, RecordState::Ok)]);
    assert!(payload(&mut engine, 1).is_none());
}

#[test]
fn test_compress_does_not_reuse_keys() {
    let (_temp_dir, mut engine) = setup_temp_engine();
    for _ in 0..3 {
        engine.add_raw("Blob", b"x").unwrap();
    }
    engine.delete(Key::new(3)).unwrap();

    engine.compress().unwrap();

    assert_eq!(engine.header().last_key, Key::new(3));
    assert_eq!(engine.add_raw("Blob", b"y").unwrap(), Key::new(4));
}

#[test]
fn test_compress_keeps_reservations() {
    let (_temp_dir, mut engine) = setup_temp_engine();
    engine.add_raw("Blob", b"x").unwrap();
    let before = *engine.header();

    engine.compress().unwrap();

    let after = engine.header();
    assert_eq!(after.index_max_pages, before.index_max_pages);
    assert_eq!(after.data_max_pages, before.data_max_pages);
}

#[test]
fn test_compress_removes_temporary_files() {
    let (temp_dir, mut engine) = setup_temp_engine();
    engine.add_raw("Blob", b"x").unwrap();

    engine.compress().unwrap();

    let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".compact"))
        .collect();
    assert!(leftovers.is_empty(), "leftover files: {:?}", leftovers);
}

#[test]
fn test_compress_twice() {
    let (_temp_dir, mut engine) = setup_temp_engine();
    let a = engine.add_raw("Blob", b"a").unwrap();
    engine.add_raw("Blob", b"b").unwrap();
    engine.update_raw(a, "Blob", b"grown value").unwrap();

    engine.compress().unwrap();
    let second = engine.compress().unwrap();

    assert_eq!(second.records_copied, 2);
    assert_eq!(second.bytes_reclaimed(), 0);
    assert_eq!(payload(&mut engine, 1), Some(b"grown value".to_vec()));
}

#[test]
fn test_compress_then_reopen() {
    let (temp_dir, mut engine) = setup_temp_engine();
    for i in 0..10u32 {
        engine.add_raw("Blob", &i.to_le_bytes()).unwrap();
    }
    for k in [2, 4, 6] {
        engine.delete(Key::new(k)).unwrap();
    }
    engine.compress().unwrap();
    engine.close().unwrap();

    let config = Config::builder()
        .data_dir(temp_dir.path())
        .cache_window(0)
        .build();
    let mut engine = Engine::open(config).unwrap();
    assert_eq!(engine.slot_count(), 7);
    for k in 1..=10 {
        assert_eq!(payload(&mut engine, k).is_some(), ![2, 4, 6].contains(&k));
    }
}

#[test]
fn test_operations_after_compress() {
    let (_temp_dir, mut engine) = setup_temp_engine();
    let a = engine.add_raw("Blob", b"first").unwrap();
    engine.add_raw("Blob", b"second").unwrap();
    engine.delete(Key::new(2)).unwrap();
    engine.compress().unwrap();

    engine.update_raw(a, "Blob", b"first, but longer").unwrap();
    engine.delete(a).unwrap();
    assert!(payload(&mut engine, 1).is_none());
    assert!(matches!(
        engine.update_raw(a, "Blob", b"again"),
        Err(AtlasError::RecordDeleted(_))
    ));
}
