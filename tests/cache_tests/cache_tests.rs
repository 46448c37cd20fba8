//! Tests for LookupCache
//!
//! These tests verify:
//! - Insert/get/remove
//! - FIFO eviction once the window is full
//! - Overwrites keep their window position
//! - A zero-capacity cache stays empty

use atlasrec::cache::{LookupCache, DEFAULT_WINDOW};
use atlasrec::Key;

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_insert_and_get() {
    let mut cache = LookupCache::new(4);
    cache.insert(Key::new(1), 46);
    cache.insert(Key::new(2), 113);

    assert_eq!(cache.get(Key::new(1)), Some(46));
    assert_eq!(cache.get(Key::new(2)), Some(113));
    assert_eq!(cache.get(Key::new(3)), None);
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_overwrite_updates_offset() {
    let mut cache = LookupCache::new(4);
    cache.insert(Key::new(1), 46);
    cache.insert(Key::new(1), 180);

    assert_eq!(cache.get(Key::new(1)), Some(180));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_remove() {
    let mut cache = LookupCache::new(4);
    cache.insert(Key::new(1), 46);
    cache.insert(Key::new(2), 113);

    assert_eq!(cache.remove(Key::new(1)), Some(46));
    assert_eq!(cache.remove(Key::new(1)), None);
    assert_eq!(cache.get(Key::new(1)), None);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_clear() {
    let mut cache = LookupCache::new(4);
    cache.insert(Key::new(1), 46);
    cache.clear();

    assert!(cache.is_empty());
    assert_eq!(cache.capacity(), 4);
}

#[test]
fn test_default_window() {
    let cache = LookupCache::default();
    assert_eq!(cache.capacity(), DEFAULT_WINDOW);
    assert!(cache.is_empty());
}

// =============================================================================
// Eviction Tests
// =============================================================================

#[test]
fn test_fifo_eviction() {
    let mut cache = LookupCache::new(3);
    for k in 1..=4 {
        cache.insert(Key::new(k), k * 100);
    }

    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get(Key::new(1)), None);
    assert_eq!(cache.get(Key::new(2)), Some(200));
    assert_eq!(cache.get(Key::new(4)), Some(400));
}

#[test]
fn test_reads_do_not_refresh() {
    let mut cache = LookupCache::new(2);
    cache.insert(Key::new(1), 100);
    cache.insert(Key::new(2), 200);

    // A read of the oldest key does not save it from eviction
    assert_eq!(cache.get(Key::new(1)), Some(100));
    cache.insert(Key::new(3), 300);

    assert_eq!(cache.get(Key::new(1)), None);
    assert_eq!(cache.get(Key::new(2)), Some(200));
}

#[test]
fn test_overwrite_does_not_refresh() {
    let mut cache = LookupCache::new(2);
    cache.insert(Key::new(1), 100);
    cache.insert(Key::new(2), 200);
    cache.insert(Key::new(1), 150);
    cache.insert(Key::new(3), 300);

    assert_eq!(cache.get(Key::new(1)), None);
    assert_eq!(cache.get(Key::new(2)), Some(200));
    assert_eq!(cache.get(Key::new(3)), Some(300));
}

#[test]
fn test_remove_frees_window_slot() {
    let mut cache = LookupCache::new(2);
    cache.insert(Key::new(1), 100);
    cache.insert(Key::new(2), 200);
    cache.remove(Key::new(1));
    cache.insert(Key::new(3), 300);

    assert_eq!(cache.get(Key::new(2)), Some(200));
    assert_eq!(cache.get(Key::new(3)), Some(300));
}

#[test]
fn test_iter_oldest_first() {
    let mut cache = LookupCache::new(3);
    for k in [5, 3, 9, 1] {
        cache.insert(Key::new(k), k);
    }

    let keys: Vec<u32> = cache.iter().map(|(key, _)| key.value()).collect();
    assert_eq!(keys, vec![3, 9, 1]);
}

#[test]
fn test_zero_capacity_disables_cache() {
    let mut cache = LookupCache::new(0);
    cache.insert(Key::new(1), 100);

    assert!(cache.is_empty());
    assert_eq!(cache.get(Key::new(1)), None);
}
