//! FIFO key → offset cache

use std::collections::{HashMap, VecDeque};

use crate::key::Key;

/// Bounded key → index offset map with insertion-order eviction
#[derive(Debug, Clone)]
pub struct LookupCache {
    /// Maximum number of keys held
    capacity: usize,
    /// Keys in insertion order, oldest first
    window: VecDeque<Key>,
    /// Offsets by key
    lookup: HashMap<Key, u32>,
}

impl LookupCache {
    /// Create an empty cache; a capacity of 0 disables caching
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            window: VecDeque::with_capacity(capacity),
            lookup: HashMap::with_capacity(capacity),
        }
    }

    pub fn get(&self, key: Key) -> Option<u32> {
        self.lookup.get(&key).copied()
    }

    /// Insert or overwrite `key`
    ///
    /// Overwriting keeps the key's original position in the window. Inserting
    /// a new key into a full cache evicts the oldest key first.
    pub fn insert(&mut self, key: Key, offset: u32) {
        if self.capacity == 0 {
            return;
        }

        if let Some(existing) = self.lookup.get_mut(&key) {
            *existing = offset;
            return;
        }

        if self.window.len() == self.capacity {
            if let Some(expired) = self.window.pop_front() {
                self.lookup.remove(&expired);
            }
        }

        self.lookup.insert(key, offset);
        self.window.push_back(key);
    }

    /// Drop `key`, returning its offset if it was cached
    pub fn remove(&mut self, key: Key) -> Option<u32> {
        let offset = self.lookup.remove(&key)?;
        self.window.retain(|k| *k != key);
        Some(offset)
    }

    pub fn clear(&mut self) {
        self.window.clear();
        self.lookup.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Entries oldest first
    pub fn iter(&self) -> impl Iterator<Item = (Key, u32)> + '_ {
        self.window.iter().map(move |key| (*key, self.lookup[key]))
    }
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::new(super::DEFAULT_WINDOW)
    }
}
