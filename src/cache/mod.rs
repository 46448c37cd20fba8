//! Lookup Cache Module
//!
//! Short-circuits the index binary search for recently touched keys.
//!
//! ## Responsibilities
//! - Map keys to the index offset that last resolved them
//! - Bound memory with FIFO eviction (insertion order, no refresh on update)
//! - Persist a snapshot on close and reload it on open
//!
//! The cache is an optimization only. Every cached offset is checked against
//! the index file before use, so a stale or foreign snapshot costs a binary
//! search, never a wrong answer.

mod lookup;
pub mod snapshot;

pub use lookup::LookupCache;

/// Default number of keys kept in the cache
pub const DEFAULT_WINDOW: usize = 128;
