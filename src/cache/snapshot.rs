//! Cache snapshot persistence
//!
//! ## File Format
//! ```text
//! {
//!   "version": 1,
//!   "fingerprint": 2876543210,     ← CRC32 of the header line at save time
//!   "capacity": 128,
//!   "entries": [                   ← oldest first
//!     { "key": 1, "offset": 46 },
//!     ...
//!   ]
//! }
//! ```
//!
//! A snapshot is only meaningful for the exact index file state it was taken
//! from. The fingerprint ties it to the header line; any append, compaction or
//! foreign write changes the header and invalidates the snapshot.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AtlasError, Result};
use crate::format::FileHeader;
use crate::key::Key;

use super::LookupCache;

/// Current snapshot format version
pub const VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    fingerprint: u32,
    capacity: usize,
    entries: Vec<Entry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    key: Key,
    offset: u32,
}

/// Fingerprint of an index file state
pub fn fingerprint(header: &FileHeader) -> u32 {
    crc32fast::hash(&header.encode())
}

/// Write `cache` to `path`, tagged with `fingerprint`
pub fn save(cache: &LookupCache, fingerprint: u32, path: &Path) -> Result<()> {
    let snapshot = Snapshot {
        version: VERSION,
        fingerprint,
        capacity: cache.capacity(),
        entries: cache
            .iter()
            .map(|(key, offset)| Entry { key, offset })
            .collect(),
    };

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &snapshot)?;
    writer.flush()?;
    Ok(())
}

/// Load a snapshot into a cache of `capacity` keys
///
/// Returns:
/// - `Ok(Some(cache))` — snapshot exists and matches `fingerprint`
/// - `Ok(None)` — no snapshot, or it belongs to a different file state
/// - `Err(..)` — unreadable or unparsable snapshot
pub fn load(path: &Path, fingerprint: u32, capacity: usize) -> Result<Option<LookupCache>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;
    if snapshot.version != VERSION {
        return Err(AtlasError::Serialization(format!(
            "unsupported cache snapshot version: {}",
            snapshot.version
        )));
    }
    if snapshot.fingerprint != fingerprint {
        return Ok(None);
    }

    // Replaying in saved order keeps the newest `capacity` entries if the
    // window shrank since the snapshot was taken.
    let mut cache = LookupCache::new(capacity);
    for entry in snapshot.entries {
        cache.insert(entry.key, entry.offset);
    }
    Ok(Some(cache))
}

/// Remove a snapshot file, ignoring a missing file
pub fn discard(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
