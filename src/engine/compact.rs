//! Compaction
//!
//! Rewrites only the live records of a store into fresh files and swaps them
//! into place.
//!
//! ## Walk
//! ```text
//!   slot state   action
//!   ──────────   ────────────────────────────────────────────────
//!   Ok           copy
//!   Head         follow chain; copy the terminal if it is a Tail
//!   Linked       skip (reached through its Head)
//!   Tail         skip (reached through its Head, or orphaned)
//!   Deleted      skip
//!   Copied       skip
//! ```
//! Only `Ok`/`Head` slots start a copy, and those carry strictly increasing
//! keys, so the new index is a dense sorted array of `Ok` slots.
//!
//! ## Swap
//! 1. Build `<index>.compact` / `<data>.compact` through a temporary engine
//! 2. Close the temporary engine (truncating its files)
//! 3. Mark migrated slots `Copied` in the original index
//! 4. Release the original mappings and rename the new files over them
//! 5. Remap the new files
//!
//! Any failure before step 3 removes the temporary files and leaves the
//! original store untouched.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{Config, SyncStrategy};
use crate::error::{AtlasError, Result};
use crate::format::{slot_offset, FileHeader, IndexRecord, RecordState, RECORD_LEN};
use crate::key::Key;
use crate::storage::search::resolve_chain;
use crate::storage::{MappedFile, SlotSource};

use super::Engine;

/// Suffix of the files a compaction builds next to the originals
const COMPACT_SUFFIX: &str = "compact";

/// Outcome of one compaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompactionStats {
    /// Index slots walked
    pub slots_scanned: u32,
    /// Live records written to the new files
    pub records_copied: u32,
    pub index_bytes_before: u64,
    pub index_bytes_after: u64,
    pub data_bytes_before: u64,
    pub data_bytes_after: u64,
}

impl CompactionStats {
    /// Bytes no longer used across both files
    pub fn bytes_reclaimed(&self) -> u64 {
        (self.index_bytes_before + self.data_bytes_before)
            .saturating_sub(self.index_bytes_after + self.data_bytes_after)
    }
}

impl Engine {
    /// Compact the store, dropping superseded and deleted records
    ///
    /// Keys and payloads of live records are preserved; the last issued key
    /// carries over so keys are never reused. The engine stays usable on the
    /// compacted files afterwards.
    pub fn compress(&mut self) -> Result<CompactionStats> {
        self.ensure_open()?;

        let index_tmp = sibling(&self.config.index_path, COMPACT_SUFFIX);
        let data_tmp = sibling(&self.config.data_path, COMPACT_SUFFIX);
        let cache_tmp = sibling(&self.config.cache_path, COMPACT_SUFFIX);

        let mut stats = CompactionStats {
            index_bytes_before: u64::from(self.header.index_tail),
            data_bytes_before: u64::from(self.header.data_tail),
            ..CompactionStats::default()
        };

        // Same reservations as the current files
        let fresh = FileHeader::new(self.header.index_max_pages, self.header.data_max_pages);
        Self::create_files(&index_tmp, &data_tmp, fresh)?;

        let target_config = Config {
            index_path: index_tmp.clone(),
            data_path: data_tmp.clone(),
            cache_path: cache_tmp,
            data_page_count: self.header.data_max_pages,
            cache_window: self.config.cache_window,
            sync_strategy: SyncStrategy::OnClose,
        };

        let built = Self::open(target_config).and_then(|mut target| {
            target.persist_cache = false;
            let migrated = self.copy_live_records(&mut target, &mut stats)?;

            target.header.last_key = target.header.last_key.max(self.header.last_key);
            target.write_header()?;

            let header = target.header;
            let cache = std::mem::take(&mut target.cache);
            target.close()?;
            Ok((migrated, header, cache))
        });

        let (migrated, header, cache) = match built {
            Ok(built) => built,
            Err(e) => {
                remove_quietly(&index_tmp);
                remove_quietly(&data_tmp);
                return Err(e);
            }
        };

        for offset in migrated {
            self.mark_copied(offset)?;
        }

        // From here on the original mappings are gone; if the swap fails the
        // engine stays closed.
        self.closed = true;
        self.index.release()?;
        self.data.release()?;

        fs::rename(&index_tmp, &self.config.index_path)?;
        fs::rename(&data_tmp, &self.config.data_path)?;

        self.index = MappedFile::open(&self.config.index_path, "index", header.index_capacity())?;
        self.data = MappedFile::open(&self.config.data_path, "data", header.data_capacity())?;
        self.header = header;
        self.cache = cache;
        self.unsynced_writes = 0;
        self.closed = false;

        stats.index_bytes_after = u64::from(header.index_tail);
        stats.data_bytes_after = u64::from(header.data_tail);

        info!(
            index = %self.config.index_path.display(),
            scanned = stats.slots_scanned,
            copied = stats.records_copied,
            reclaimed = stats.bytes_reclaimed(),
            "compacted store"
        );
        Ok(stats)
    }

    /// Copy every live record into `target`; returns the migrated slot offsets
    fn copy_live_records(
        &self,
        target: &mut Engine,
        stats: &mut CompactionStats,
    ) -> Result<Vec<u32>> {
        let view = self.view();
        let mut migrated = Vec::new();
        let mut previous = Key::EMPTY;

        for slot in 1..=view.slot_count() {
            stats.slots_scanned += 1;

            let record = view.load_slot(slot)?;
            let (terminal_slot, terminal) = match record.state {
                RecordState::Ok => (slot, record),
                RecordState::Head => resolve_chain(&view, slot)?,
                _ => continue,
            };
            if !terminal.state.is_live() {
                continue;
            }

            if terminal.key <= previous {
                return Err(AtlasError::MalformedLayout(format!(
                    "slot {} key {} does not follow key {}",
                    slot, terminal.key, previous
                )));
            }

            let payload = self.read_payload(&terminal)?;
            target.copy_in(terminal.key, &terminal.type_tag, &payload)?;

            previous = terminal.key;
            migrated.push(slot_offset(terminal_slot));
            stats.records_copied += 1;
        }

        Ok(migrated)
    }

    /// Append a record under an existing key, raising `last_key` to match
    fn copy_in(&mut self, key: Key, type_tag: &str, payload: &[u8]) -> Result<()> {
        self.ensure_room(payload.len())?;
        self.header.last_key = self.header.last_key.max(key);
        self.append(key, type_tag, payload, RecordState::Ok)?;
        Ok(())
    }

    fn mark_copied(&mut self, offset: u32) -> Result<()> {
        let bytes = self.index.read(u64::from(offset), RECORD_LEN as usize)?;
        let record = IndexRecord::decode(bytes)?;
        let copied = record.with_state(RecordState::Copied);
        self.index.write(u64::from(offset), &copied.encode())
    }
}

/// `path` with `.suffix` appended to its file name
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "failed to remove compaction file");
    }
}
