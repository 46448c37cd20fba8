//! Engine Module
//!
//! The record store that coordinates the index file, the data file and the
//! lookup cache.
//!
//! ## Responsibilities
//! - Create and open store file pairs
//! - Resolve keys to index slots (cache first, then binary search)
//! - Append new records and grow oversized updates into link chains
//! - Tombstone deleted records
//! - Truncate files to their used length on close
//! - Compact live records into fresh files (see `compact`)

mod compact;

use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::cache::{snapshot, LookupCache};
use crate::config::{Config, SyncStrategy};
use crate::error::{AtlasError, Result};
use crate::format::{
    index_pages_for, offset_slot, slot_offset, validate_type_tag, FileHeader, IndexRecord,
    RecordState, HEADER_LEN, RECORD_LEN, TERMINATOR,
};
use crate::key::Key;
use crate::record::{Record, StoredRecord};
use crate::storage::search::{find_slot, resolve_chain};
use crate::storage::{MappedFile, SlotSource};

pub use compact::CompactionStats;

/// The main storage engine
///
/// ## Concurrency Model: Single Writer, Single Handle
///
/// - Every operation that can touch the files takes `&mut self`, including
///   `fetch` (a resolved lookup refreshes the cache)
/// - No internal locking; callers sharing an engine across threads wrap it
///   in their own mutex
/// - Exactly one engine may have a given file pair open. A second handle over
///   the same files is unsupported and not detected
///
/// ## Write Ordering
///
/// An add is three sub-writes: header (key reservation), data block, index
/// slot + header (tails). A crash between them can leave the header ahead of
/// the content; no recovery is attempted on open.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Index file mapping (header + fixed-width slots)
    index: MappedFile,

    /// Data file mapping (payload blocks)
    data: MappedFile,

    /// In-memory copy of the index header, written through on every change
    header: FileHeader,

    /// Recently resolved key → index offset pairs
    cache: LookupCache,

    /// Mutations since the last flush (for `SyncStrategy::EveryNWrites`)
    unsynced_writes: usize,

    /// Write the cache snapshot on close
    persist_cache: bool,

    /// Set once the mappings have been released
    closed: bool,
}

/// Slot access over an open index mapping
struct IndexView<'a> {
    index: &'a MappedFile,
    header: &'a FileHeader,
}

impl SlotSource for IndexView<'_> {
    fn slot_count(&self) -> u32 {
        (self.header.index_tail - HEADER_LEN) / RECORD_LEN
    }

    fn load_slot(&self, slot: u32) -> Result<IndexRecord> {
        if slot == 0 || slot > self.slot_count() {
            return Err(AtlasError::MalformedLayout(format!(
                "slot {} outside the {} slots in use",
                slot,
                self.slot_count()
            )));
        }
        let bytes = self
            .index
            .read(u64::from(slot_offset(slot)), RECORD_LEN as usize)?;
        IndexRecord::decode(bytes)
    }
}

/// Per-state slot counts and file usage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub slots: u32,
    pub ok: u32,
    pub head: u32,
    pub linked: u32,
    pub tail: u32,
    pub deleted: u32,
    pub copied: u32,
    pub last_key: Key,
    pub index_used: u64,
    pub index_capacity: u64,
    pub data_used: u64,
    pub data_capacity: u64,
}

impl StoreStats {
    /// Slots holding an authoritative payload
    pub fn live(&self) -> u32 {
        self.ok + self.tail
    }

    fn count(&mut self, state: RecordState) {
        let counter = match state {
            RecordState::Ok => &mut self.ok,
            RecordState::Head => &mut self.head,
            RecordState::Linked => &mut self.linked,
            RecordState::Tail => &mut self.tail,
            RecordState::Deleted => &mut self.deleted,
            RecordState::Copied => &mut self.copied,
        };
        *counter += 1;
    }
}

impl Engine {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create a fresh, empty store at the configured paths
    ///
    /// The index file gets `ceil(data_page_count / 64)` pages. Existing files
    /// at either path are recreated, and any cache snapshot is removed.
    pub fn create(config: &Config) -> Result<()> {
        config.validate()?;

        let header = FileHeader::new(
            index_pages_for(config.data_page_count),
            config.data_page_count,
        );
        Self::create_files(&config.index_path, &config.data_path, header)?;
        snapshot::discard(&config.cache_path)?;

        info!(
            index = %config.index_path.display(),
            data = %config.data_path.display(),
            index_pages = header.index_max_pages,
            data_pages = header.data_max_pages,
            "created store"
        );
        Ok(())
    }

    /// Create with explicit paths (convenience method)
    pub fn create_paths(index_path: &Path, data_path: &Path, data_page_count: u16) -> Result<()> {
        let config = Config::builder()
            .index_path(index_path)
            .data_path(data_path)
            .data_page_count(data_page_count)
            .build();
        config.validate()?;
        let header = FileHeader::new(index_pages_for(data_page_count), data_page_count);
        Self::create_files(index_path, data_path, header)
    }

    /// Preallocate both files and write `header`
    fn create_files(index_path: &Path, data_path: &Path, header: FileHeader) -> Result<()> {
        let mut index = MappedFile::preallocate(index_path, header.index_capacity())?;
        index.write_all(&header.encode())?;
        index.sync_all()?;

        let data = MappedFile::preallocate(data_path, header.data_capacity())?;
        data.sync_all()?;
        Ok(())
    }

    /// Open an existing store
    ///
    /// On startup:
    /// 1. Read and validate the header
    /// 2. Map both files at their reserved size
    /// 3. Load the cache snapshot if it matches this file state
    pub fn open(config: Config) -> Result<Self> {
        // Fail before touching either file if one is missing
        fs::metadata(&config.index_path)?;
        fs::metadata(&config.data_path)?;

        let header = Self::read_header(&config.index_path)?;
        Self::validate_header(&header)?;

        let index = MappedFile::open(&config.index_path, "index", header.index_capacity())?;
        let data = MappedFile::open(&config.data_path, "data", header.data_capacity())?;
        let cache = Self::load_cache(&config, &header);

        info!(
            index = %config.index_path.display(),
            slots = (header.index_tail - HEADER_LEN) / RECORD_LEN,
            last_key = %header.last_key,
            cached = cache.len(),
            "opened store"
        );

        Ok(Self {
            config,
            index,
            data,
            header,
            cache,
            unsynced_writes: 0,
            persist_cache: true,
            closed: false,
        })
    }

    /// Open with explicit paths (convenience method)
    ///
    /// Uses default config for everything but the three file locations
    pub fn open_paths(index_path: &Path, data_path: &Path, cache_path: &Path) -> Result<Self> {
        let config = Config::builder()
            .index_path(index_path)
            .data_path(data_path)
            .cache_path(cache_path)
            .build();
        Self::open(config)
    }

    fn read_header(path: &Path) -> Result<FileHeader> {
        let mut buf = [0u8; FileHeader::ENCODED_LEN];
        let mut file = File::open(path)?;
        match file.read_exact(&mut buf) {
            Ok(()) => FileHeader::decode(&buf),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(AtlasError::MalformedLayout(
                format!("{} is too short to hold a header", path.display()),
            )),
            Err(e) => Err(e.into()),
        }
    }

    fn validate_header(header: &FileHeader) -> Result<()> {
        if header.index_max_pages == 0 || header.data_max_pages == 0 {
            return Err(AtlasError::MalformedLayout(
                "header reserves zero pages".to_string(),
            ));
        }
        if offset_slot(header.index_tail).is_none() {
            return Err(AtlasError::MalformedLayout(format!(
                "index tail {} is not slot-aligned",
                header.index_tail
            )));
        }
        if u64::from(header.index_tail) > header.index_capacity() {
            return Err(AtlasError::MalformedLayout(format!(
                "index tail {} beyond reservation {}",
                header.index_tail,
                header.index_capacity()
            )));
        }
        if u64::from(header.data_tail) > header.data_capacity() {
            return Err(AtlasError::MalformedLayout(format!(
                "data tail {} beyond reservation {}",
                header.data_tail,
                header.data_capacity()
            )));
        }
        Ok(())
    }

    /// Load the snapshot; any problem just means starting cold
    fn load_cache(config: &Config, header: &FileHeader) -> LookupCache {
        if config.cache_window == 0 {
            return LookupCache::new(0);
        }

        let fingerprint = snapshot::fingerprint(header);
        match snapshot::load(&config.cache_path, fingerprint, config.cache_window) {
            Ok(Some(cache)) => {
                debug!(entries = cache.len(), "loaded lookup cache snapshot");
                cache
            }
            Ok(None) => LookupCache::new(config.cache_window),
            Err(e) => {
                warn!(
                    path = %config.cache_path.display(),
                    error = %e,
                    "ignoring unreadable lookup cache snapshot"
                );
                LookupCache::new(config.cache_window)
            }
        }
    }

    /// Close the engine gracefully
    ///
    /// Persists the cache snapshot, flushes both mappings and truncates each
    /// file to its header tail.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if self.persist_cache && self.config.cache_window > 0 {
            let fingerprint = snapshot::fingerprint(&self.header);
            if let Err(e) = snapshot::save(&self.cache, fingerprint, &self.config.cache_path) {
                warn!(
                    path = %self.config.cache_path.display(),
                    error = %e,
                    "failed to save lookup cache snapshot"
                );
            }
        }

        let index_result = self.index.close(u64::from(self.header.index_tail));
        let data_result = self.data.close(u64::from(self.header.data_tail));
        index_result.and(data_result)?;

        info!(
            index = %self.config.index_path.display(),
            index_bytes = self.header.index_tail,
            data_bytes = self.header.data_tail,
            "closed store"
        );
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(AtlasError::Closed);
        }
        Ok(())
    }

    // =========================================================================
    // Record Operations
    // =========================================================================

    /// Fetch and decode the record stored under `key`
    pub fn fetch<R: Record>(&mut self, key: Key) -> Result<Option<R>> {
        self.fetch_raw(key)?
            .map(|stored| stored.decode::<R>())
            .transpose()
    }

    /// Fetch the stored payload and type tag for `key`
    ///
    /// Returns:
    /// - `Ok(Some(record))` — the chain for `key` ends in a live record
    /// - `Ok(None)` — no slot resolves, or the chain ends deleted/copied
    pub fn fetch_raw(&mut self, key: Key) -> Result<Option<StoredRecord>> {
        self.ensure_open()?;

        let Some(slot) = self.locate(key)? else {
            return Ok(None);
        };

        let (_, terminal) = resolve_chain(&self.view(), slot)?;
        if !terminal.state.is_live() {
            return Ok(None);
        }

        let payload = self.read_payload(&terminal)?;
        Ok(Some(StoredRecord {
            key: terminal.key,
            type_tag: terminal.type_tag,
            payload,
        }))
    }

    /// Store a new record under the next key
    pub fn add<R: Record>(&mut self, record: &R) -> Result<Key> {
        let payload = record.encode()?;
        self.add_raw(record.type_tag(), &payload)
    }

    /// Store a raw payload under the next key
    ///
    /// Steps:
    /// 1. Check both files have room
    /// 2. Reserve `last_key + 1` and persist it in the header
    /// 3. Append the data block and an `Ok` index slot
    /// 4. Advance both tails
    pub fn add_raw(&mut self, type_tag: &str, payload: &[u8]) -> Result<Key> {
        self.ensure_open()?;
        validate_type_tag(type_tag)?;

        let key = self.header.last_key.next()?;
        self.ensure_room(payload.len())?;

        self.header.last_key = key;
        self.write_header()?;

        let offset = self.append(key, type_tag, payload, RecordState::Ok)?;
        self.after_write()?;

        debug!(key = %key, offset, bytes = payload.len(), "added record");
        Ok(key)
    }

    /// Replace the record stored under `key`
    pub fn update<R: Record>(&mut self, key: Key, record: &R) -> Result<()> {
        let payload = record.encode()?;
        self.update_raw(key, record.type_tag(), &payload)
    }

    /// Replace the payload stored under `key`
    ///
    /// A payload that fits the current block is padded and written in place.
    /// A larger one is appended as a `Tail` record and the old terminal is
    /// turned into a link to it (`Ok` → `Head`, `Tail` → `Linked`).
    pub fn update_raw(&mut self, key: Key, type_tag: &str, payload: &[u8]) -> Result<()> {
        self.ensure_open()?;
        validate_type_tag(type_tag)?;

        let slot = self.locate(key)?.ok_or(AtlasError::NotFound(key))?;
        let (terminal_slot, terminal) = resolve_chain(&self.view(), slot)?;

        match terminal.state {
            RecordState::Deleted => return Err(AtlasError::RecordDeleted(key)),
            RecordState::Copied => return Err(AtlasError::NotFound(key)),
            _ => {}
        }

        if terminal.type_tag != type_tag {
            return Err(AtlasError::TypeMismatch {
                key,
                stored: terminal.type_tag,
                given: type_tag.to_string(),
            });
        }

        let block_len = payload.len() as u64 + TERMINATOR.len() as u64;
        if block_len <= u64::from(terminal.length) {
            let mut block = payload.to_vec();
            block.resize(terminal.length as usize - TERMINATOR.len(), b' ');
            block.extend_from_slice(TERMINATOR);
            self.data.write(u64::from(terminal.offset), &block)?;

            debug!(key = %key, slot = terminal_slot, "updated record in place");
        } else {
            self.ensure_room(payload.len())?;
            let tail_offset = self.append(key, type_tag, payload, RecordState::Tail)?;

            let superseded_state = if terminal.state == RecordState::Ok {
                RecordState::Head
            } else {
                RecordState::Linked
            };
            let superseded = IndexRecord {
                state: superseded_state,
                offset: tail_offset,
                ..terminal
            };
            self.index
                .write(u64::from(slot_offset(terminal_slot)), &superseded.encode())?;

            debug!(
                key = %key,
                from_slot = terminal_slot,
                to_offset = tail_offset,
                "relocated oversized update"
            );
        }

        self.after_write()
    }

    /// Tombstone the slot `key` resolves to
    ///
    /// Deleting an unknown or already deleted key is a no-op.
    pub fn delete(&mut self, key: Key) -> Result<()> {
        self.ensure_open()?;

        let Some(slot) = self.locate(key)? else {
            debug!(key = %key, "delete: key not found");
            return Ok(());
        };

        let record = self.view().load_slot(slot)?;
        if record.state == RecordState::Deleted {
            return Ok(());
        }

        let tombstone = record.with_state(RecordState::Deleted);
        self.index
            .write(u64::from(slot_offset(slot)), &tombstone.encode())?;
        self.after_write()?;

        debug!(key = %key, slot, was = %record.state, "deleted record");
        Ok(())
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn view(&self) -> IndexView<'_> {
        IndexView {
            index: &self.index,
            header: &self.header,
        }
    }

    /// Resolve `key` to a slot: cache first, then binary search
    ///
    /// A cached offset is trusted only if it names a slot in use that still
    /// carries `key`; otherwise it is dropped and the search runs.
    fn locate(&mut self, key: Key) -> Result<Option<u32>> {
        if key.is_empty() {
            return Ok(None);
        }

        if let Some(offset) = self.cache.get(key) {
            if let Some(slot) = self.check_cached(key, offset)? {
                return Ok(Some(slot));
            }
            debug!(key = %key, offset, "dropping stale cache entry");
            self.cache.remove(key);
        }

        let found = find_slot(&self.view(), key)?;
        if let Some(slot) = found {
            self.cache.insert(key, slot_offset(slot));
        }
        Ok(found)
    }

    fn check_cached(&self, key: Key, offset: u32) -> Result<Option<u32>> {
        let view = self.view();
        let slot = match offset_slot(offset) {
            Some(slot) if slot <= view.slot_count() => slot,
            _ => return Ok(None),
        };
        let record = view.load_slot(slot)?;
        Ok((record.key == key).then_some(slot))
    }

    /// Read a block and strip its terminator and padding
    fn read_payload(&self, record: &IndexRecord) -> Result<Vec<u8>> {
        let length = record.length as usize;
        let end = u64::from(record.offset) + u64::from(record.length);
        if length < TERMINATOR.len() || end > u64::from(self.header.data_tail) {
            return Err(AtlasError::MalformedLayout(format!(
                "key {}: block {}+{} outside the {} bytes of data in use",
                record.key, record.offset, record.length, self.header.data_tail
            )));
        }

        let block = self.data.read(u64::from(record.offset), length)?;
        let Some(body) = block.strip_suffix(TERMINATOR) else {
            return Err(AtlasError::MalformedLayout(format!(
                "key {}: data block at {} is not terminated",
                record.key, record.offset
            )));
        };

        let trimmed = body.len() - body.iter().rev().take_while(|b| **b == b' ').count();
        Ok(body[..trimmed].to_vec())
    }

    /// Fail with `CapacityExceeded` unless one more block and slot fit
    fn ensure_room(&self, payload_len: usize) -> Result<()> {
        let block_len = payload_len as u64 + TERMINATOR.len() as u64;
        if block_len > u64::from(u32::MAX) {
            return Err(AtlasError::CapacityExceeded {
                file: "data",
                required: block_len,
                capacity: self.data.capacity(),
            });
        }
        self.data
            .ensure_room(u64::from(self.header.data_tail) + block_len)?;
        self.index
            .ensure_room(u64::from(self.header.index_tail) + u64::from(RECORD_LEN))
    }

    /// Append a block and its index slot at the tails; returns the slot offset
    ///
    /// Callers check room first.
    fn append(
        &mut self,
        key: Key,
        type_tag: &str,
        payload: &[u8],
        state: RecordState,
    ) -> Result<u32> {
        let block_len = (payload.len() + TERMINATOR.len()) as u32;
        let data_offset = self.header.data_tail;
        let index_offset = self.header.index_tail;

        let mut block = Vec::with_capacity(block_len as usize);
        block.extend_from_slice(payload);
        block.extend_from_slice(TERMINATOR);
        self.data.write(u64::from(data_offset), &block)?;

        let record = IndexRecord::new(state, data_offset, block_len, key, type_tag)?;
        self.index.write(u64::from(index_offset), &record.encode())?;

        self.header.index_tail += RECORD_LEN;
        self.header.data_tail += block_len;
        self.write_header()?;

        self.cache.insert(key, index_offset);
        Ok(index_offset)
    }

    fn write_header(&mut self) -> Result<()> {
        self.index.write(0, &self.header.encode())
    }

    /// Apply the sync strategy after a mutation
    fn after_write(&mut self) -> Result<()> {
        self.unsynced_writes += 1;
        let due = match self.config.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNWrites { count } => self.unsynced_writes >= count,
            SyncStrategy::OnClose => false,
        };
        if due {
            self.sync()?;
        }
        Ok(())
    }

    /// Flush both mappings to disk
    pub fn sync(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.index.flush()?;
        self.data.flush()?;
        self.unsynced_writes = 0;
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the current header
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the number of slots in use
    pub fn slot_count(&self) -> u32 {
        self.view().slot_count()
    }

    /// Get the number of cached key offsets
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Get the cached index offset for `key`, if any
    pub fn cached_offset(&self, key: Key) -> Option<u32> {
        self.cache.get(key)
    }

    /// Every slot in use with its index offset
    pub fn index_records(&self) -> Result<Vec<(u32, IndexRecord)>> {
        self.ensure_open()?;
        let view = self.view();
        (1..=view.slot_count())
            .map(|slot| Ok((slot_offset(slot), view.load_slot(slot)?)))
            .collect()
    }

    /// Count slots per state and report file usage
    pub fn stats(&self) -> Result<StoreStats> {
        let mut stats = StoreStats {
            slots: self.slot_count(),
            last_key: self.header.last_key,
            index_used: u64::from(self.header.index_tail),
            index_capacity: self.header.index_capacity(),
            data_used: u64::from(self.header.data_tail),
            data_capacity: self.header.data_capacity(),
            ..StoreStats::default()
        };
        for (_, record) in self.index_records()? {
            stats.count(record.state);
        }
        Ok(stats)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(
                index = %self.config.index_path.display(),
                error = %e,
                "failed to close store on drop"
            );
        }
    }
}
