//! Memory-mapped backing file
//!
//! Each store file is mapped read/write at its full reserved capacity. The
//! file on disk is only as long as its used tail between sessions; opening
//! extends it back to the reservation before mapping.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::{MmapMut, MmapOptions};

use crate::error::{AtlasError, Result};

/// One read/write mapping over a store file
pub struct MappedFile {
    /// Location on disk
    path: PathBuf,
    /// "index" or "data", for error reporting
    name: &'static str,
    /// Open handle, kept for truncation on close
    file: File,
    /// Mapping over the full reservation; `None` once closed
    map: Option<MmapMut>,
    /// Reserved length in bytes
    capacity: u64,
}

impl MappedFile {
    /// Create (or recreate) a file preallocated to `capacity` bytes
    pub fn preallocate(path: &Path, capacity: u64) -> Result<File> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(capacity)?;
        Ok(file)
    }

    /// Open an existing file and map `capacity` bytes of it
    pub fn open(path: &Path, name: &'static str, capacity: u64) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        let len = file.metadata()?.len();
        if len < capacity {
            file.set_len(capacity)?;
        }

        let map_len = usize::try_from(capacity).map_err(|_| {
            AtlasError::Config(format!("{} file capacity {} exceeds address space", name, capacity))
        })?;

        // SAFETY: the engine owns this file exclusively for the mapping's
        // lifetime; other handles on the same file are unsupported.
        let map = unsafe { MmapOptions::new().len(map_len).map_mut(&file)? };

        Ok(Self {
            path: path.to_path_buf(),
            name,
            file,
            map: Some(map),
            capacity,
        })
    }

    /// Borrow `len` bytes starting at `offset`
    pub fn read(&self, offset: u64, len: usize) -> Result<&[u8]> {
        let map = self.map.as_ref().ok_or(AtlasError::Closed)?;
        let end = offset + len as u64;
        if end > self.capacity {
            return Err(AtlasError::MalformedLayout(format!(
                "read of {} bytes at {} runs past the {} file reservation ({} bytes)",
                len, offset, self.name, self.capacity
            )));
        }
        Ok(&map[offset as usize..end as usize])
    }

    /// Copy `bytes` into the mapping at `offset`
    pub fn write(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        let end = offset + bytes.len() as u64;
        self.ensure_room(end)?;
        let map = self.map.as_mut().ok_or(AtlasError::Closed)?;
        map[offset as usize..end as usize].copy_from_slice(bytes);
        Ok(())
    }

    /// Fail with `CapacityExceeded` unless `end` fits the reservation
    pub fn ensure_room(&self, end: u64) -> Result<()> {
        if end > self.capacity {
            return Err(AtlasError::CapacityExceeded {
                file: self.name,
                required: end,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Flush dirty pages to disk
    pub fn flush(&self) -> Result<()> {
        if let Some(map) = &self.map {
            map.flush()?;
        }
        Ok(())
    }

    /// Flush and unmap, then truncate the file to `used` bytes
    ///
    /// Safe to call more than once; later calls only re-truncate.
    pub fn close(&mut self, used: u64) -> Result<()> {
        if let Some(map) = self.map.take() {
            map.flush()?;
            drop(map);
        }
        self.file.set_len(used)?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Flush and unmap without touching the file length
    pub fn release(&mut self) -> Result<()> {
        if let Some(map) = self.map.take() {
            map.flush()?;
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.map.is_some()
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
