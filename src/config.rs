//! Configuration for atlasrec
//!
//! Centralized configuration with sensible defaults.

use std::path::{Path, PathBuf};

use crate::cache::DEFAULT_WINDOW;
use crate::error::{AtlasError, Result};

/// Main configuration for an atlasrec store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // File Configuration
    // -------------------------------------------------------------------------
    /// Fixed-width index file (header + slots)
    pub index_path: PathBuf,

    /// Variable-length payload file
    pub data_path: PathBuf,

    /// Lookup cache snapshot, rewritten on close
    pub cache_path: PathBuf,

    // -------------------------------------------------------------------------
    // Capacity Configuration
    // -------------------------------------------------------------------------
    /// Data file reservation in 4 KiB pages (used by `Engine::create` only;
    /// an existing store takes its page counts from the header)
    pub data_page_count: u16,

    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    /// Keys held by the lookup cache; 0 disables it
    pub cache_window: usize,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to flush the mappings
    pub sync_strategy: SyncStrategy,
}

/// Mapping flush strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Flush both mappings after every mutation (safest, slowest)
    EveryWrite,

    /// Flush after N mutations (balanced durability/performance)
    EveryNWrites { count: usize },

    /// Flush only when the engine closes
    OnClose,
}

impl Config {
    // =========================================================================
    // Default File Names
    // =========================================================================
    pub const INDEX_FILENAME: &'static str = "index.dat";
    pub const DATA_FILENAME: &'static str = "data.dat";
    pub const CACHE_FILENAME: &'static str = "cache.json";

    /// Default data reservation: 256 pages (1 MiB), 4 index pages
    pub const DEFAULT_DATA_PAGES: u16 = 256;

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Config with the three store files inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::builder().data_dir(dir).build()
    }

    /// Reject settings that cannot describe a store
    pub fn validate(&self) -> Result<()> {
        if self.data_page_count == 0 {
            return Err(AtlasError::Config(
                "data_page_count must be at least 1".to_string(),
            ));
        }
        if let SyncStrategy::EveryNWrites { count: 0 } = self.sync_strategy {
            return Err(AtlasError::Config(
                "EveryNWrites count must be at least 1".to_string(),
            ));
        }
        if self.index_path == self.data_path {
            return Err(AtlasError::Config(
                "index and data files must be distinct".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        let dir = PathBuf::from("./atlasrec_data");
        Self {
            index_path: dir.join(Self::INDEX_FILENAME),
            data_path: dir.join(Self::DATA_FILENAME),
            cache_path: dir.join(Self::CACHE_FILENAME),
            data_page_count: Self::DEFAULT_DATA_PAGES,
            cache_window: DEFAULT_WINDOW,
            sync_strategy: SyncStrategy::OnClose,
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Place all three store files in `dir` under their default names
    pub fn data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.config.index_path = dir.join(Config::INDEX_FILENAME);
        self.config.data_path = dir.join(Config::DATA_FILENAME);
        self.config.cache_path = dir.join(Config::CACHE_FILENAME);
        self
    }

    /// Set the index file path
    pub fn index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.index_path = path.into();
        self
    }

    /// Set the data file path
    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_path = path.into();
        self
    }

    /// Set the cache snapshot path
    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_path = path.into();
        self
    }

    /// Set the data file reservation (in 4 KiB pages)
    pub fn data_page_count(mut self, pages: u16) -> Self {
        self.config.data_page_count = pages;
        self
    }

    /// Set the lookup cache window
    pub fn cache_window(mut self, keys: usize) -> Self {
        self.config.cache_window = keys;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
