//! # atlasrec
//!
//! An embedded record store backed by two memory-mapped files:
//! - Monotonically increasing numeric keys
//! - Fixed-width index with binary search over tombstoned slots
//! - Linked records for updates that outgrow their slot
//! - Offline compaction into fresh files
//! - FIFO lookup cache persisted between sessions
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                               │
//! │        fetch / add / update / delete / compress / close      │
//! └──────────┬──────────────────────┬───────────────────────────┘
//!            │ key                  │ payload
//!            ▼                      │
//!   ┌─────────────────┐             │
//!   │  LookupCache    │── miss ──┐  │
//!   │  (FIFO window)  │          │  │
//!   └────────┬────────┘          ▼  │
//!            │ hit       ┌─────────────────┐
//!            │           │  Slot search    │
//!            │           │ (binary search) │
//!            │           └────────┬────────┘
//!            ▼                    ▼  ▼
//!   ┌──────────────────────┐   ┌──────────────────────┐
//!   │     Index file       │──►│      Data file       │
//!   │ header + fixed slots │   │  \r\n-ended blocks   │
//!   │      (mmap)          │   │       (mmap)         │
//!   └──────────────────────┘   └──────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod key;

pub mod format;
pub mod cache;
pub mod storage;
pub mod record;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{AtlasError, Result};
pub use config::{Config, SyncStrategy};
pub use engine::{CompactionStats, Engine, StoreStats};
pub use format::{FileHeader, IndexRecord, RecordState};
pub use key::Key;
pub use record::{Record, StoredRecord};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of atlasrec
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
