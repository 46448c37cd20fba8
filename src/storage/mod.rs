//! Storage Module
//!
//! Memory-mapped backing files and the slot search over the index file.
//!
//! ## Responsibilities
//! - Reserve and map each file at its full page-aligned capacity
//! - Bounds-checked reads and writes into the mappings
//! - Truncate files back to their used length on close
//! - Resolve keys to index slots (binary search over a tombstoned array)
//! - Follow link chains to the authoritative record
//!
//! ## Layout
//! ```text
//!   index file                               data file
//!  ┌────────────┐
//!  │ header     │
//!  ├────────────┤   offset/length   ┌──────────────────────────┐
//!  │ slot 1 Ok  │ ────────────────► │ block 1                  │
//!  ├────────────┤                   ├──────────────────────────┤
//!  │ slot 2 Head│ ──┐               │ block 2 (superseded)     │
//!  ├────────────┤   │ index offset  ├──────────────────────────┤
//!  │ slot 3 Tail│ ◄─┘ ────────────► │ block 3                  │
//!  └────────────┘                   └──────────────────────────┘
//! ```

mod mapped;
pub mod search;

pub use mapped::MappedFile;
pub use search::SlotSource;
