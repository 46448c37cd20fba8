//! On-disk Format Module
//!
//! Fixed-width ASCII layout shared by the index and data files.
//!
//! ## Index File
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Header (46 bytes)                                                │
//! │   IndexPages(5),DataPages(5),IndexTail(10),DataTail(10),         │
//! │   LastKey(10)\r\n                                                │
//! ├──────────────────────────────────────────────────────────────────┤
//! │ Slot 1 (67 bytes)                                                │
//! │   State(1),Offset(10),Length(10),Key(10),TypeTag(30)\r\n         │
//! ├──────────────────────────────────────────────────────────────────┤
//! │ Slot 2 ... repeated up to IndexTail                              │
//! ├──────────────────────────────────────────────────────────────────┤
//! │ Reserved (unused until IndexTail advances)                       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data File
//! ```text
//! ┌──────────────────────────────┬─────────────┬──────┐
//! │ Payload                      │ Pad (' ')*  │ \r\n │  ← block at IndexRecord.offset
//! └──────────────────────────────┴─────────────┴──────┘
//! ```
//! Block length (IndexRecord.length) includes the terminator. Padding only
//! appears after an in-place update with a shorter payload.

mod fields;
mod header;
mod index;
mod state;

pub use header::FileHeader;
pub use index::{validate_type_tag, IndexRecord, MAX_TYPE_TAG_LEN};
pub use state::RecordState;

// =============================================================================
// Shared Constants
// =============================================================================

/// Reservation granularity for both files
pub const PAGE_SIZE: u64 = 4096;

/// Line terminator closing every header, index record and data block
pub const TERMINATOR: &[u8; 2] = b"\r\n";

/// Data pages covered by one index page
pub const DATA_PAGES_PER_INDEX_PAGE: u16 = 64;

/// Encoded header length in bytes
pub const HEADER_LEN: u32 = FileHeader::ENCODED_LEN as u32;

/// Encoded index record length in bytes
pub const RECORD_LEN: u32 = IndexRecord::ENCODED_LEN as u32;

/// Byte offset of a 1-based slot in the index file
pub fn slot_offset(slot: u32) -> u32 {
    HEADER_LEN + (slot - 1) * RECORD_LEN
}

/// 1-based slot at an index file offset, if the offset is slot-aligned
pub fn offset_slot(offset: u32) -> Option<u32> {
    if offset < HEADER_LEN || (offset - HEADER_LEN) % RECORD_LEN != 0 {
        return None;
    }
    Some((offset - HEADER_LEN) / RECORD_LEN + 1)
}

/// Number of index pages reserved for a data file of `data_pages`
pub fn index_pages_for(data_pages: u16) -> u16 {
    data_pages.div_ceil(DATA_PAGES_PER_INDEX_PAGE)
}
