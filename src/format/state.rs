//! Index record states

use std::fmt;

use crate::error::{AtlasError, Result};

/// Lifecycle tag stored in the first byte of every index record
///
/// ```text
///   Ok ──(oversized update)──► Head ──► ... ──► Tail
///   Tail ──(oversized update)──► Linked ──► ... ──► Tail
///   any ──(delete)──► Deleted
///   Ok/Tail ──(compress)──► Copied
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordState {
    /// Live record occupying a single slot
    Ok = 0,
    /// Superseded original slot pointing at its replacement
    Head = 1,
    /// Superseded intermediate link of a replacement chain
    Linked = 2,
    /// Terminal record of a replacement chain
    Tail = 3,
    /// Tombstoned record
    Deleted = 4,
    /// Already migrated by compaction
    Copied = 5,
}

impl RecordState {
    /// Record holds the authoritative payload for its key
    pub fn is_live(self) -> bool {
        matches!(self, RecordState::Ok | RecordState::Tail)
    }

    /// Record's offset field points at another index slot
    pub fn is_link(self) -> bool {
        matches!(self, RecordState::Head | RecordState::Linked)
    }

    /// Record's key reflects its position among its neighbours
    pub fn is_ordered(self) -> bool {
        matches!(self, RecordState::Ok | RecordState::Head)
    }

    pub fn as_digit(self) -> u8 {
        b'0' + self as u8
    }
}

impl TryFrom<u8> for RecordState {
    type Error = AtlasError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(RecordState::Ok),
            1 => Ok(RecordState::Head),
            2 => Ok(RecordState::Linked),
            3 => Ok(RecordState::Tail),
            4 => Ok(RecordState::Deleted),
            5 => Ok(RecordState::Copied),
            other => Err(AtlasError::MalformedLayout(format!(
                "unknown record state: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordState::Ok => "ok",
            RecordState::Head => "head",
            RecordState::Linked => "linked",
            RecordState::Tail => "tail",
            RecordState::Deleted => "deleted",
            RecordState::Copied => "copied",
        };
        f.write_str(name)
    }
}
