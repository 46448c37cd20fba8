//! Slot search
//!
//! Keys are issued in increasing order and every record is appended, so the
//! `Ok` and `Head` slots of an index file form a sorted sequence. The other
//! states break that order: a `Tail` carries an older key than its
//! neighbours, and `Linked`/`Deleted`/`Copied` slots may have been either. The
//! search therefore only compares keys at `Ok`/`Head` slots and, on landing
//! anywhere else, searches the left part before continuing to the right.
//!
//! Both functions are written against [`SlotSource`] so they can be exercised
//! without any files.

use crate::error::{AtlasError, Result};
use crate::format::{offset_slot, IndexRecord};
use crate::key::Key;

/// Random access to index slots, numbered from 1
pub trait SlotSource {
    /// Number of slots in use
    fn slot_count(&self) -> u32;

    /// Load the record in `slot` (1-based)
    fn load_slot(&self, slot: u32) -> Result<IndexRecord>;
}

impl SlotSource for [IndexRecord] {
    fn slot_count(&self) -> u32 {
        self.len() as u32
    }

    fn load_slot(&self, slot: u32) -> Result<IndexRecord> {
        self.get(slot as usize - 1).cloned().ok_or_else(|| {
            AtlasError::MalformedLayout(format!("slot {} out of range", slot))
        })
    }
}

/// Find the slot whose ordered record carries `key`
pub fn find_slot<S: SlotSource + ?Sized>(source: &S, key: Key) -> Result<Option<u32>> {
    let count = source.slot_count();
    if count == 0 || key.is_empty() {
        return Ok(None);
    }
    search_range(source, key, 1, count)
}

fn search_range<S: SlotSource + ?Sized>(
    source: &S,
    key: Key,
    mut lower: u32,
    mut upper: u32,
) -> Result<Option<u32>> {
    while lower <= upper {
        let middle = lower + (upper - lower) / 2;
        let record = source.load_slot(middle)?;

        if record.state.is_ordered() {
            if record.key == key {
                return Ok(Some(middle));
            }
            if lower == upper {
                return Ok(None);
            }
            if key < record.key {
                // middle >= lower >= 1, so this cannot wrap
                upper = middle - 1;
            } else {
                lower = middle + 1;
            }
            continue;
        }

        // Unordered slot: it cannot be the hit itself, so look left of it
        // first and then carry on to its right.
        if middle > lower {
            if let Some(slot) = search_range(source, key, lower, middle - 1)? {
                return Ok(Some(slot));
            }
        }
        lower = middle + 1;
    }
    Ok(None)
}

/// Follow `Head`/`Linked` pointers from `slot` to the terminal record
///
/// Returns the terminal slot and its record. A chain longer than the number
/// of slots must revisit a slot, and is reported as a malformed layout.
pub fn resolve_chain<S: SlotSource + ?Sized>(source: &S, slot: u32) -> Result<(u32, IndexRecord)> {
    let count = source.slot_count();
    let mut current = slot;
    let mut record = source.load_slot(current)?;
    let mut hops = 0u32;

    while record.state.is_link() {
        hops += 1;
        if hops > count {
            return Err(AtlasError::MalformedLayout(format!(
                "link chain starting at slot {} does not terminate",
                slot
            )));
        }

        current = match offset_slot(record.offset) {
            Some(next) if next <= count => next,
            _ => {
                return Err(AtlasError::MalformedLayout(format!(
                    "slot {} links to invalid index offset {}",
                    current, record.offset
                )))
            }
        };
        record = source.load_slot(current)?;
    }

    Ok((current, record))
}

// =============================================================================
// Tests
// =============================================================================
