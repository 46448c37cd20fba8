//! Fixed-width field helpers
//!
//! Every numeric field is zero-padded ASCII decimal of a known width. The
//! parsers work on exact byte ranges so a damaged separator or a short buffer
//! is reported instead of silently shifting the remaining fields.

use std::ops::Range;

use crate::error::{AtlasError, Result};

/// Append `value` as exactly `width` zero-padded decimal digits
pub(super) fn put_decimal(out: &mut Vec<u8>, value: u64, width: usize) {
    let digits = format!("{:0width$}", value, width = width);
    debug_assert_eq!(digits.len(), width, "value {} exceeds field width {}", value, width);
    out.extend_from_slice(digits.as_bytes());
}

/// Parse the decimal field at `range`, rejecting anything but ASCII digits
pub(super) fn get_decimal(bytes: &[u8], range: Range<usize>, field: &str) -> Result<u64> {
    let raw = &bytes[range];
    if raw.is_empty() || !raw.iter().all(u8::is_ascii_digit) {
        return Err(AtlasError::MalformedLayout(format!(
            "field '{}' is not a decimal number: {:?}",
            field,
            String::from_utf8_lossy(raw)
        )));
    }
    Ok(raw
        .iter()
        .fold(0u64, |acc, digit| acc * 10 + u64::from(digit - b'0')))
}

pub(super) fn get_u16(bytes: &[u8], range: Range<usize>, field: &str) -> Result<u16> {
    let value = get_decimal(bytes, range, field)?;
    u16::try_from(value).map_err(|_| {
        AtlasError::MalformedLayout(format!("field '{}' out of range: {}", field, value))
    })
}

pub(super) fn get_u32(bytes: &[u8], range: Range<usize>, field: &str) -> Result<u32> {
    let value = get_decimal(bytes, range, field)?;
    u32::try_from(value).map_err(|_| {
        AtlasError::MalformedLayout(format!("field '{}' out of range: {}", field, value))
    })
}

/// Check the separator byte at `pos`
pub(super) fn expect_byte(bytes: &[u8], pos: usize, expected: u8, what: &str) -> Result<()> {
    if bytes[pos] != expected {
        return Err(AtlasError::MalformedLayout(format!(
            "{}: expected {:?} at byte {}, found {:?}",
            what, expected as char, pos, bytes[pos] as char
        )));
    }
    Ok(())
}

/// Check the `\r\n` terminator ending at `end`
pub(super) fn expect_terminator(bytes: &[u8], end: usize, what: &str) -> Result<()> {
    if &bytes[end - 2..end] != super::TERMINATOR {
        return Err(AtlasError::MalformedLayout(format!(
            "{}: missing line terminator",
            what
        )));
    }
    Ok(())
}

/// Reject buffers shorter than one encoded line
pub(super) fn expect_len(bytes: &[u8], len: usize, what: &str) -> Result<()> {
    if bytes.len() < len {
        return Err(AtlasError::MalformedLayout(format!(
            "{} truncated: expected {} bytes, got {}",
            what,
            len,
            bytes.len()
        )));
    }
    Ok(())
}
