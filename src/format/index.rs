//! Index records

use crate::error::{AtlasError, Result};
use crate::key::Key;

use super::fields::{expect_byte, expect_len, expect_terminator, get_u32, put_decimal};
use super::RecordState;

/// Width of the type tag field
pub const MAX_TYPE_TAG_LEN: usize = 30;

/// One fixed-width slot of the index file
///
/// For `Ok`/`Tail`/`Deleted`/`Copied` records `offset` is the start of the
/// payload block in the data file. For `Head`/`Linked` records it is the index
/// file offset of the next record in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub state: RecordState,
    pub offset: u32,
    /// Block length in the data file, terminator included
    pub length: u32,
    pub key: Key,
    /// Payload type name, without padding
    pub type_tag: String,
}

impl IndexRecord {
    /// `0,0000000000,0000000000,0000000000,<30 byte tag>\r\n`
    pub const ENCODED_LEN: usize = 1 + 1 + 10 + 1 + 10 + 1 + 10 + 1 + MAX_TYPE_TAG_LEN + 2;

    /// Build a record, validating the type tag
    pub fn new(
        state: RecordState,
        offset: u32,
        length: u32,
        key: Key,
        type_tag: &str,
    ) -> Result<Self> {
        validate_type_tag(type_tag)?;
        Ok(Self {
            state,
            offset,
            length,
            key,
            type_tag: type_tag.to_string(),
        })
    }

    /// Copy of this record with a different state
    pub fn with_state(&self, state: RecordState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_LEN);
        out.push(self.state.as_digit());
        out.push(b',');
        put_decimal(&mut out, u64::from(self.offset), 10);
        out.push(b',');
        put_decimal(&mut out, u64::from(self.length), 10);
        out.push(b',');
        put_decimal(&mut out, u64::from(self.key.value()), 10);
        out.push(b',');
        out.extend_from_slice(self.type_tag.as_bytes());
        out.resize(Self::ENCODED_LEN - 2, b' ');
        out.extend_from_slice(super::TERMINATOR);
        out
    }

    /// Decode one record from the first `ENCODED_LEN` bytes of `bytes`
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        const WHAT: &str = "index record";
        expect_len(bytes, Self::ENCODED_LEN, WHAT)?;

        for pos in [1, 12, 23, 34] {
            expect_byte(bytes, pos, b',', WHAT)?;
        }
        expect_terminator(bytes, Self::ENCODED_LEN, WHAT)?;

        let digit = bytes[0];
        if !digit.is_ascii_digit() {
            return Err(AtlasError::MalformedLayout(format!(
                "record state is not a digit: {:?}",
                digit as char
            )));
        }
        let state = RecordState::try_from(digit - b'0')?;

        let tag_field = &bytes[35..35 + MAX_TYPE_TAG_LEN];
        let type_tag = std::str::from_utf8(tag_field)
            .map_err(|_| AtlasError::MalformedLayout("type tag is not ASCII".to_string()))?
            .trim_end_matches(' ')
            .to_string();

        Ok(Self {
            state,
            offset: get_u32(bytes, 2..12, "offset")?,
            length: get_u32(bytes, 13..23, "length")?,
            key: Key::new(get_u32(bytes, 24..34, "key")?),
            type_tag,
        })
    }
}

/// Type tags are stored in a fixed 30-byte ASCII field
pub fn validate_type_tag(tag: &str) -> Result<()> {
    if tag.is_empty() {
        return Err(AtlasError::InvalidTypeTag("type tag is empty".to_string()));
    }
    if tag.len() > MAX_TYPE_TAG_LEN {
        return Err(AtlasError::InvalidTypeTag(format!(
            "'{}' is longer than {} bytes",
            tag, MAX_TYPE_TAG_LEN
        )));
    }
    if !tag.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(AtlasError::InvalidTypeTag(format!(
            "'{}' must be printable ASCII without spaces",
            tag
        )));
    }
    Ok(())
}
