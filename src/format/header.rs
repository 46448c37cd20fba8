//! Index file header

use crate::error::Result;
use crate::key::Key;

use super::fields::{expect_byte, expect_len, expect_terminator, get_u16, get_u32, put_decimal};
use super::PAGE_SIZE;

/// Superblock at offset 0 of the index file
///
/// The engine keeps one copy in memory and writes it back through the index
/// mapping whenever a tail or the last key moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Pages reserved for the index file
    pub index_max_pages: u16,
    /// Pages reserved for the data file
    pub data_max_pages: u16,
    /// Next free byte in the index file (absolute)
    pub index_tail: u32,
    /// Next free byte in the data file
    pub data_tail: u32,
    /// Most recently issued key
    pub last_key: Key,
}

impl FileHeader {
    /// `00000,00000,0000000000,0000000000,0000000000\r\n`
    pub const ENCODED_LEN: usize = 5 + 1 + 5 + 1 + 10 + 1 + 10 + 1 + 10 + 2;

    /// Header of a freshly created store
    pub fn new(index_max_pages: u16, data_max_pages: u16) -> Self {
        Self {
            index_max_pages,
            data_max_pages,
            index_tail: Self::ENCODED_LEN as u32,
            data_tail: 0,
            last_key: Key::EMPTY,
        }
    }

    /// Reserved size of the index file in bytes
    pub fn index_capacity(&self) -> u64 {
        PAGE_SIZE * u64::from(self.index_max_pages)
    }

    /// Reserved size of the data file in bytes
    pub fn data_capacity(&self) -> u64 {
        PAGE_SIZE * u64::from(self.data_max_pages)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_LEN);
        put_decimal(&mut out, u64::from(self.index_max_pages), 5);
        out.push(b',');
        put_decimal(&mut out, u64::from(self.data_max_pages), 5);
        out.push(b',');
        put_decimal(&mut out, u64::from(self.index_tail), 10);
        out.push(b',');
        put_decimal(&mut out, u64::from(self.data_tail), 10);
        out.push(b',');
        put_decimal(&mut out, u64::from(self.last_key.value()), 10);
        out.extend_from_slice(super::TERMINATOR);
        out
    }

    /// Decode the header from the first `ENCODED_LEN` bytes of `bytes`
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        const WHAT: &str = "file header";
        expect_len(bytes, Self::ENCODED_LEN, WHAT)?;

        for pos in [5, 11, 22, 33] {
            expect_byte(bytes, pos, b',', WHAT)?;
        }
        expect_terminator(bytes, Self::ENCODED_LEN, WHAT)?;

        Ok(Self {
            index_max_pages: get_u16(bytes, 0..5, "index_max_pages")?,
            data_max_pages: get_u16(bytes, 6..11, "data_max_pages")?,
            index_tail: get_u32(bytes, 12..22, "index_tail")?,
            data_tail: get_u32(bytes, 23..33, "data_tail")?,
            last_key: Key::new(get_u32(bytes, 34..44, "last_key")?),
        })
    }
}
