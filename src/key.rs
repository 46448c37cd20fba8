//! Record keys
//!
//! Keys are issued by the engine in strictly increasing order starting at 1.
//! Zero is reserved as the "empty" key and never identifies a record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AtlasError, Result};

/// A 32-bit record identifier with checked arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(u32);

impl Key {
    /// The reserved "unset" key
    pub const EMPTY: Key = Key(0);

    /// The largest representable key
    pub const MAX: Key = Key(u32::MAX);

    pub const fn new(value: u32) -> Self {
        Key(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `self + n`, failing instead of wrapping past `u32::MAX`
    pub fn checked_add(self, n: u32) -> Result<Key> {
        self.0.checked_add(n).map(Key).ok_or(AtlasError::KeyOverflow {
            key: self.0,
            increment: n,
        })
    }

    /// `self - n`, failing unless the result stays above zero
    pub fn checked_sub(self, n: u32) -> Result<Key> {
        if n >= self.0 {
            return Err(AtlasError::KeyUnderflow {
                key: self.0,
                decrement: n,
            });
        }
        Ok(Key(self.0 - n))
    }

    /// The key issued after this one
    pub fn next(self) -> Result<Key> {
        self.checked_add(1)
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Key(value)
    }
}

impl From<Key> for u32 {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
