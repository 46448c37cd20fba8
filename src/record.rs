//! Record serialization contract
//!
//! The engine stores opaque payload bytes next to a type tag. Turning a value
//! into bytes and back is the caller's business, expressed through [`Record`].
//! A single struct implements it with a constant tag; a closed set of record
//! shapes is an enum whose `decode` dispatches on the tag:
//!
//! ```
//! use atlasrec::record::{self, Record};
//! use atlasrec::{AtlasError, Result};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Person { name: String, age: u32 }
//!
//! #[derive(Serialize, Deserialize)]
//! struct Invoice { total: u64 }
//!
//! enum Entry { Person(Person), Invoice(Invoice) }
//!
//! impl Record for Entry {
//!     fn type_tag(&self) -> &str {
//!         match self {
//!             Entry::Person(_) => "Person",
//!             Entry::Invoice(_) => "Invoice",
//!         }
//!     }
//!
//!     fn encode(&self) -> Result<Vec<u8>> {
//!         match self {
//!             Entry::Person(p) => record::to_json(p),
//!             Entry::Invoice(i) => record::to_json(i),
//!         }
//!     }
//!
//!     fn decode(type_tag: &str, payload: &[u8]) -> Result<Self> {
//!         match type_tag {
//!             "Person" => Ok(Entry::Person(record::from_json(payload)?)),
//!             "Invoice" => Ok(Entry::Invoice(record::from_json(payload)?)),
//!             other => Err(AtlasError::TypeResolution(other.to_string())),
//!         }
//!     }
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::key::Key;

/// A value the engine can store and load
pub trait Record: Sized {
    /// Name stored with the payload; at most 30 printable ASCII bytes
    ///
    /// Updates must keep the tag the record was added with.
    fn type_tag(&self) -> &str;

    /// Serialize the payload
    fn encode(&self) -> Result<Vec<u8>>;

    /// Rebuild a value from a stored payload
    ///
    /// Fails with `AtlasError::TypeResolution` for tags this type does not
    /// know.
    fn decode(type_tag: &str, payload: &[u8]) -> Result<Self>;
}

/// A payload as it sits in the store, before decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub key: Key,
    pub type_tag: String,
    /// Payload bytes without terminator or padding
    pub payload: Vec<u8>,
}

impl StoredRecord {
    /// Decode into a concrete record type
    pub fn decode<R: Record>(&self) -> Result<R> {
        R::decode(&self.type_tag, &self.payload)
    }
}

/// Serialize `value` as compact JSON
pub fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserialize JSON produced by [`to_json`]
pub fn from_json<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(payload)?)
}
