//! Error types for atlasrec
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::key::Key;

/// Result type alias using AtlasError
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Unified error type for atlasrec operations
#[derive(Debug, Error)]
pub enum AtlasError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Key Errors
    // -------------------------------------------------------------------------
    #[error("Key overflow: cannot add {increment} to key {key}, result must be <= {}", u32::MAX)]
    KeyOverflow { key: u32, increment: u32 },

    #[error("Key underflow: cannot subtract {decrement} from key {key}, result must be > 0")]
    KeyUnderflow { key: u32, decrement: u32 },

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Key not found: {0}")]
    NotFound(Key),

    #[error("Cannot update deleted record for key {0}")]
    RecordDeleted(Key),

    #[error("Type mismatch for key {key}: update type '{given}' not same as stored type '{stored}'")]
    TypeMismatch {
        key: Key,
        stored: String,
        given: String,
    },

    #[error("Invalid type tag: {0}")]
    InvalidTypeTag(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Malformed layout: {0}")]
    MalformedLayout(String),

    #[error("{file} file full: {required} bytes required, capacity is {capacity}")]
    CapacityExceeded {
        file: &'static str,
        required: u64,
        capacity: u64,
    },

    #[error("Engine is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cannot resolve type tag '{0}' to a record type")]
    TypeResolution(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for AtlasError {
    fn from(err: serde_json::Error) -> Self {
        AtlasError::Serialization(err.to_string())
    }
}
