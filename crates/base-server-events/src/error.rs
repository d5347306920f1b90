//! Error types for the storage layer.
//!
//! [`StorageError`] is only ever seen by [`crate::store::EventStore`] and by
//! custom [`crate::storage::UnitStorage`] implementations. The store absorbs
//! every variant at its boundary, so callers of `append` and `query_recent`
//! never observe one.

/// Errors that can occur while reading or writing persisted units.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A file-system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A unit with the same key already exists.
    #[error("unit already exists: {0}")]
    AlreadyExists(String),

    /// The requested unit does not exist.
    #[error("unit not found: {0}")]
    NotFound(String),

    /// An event could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The in-memory backend's lock was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    Poisoned,
}
