//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
///
/// The infallible [`Store`](crate::Store) API logs these and degrades to
/// "absent" / no-op; the `try_*` variants surface them.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored record could not be decoded.
    #[error("corrupt record: {0}")]
    Codec(#[from] linkstore_codec::CodecError),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The store could not be opened; reads are empty and writes are dropped.
    #[error("store unavailable")]
    Unavailable,

    /// No app-scoped directory could be resolved for the store file.
    #[error("no storage directory could be resolved")]
    NoDirectory,

    /// The registry has no schema for this collection.
    #[error("collection not registered: {0}")]
    Unregistered(String),

    /// A thread panicked while holding a connection.
    #[error("connection lock poisoned")]
    LockPoisoned,
}
