//! Core type definitions for the linked-entity store.
//!
//! This crate defines the small, storage-agnostic types shared by every
//! other crate in the workspace:
//! - [`CollectionType`]: the closed set of entity kinds, doubling as the
//!   store's partition keys and the decoder lookup key
//! - [`EntityKey`]: the `(collection, id)` pair identifying a stored entity
//! - [`Version`]: the schema revision number embedded in every record

mod collection;
mod key;

pub use collection::CollectionType;
pub use key::{EntityKey, Version};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("invalid version: {0}")]
    InvalidVersion(u32),
}
