//! SQLite storage layer for linked entities.
//!
//! Provides the persistent `(collection, id)` keyed store that every
//! decoded API resource is written through.
//!
//! # Architecture
//!
//! - One SQLite file per store name; records are rows keyed by
//!   `(collection, id)` holding the binary record from `linkstore-codec`
//! - Exactly one [`WriteHandle`] per store, serializing every write; each
//!   upsert merges with the stored record under the kind's schema
//! - Any number of [`ReadHandle`]s, each with its own connection and a
//!   bounded LRU of decoded entities
//! - If the store cannot be opened it runs degraded: reads are empty and
//!   writes are dropped, since the store is a cache and not the source of
//!   truth

mod config;
mod db;
mod error;
mod reader;
mod store;
mod writer;

pub use config::{DEFAULT_READER_CACHE, DEFAULT_STORE_NAME, StoreConfig, default_directory};
pub use error::{StorageError, StorageResult};
pub use reader::{ReadHandle, ReadView};
pub use store::Store;
pub use writer::{WriteHandle, WriteOutcome, WriteTxn};
