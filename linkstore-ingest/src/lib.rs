//! Ingestion pipeline for linked API payloads.
//!
//! A payload maps wire collection names to arrays of raw resource objects.
//! [`Ingestor::parse_linked`] decodes every object through the collection
//! registry and upserts the results into a [`Store`](linkstore_storage::Store)
//! as one write transaction, so readers see the whole batch at once.
//!
//! Failures are per record: unknown collections and objects without an
//! `id` are counted in the [`IngestReport`] and skipped, never fatal.

mod config;
mod error;
mod ingestor;
mod payload;

pub use config::{IngestConfig, IngestMode};
pub use error::IngestError;
pub use ingestor::{IngestReport, Ingestor};
pub use payload::{LINKED_SECTION, LinkedPayload};
