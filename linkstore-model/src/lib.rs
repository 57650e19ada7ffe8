//! Entity model for the linked-entity store.
//!
//! Defines the types every other subsystem depends on:
//! - [`Entity`]: the generic versioned record (id, collection, fields, links)
//! - [`LinkDescriptor`]: a to-one or to-many relation by id, never an embedded copy
//! - [`EntitySchema`]: a per-kind field table declaring when each field was
//!   introduced, its default, and whether it survives sparse payloads on merge
//! - [`merge`]: the single generic merge routine driven by those tables
//! - [`Registry`]: the collection registry binding each [`CollectionType`]
//!   to its schema and JSON decoder
//! - [`EntitySource`]: the read seam used for lazy link resolution
//!
//! Concrete kinds (users, posts, comments, ...) are declared in [`kinds`] as
//! schema tables; they carry no code of their own beyond optional decoder
//! post-processing.

mod decode;
mod entity;
pub mod kinds;
mod link;
mod merge;
mod registry;
mod schema;
mod source;
mod value;

pub use decode::{DecodeError, decode_object, extract_id};
pub use entity::Entity;
pub use link::LinkDescriptor;
pub use merge::merge;
pub use registry::{CollectionEntry, DecodeFn, Registry};
pub use schema::{EntitySchema, FieldSpec, MergeRule};
pub use source::EntitySource;
pub use value::{FieldType, FieldValue};

pub use linkstore_types::{CollectionType, EntityKey, Version};
