use std::collections::HashMap;
use std::sync::OnceLock;

use linkstore_types::CollectionType;
use serde_json::{Map, Value};
use tracing::error;

use crate::{DecodeError, Entity, EntitySchema, kinds};

/// Turns a raw API object into an entity of the given schema.
pub type DecodeFn = fn(&EntitySchema, &Map<String, Value>) -> Result<Entity, DecodeError>;

/// A registered collection: its schema and its decoder.
#[derive(Debug, Clone)]
pub struct CollectionEntry {
    pub schema: EntitySchema,
    pub decoder: DecodeFn,
}

/// Maps each collection to its schema and decoder.
///
/// Built once, then only read. Tests may build their own; production code
/// uses [`Registry::shared`].
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: HashMap<CollectionType, CollectionEntry>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry of every kind declared in [`kinds`].
    pub fn standard() -> Self {
        kinds::all()
            .into_iter()
            .fold(Self::new(), |registry, (schema, decoder)| registry.with(schema, decoder))
    }

    /// Process-wide standard registry, built on first use.
    pub fn shared() -> &'static Registry {
        static SHARED: OnceLock<Registry> = OnceLock::new();
        SHARED.get_or_init(Registry::standard)
    }

    /// Registers (or replaces) a collection.
    ///
    /// An inconsistent schema table would write records no later build can
    /// read. Debug builds panic on one; release builds log it and leave the
    /// collection unregistered, so its payloads are skipped as unknown.
    ///
    /// # Panics
    ///
    /// In debug builds, if the schema table is inconsistent.
    #[must_use]
    pub fn with(mut self, schema: EntitySchema, decoder: DecodeFn) -> Self {
        if let Err(e) = schema.validate() {
            if cfg!(debug_assertions) {
                panic!("invalid schema: {e}");
            }
            error!("Not registering {}: invalid schema: {}", schema.collection, e);
            return self;
        }
        self.entries
            .insert(schema.collection, CollectionEntry { schema, decoder });
        self
    }

    pub fn entry(&self, collection: CollectionType) -> Option<&CollectionEntry> {
        self.entries.get(&collection)
    }

    pub fn schema_for(&self, collection: CollectionType) -> Option<&EntitySchema> {
        self.entry(collection).map(|e| &e.schema)
    }

    pub fn decoder_for(&self, collection: CollectionType) -> Option<DecodeFn> {
        self.entry(collection).map(|e| e.decoder)
    }

    /// Resolves a wire collection name. Unknown names, and known names with
    /// no registered entry, yield `None`.
    pub fn lookup(&self, name: &str) -> Option<&CollectionEntry> {
        CollectionType::from_tag(name).and_then(|c| self.entry(c))
    }

    /// Decodes a raw object as a member of `collection`.
    pub fn decode(&self, collection: CollectionType, raw: &Value) -> Option<Result<Entity, DecodeError>> {
        let entry = self.entry(collection)?;
        Some(match raw.as_object() {
            Some(map) => (entry.decoder)(&entry.schema, map),
            None => Err(DecodeError::NotAnObject),
        })
    }

    /// Registered collections, in no particular order.
    pub fn collections(&self) -> impl Iterator<Item = CollectionType> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
