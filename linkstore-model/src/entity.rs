use std::collections::BTreeMap;

use linkstore_types::{CollectionType, EntityKey, Version};
use serde::{Deserialize, Serialize};

use crate::{EntitySource, FieldValue, LinkDescriptor};

/// A versioned record identified by `(collection, id)`.
///
/// Entities are values: the store never mutates one in place. Callers
/// build a new entity (or mutate a clone) and write it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub collection: CollectionType,
    /// Schema revision this instance was constructed at.
    pub version: Version,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub links: BTreeMap<String, LinkDescriptor>,
}

impl Entity {
    /// Creates an entity with no fields and no links.
    #[must_use]
    pub fn new(collection: CollectionType, id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            collection,
            version,
            fields: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    /// The store key for this entity.
    #[must_use]
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.collection, self.id.clone())
    }

    // ── Fields ───────────────────────────────────────────────────

    /// Returns the raw value of a field. Missing fields read as `None`,
    /// which callers should treat the same as [`FieldValue::Null`].
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Sets a field, returning `self` for chaining.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builder-style [`Entity::set_field`].
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.field(name).and_then(FieldValue::as_int)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(FieldValue::as_float)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.field(name).and_then(FieldValue::as_bool)
    }

    pub fn get_list(&self, name: &str) -> Option<&[String]> {
        self.field(name).and_then(FieldValue::as_list)
    }

    // ── Links ────────────────────────────────────────────────────

    /// Returns the descriptor stored under `relation`.
    pub fn link(&self, relation: &str) -> Option<&LinkDescriptor> {
        self.links.get(relation)
    }

    /// Records a to-one relation. Only the in-memory entity changes; persist
    /// it through the store if the link should survive.
    pub fn add_link_object(
        &mut self,
        relation: impl Into<String>,
        id: impl Into<String>,
        collection: CollectionType,
    ) {
        self.links.insert(
            relation.into(),
            LinkDescriptor::Object {
                id: id.into(),
                collection,
            },
        );
    }

    /// Records a to-many relation, keeping `ids` in the given order.
    pub fn add_link_array<I, S>(&mut self, relation: impl Into<String>, ids: I, collection: CollectionType)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links.insert(
            relation.into(),
            LinkDescriptor::Array {
                ids: ids.into_iter().map(Into::into).collect(),
                collection,
            },
        );
    }

    /// Removes a relation, returning the previous descriptor if there was one.
    pub fn clear_link(&mut self, relation: &str) -> Option<LinkDescriptor> {
        self.links.remove(relation)
    }

    /// Resolves a to-one relation through `source`.
    ///
    /// Returns `None` when the relation is missing, is a to-many relation,
    /// or the target has not been stored yet. Nothing is cached: each call
    /// observes the source as it is now.
    pub fn get_link_object<S: EntitySource + ?Sized>(&self, relation: &str, source: &S) -> Option<Entity> {
        self.link(relation)?.resolve_object(source)
    }

    /// Resolves a to-many relation through `source`, in link order.
    ///
    /// Ids the source does not know are dropped, so the result may be
    /// shorter than the id list.
    pub fn get_link_array<S: EntitySource + ?Sized>(&self, relation: &str, source: &S) -> Vec<Entity> {
        self.link(relation)
            .map(|link| link.resolve_array(source))
            .unwrap_or_default()
    }
}
