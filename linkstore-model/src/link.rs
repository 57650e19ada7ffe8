//! Relation metadata carried on entities.

use linkstore_types::{CollectionType, EntityKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Entity, EntitySource};

/// A relation from one entity to one or many others, by id.
///
/// Descriptors never embed the referenced entity; resolution is always a
/// fresh read through an [`EntitySource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkDescriptor {
    /// To-one relation.
    Object { id: String, collection: CollectionType },
    /// To-many relation. Id order is preserved through storage and resolution.
    Array {
        ids: Vec<String>,
        collection: CollectionType,
    },
}

impl LinkDescriptor {
    /// The collection the relation points into.
    #[must_use]
    pub fn collection(&self) -> CollectionType {
        match self {
            Self::Object { collection, .. } | Self::Array { collection, .. } => *collection,
        }
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array { .. })
    }

    /// Keys of every referenced entity, in link order.
    #[must_use]
    pub fn keys(&self) -> Vec<EntityKey> {
        match self {
            Self::Object { id, collection } => vec![EntityKey::new(*collection, id.clone())],
            Self::Array { ids, collection } => ids
                .iter()
                .map(|id| EntityKey::new(*collection, id.clone()))
                .collect(),
        }
    }

    /// Resolves a to-one link. Array links resolve to `None`.
    pub fn resolve_object<S: EntitySource + ?Sized>(&self, source: &S) -> Option<Entity> {
        match self {
            Self::Object { id, collection } => source.fetch(&EntityKey::new(*collection, id.clone())),
            Self::Array { .. } => None,
        }
    }

    /// Resolves a to-many link, keeping link order and dropping ids the
    /// source does not have yet. Object links resolve to an empty list.
    pub fn resolve_array<S: EntitySource + ?Sized>(&self, source: &S) -> Vec<Entity> {
        match self {
            Self::Array { .. } => source
                .fetch_many(&self.keys())
                .into_iter()
                .flatten()
                .collect(),
            Self::Object { .. } => Vec::new(),
        }
    }

    /// Parses one entry of a raw resource's `links` object.
    ///
    /// Accepted shapes:
    /// - a bare id, whose target collection is the relation name itself
    /// - `{"id": ..., "type": ...}` for a to-one relation
    /// - `{"ids": [...], "type": ...}` for a to-many relation
    ///
    /// Anything else, including an unknown `type`, yields `None`.
    #[must_use]
    pub fn from_json(relation: &str, value: &Value) -> Option<Self> {
        match value {
            Value::String(_) | Value::Number(_) => Some(Self::Object {
                id: id_string(value)?,
                collection: CollectionType::from_tag(relation)?,
            }),
            Value::Object(map) => {
                let collection = map
                    .get("type")
                    .and_then(Value::as_str)
                    .and_then(CollectionType::from_tag)?;
                if let Some(ids) = map.get("ids") {
                    let ids = ids.as_array()?.iter().filter_map(id_string).collect();
                    Some(Self::Array { ids, collection })
                } else {
                    Some(Self::Object {
                        id: id_string(map.get("id")?)?,
                        collection,
                    })
                }
            }
            _ => None,
        }
    }
}

/// Converts a JSON id (string or integer) to its string form.
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => n
            .as_i64()
            .map(|v| v.to_string())
            .or_else(|| n.as_u64().map(|v| v.to_string())),
        _ => None,
    }
}
