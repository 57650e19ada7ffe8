use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CollectionType;

/// Schema revision number. Revisions start at 1 and only ever increase.
pub type Version = u32;

/// Identifies a single entity in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub collection: CollectionType,
    pub id: String,
}

impl EntityKey {
    /// Creates a key from a collection and an id.
    #[must_use]
    pub fn new(collection: CollectionType, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
