use std::collections::{BTreeMap, HashMap};

use linkstore_types::EntityKey;

use crate::Entity;

/// Anything entities can be read back from by key.
///
/// The persistent store's read handles implement this; link resolution
/// takes a source explicitly so the caller decides which snapshot it reads.
pub trait EntitySource {
    /// Returns the entity stored at `key`, or `None` if it is not known yet.
    fn fetch(&self, key: &EntityKey) -> Option<Entity>;

    /// Fetches several keys, returning one slot per key in the same order.
    ///
    /// Implementations backed by a transactional store should override this
    /// so the whole batch is read from one snapshot.
    fn fetch_many(&self, keys: &[EntityKey]) -> Vec<Option<Entity>> {
        keys.iter().map(|k| self.fetch(k)).collect()
    }
}

impl EntitySource for HashMap<EntityKey, Entity> {
    fn fetch(&self, key: &EntityKey) -> Option<Entity> {
        self.get(key).cloned()
    }
}

impl EntitySource for BTreeMap<EntityKey, Entity> {
    fn fetch(&self, key: &EntityKey) -> Option<Entity> {
        self.get(key).cloned()
    }
}

impl<S: EntitySource + ?Sized> EntitySource for &S {
    fn fetch(&self, key: &EntityKey) -> Option<Entity> {
        (**self).fetch(key)
    }

    fn fetch_many(&self, keys: &[EntityKey]) -> Vec<Option<Entity>> {
        (**self).fetch_many(keys)
    }
}
