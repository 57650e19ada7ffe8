//! Read handles.
//!
//! Each handle owns its own connection (or, for in-memory stores, shares
//! the writer's) and a bounded LRU of decoded entities. The cache is
//! dropped wholesale whenever the writer has committed since it was
//! filled, so a handle never serves an entity older than the last commit
//! it could have seen.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use linkstore_model::{CollectionType, Entity, EntitySource, Registry};
use linkstore_types::EntityKey;
use lru::LruCache;
use rusqlite::Transaction;
use tracing::warn;

use crate::db::{self, SharedConn};
use crate::error::{StorageError, StorageResult};

struct ReadCache {
    generation: u64,
    entries: LruCache<EntityKey, Entity>,
}

/// An independently opened, cache-bounded read handle.
pub struct ReadHandle {
    conn: Option<SharedConn>,
    registry: Arc<Registry>,
    generation: Arc<AtomicU64>,
    cache: Mutex<ReadCache>,
}

impl ReadHandle {
    pub(crate) fn new(
        conn: Option<SharedConn>,
        registry: Arc<Registry>,
        generation: Arc<AtomicU64>,
        cache_capacity: NonZeroUsize,
    ) -> Self {
        let current = generation.load(Ordering::Acquire);
        Self {
            conn,
            registry,
            generation,
            cache: Mutex::new(ReadCache {
                generation: current,
                entries: LruCache::new(cache_capacity),
            }),
        }
    }

    pub fn is_available(&self) -> bool {
        self.conn.is_some()
    }

    /// Returns the stored entity, or `None` if it is absent or unreadable.
    pub fn read(&self, id: &str, collection: CollectionType) -> Option<Entity> {
        let key = EntityKey::new(collection, id);
        self.try_read(&key).unwrap_or_else(|e| {
            warn!("Read of {} failed: {}", key, e);
            None
        })
    }

    /// Like [`ReadHandle::read`], surfacing errors.
    pub fn try_read(&self, key: &EntityKey) -> StorageResult<Option<Entity>> {
        let Some(conn) = &self.conn else {
            return Ok(None);
        };

        let generation = self.generation.load(Ordering::Acquire);
        if let Some(hit) = self.cached(key, generation)? {
            return Ok(Some(hit));
        }

        let entity = db::select(&*db::lock(conn)?, &self.registry, key)?;
        if let Some(entity) = &entity {
            let mut cache = self.lock_cache()?;
            if cache.generation == generation {
                cache.entries.put(key.clone(), entity.clone());
            }
        }
        Ok(entity)
    }

    /// Whether a record exists at the key.
    pub fn contains(&self, id: &str, collection: CollectionType) -> bool {
        self.read(id, collection).is_some()
    }

    /// Number of records stored in a collection.
    pub fn count(&self, collection: CollectionType) -> StorageResult<usize> {
        match &self.conn {
            Some(conn) => db::count(&*db::lock(conn)?, collection.as_str()),
            None => Ok(0),
        }
    }

    /// Runs `f` against one consistent snapshot of the store.
    ///
    /// Reads inside the closure bypass the cache and all observe the same
    /// committed state, however many writes land meanwhile.
    pub fn snapshot<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&ReadView<'_>) -> T,
    {
        let conn = self.conn.as_ref().ok_or(StorageError::Unavailable)?;
        let mut guard = db::lock(conn)?;
        let tx = guard.transaction()?;
        let result = f(&ReadView {
            tx: &tx,
            registry: &self.registry,
        });
        // Read-only; ending it releases the snapshot.
        tx.finish()?;
        Ok(result)
    }

    /// Number of entities currently cached.
    pub fn cached_len(&self) -> usize {
        self.lock_cache().map(|c| c.entries.len()).unwrap_or(0)
    }

    fn cached(&self, key: &EntityKey, generation: u64) -> StorageResult<Option<Entity>> {
        let mut cache = self.lock_cache()?;
        if cache.generation != generation {
            cache.entries.clear();
            cache.generation = generation;
            return Ok(None);
        }
        Ok(cache.entries.get(key).cloned())
    }

    fn lock_cache(&self) -> StorageResult<MutexGuard<'_, ReadCache>> {
        self.cache.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

impl EntitySource for ReadHandle {
    fn fetch(&self, key: &EntityKey) -> Option<Entity> {
        self.read(&key.id, key.collection)
    }

    fn fetch_many(&self, keys: &[EntityKey]) -> Vec<Option<Entity>> {
        if !self.is_available() {
            return vec![None; keys.len()];
        }
        self.snapshot(|view| view.fetch_many(keys)).unwrap_or_else(|e| {
            warn!("Snapshot read failed: {}", e);
            vec![None; keys.len()]
        })
    }
}

/// Reads within a [`ReadHandle::snapshot`].
pub struct ReadView<'a> {
    tx: &'a Transaction<'a>,
    registry: &'a Registry,
}

impl ReadView<'_> {
    pub fn read(&self, id: &str, collection: CollectionType) -> Option<Entity> {
        self.fetch(&EntityKey::new(collection, id))
    }
}

impl EntitySource for ReadView<'_> {
    fn fetch(&self, key: &EntityKey) -> Option<Entity> {
        db::select(self.tx, self.registry, key).unwrap_or_else(|e| {
            warn!("Read of {} failed: {}", key, e);
            None
        })
    }
}
