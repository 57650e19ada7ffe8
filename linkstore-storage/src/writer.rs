//! The single write path.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use linkstore_codec::encode;
use linkstore_model::{Entity, EntitySource, Registry, merge};
use linkstore_types::EntityKey;
use rusqlite::Transaction;
use tracing::{debug, warn};

use crate::db::{self, SharedConn};
use crate::error::{StorageError, StorageResult};

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No record existed; the entity was stored as given.
    Inserted,
    /// A record existed; the merged entity was stored.
    Merged,
}

/// The store's one write handle.
///
/// Every write in the process goes through the same connection mutex, so
/// writes to a key apply in arrival order and merges never interleave.
pub struct WriteHandle {
    conn: Option<SharedConn>,
    registry: Arc<Registry>,
    generation: Arc<AtomicU64>,
}

impl WriteHandle {
    pub(crate) fn new(conn: Option<SharedConn>, registry: Arc<Registry>, generation: Arc<AtomicU64>) -> Self {
        Self {
            conn,
            registry,
            generation,
        }
    }

    pub fn is_available(&self) -> bool {
        self.conn.is_some()
    }

    /// Runs `f` inside one write transaction.
    ///
    /// Effects become visible to readers together when `f` returns `Ok`.
    /// If `f` fails, nothing it wrote is kept. Read through the
    /// transaction inside `f`: in-memory stores share one connection
    /// between the writer and every reader, so reading through a
    /// [`ReadHandle`](crate::ReadHandle) here would deadlock.
    pub fn transaction<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&WriteTxn<'_>) -> StorageResult<T>,
    {
        let conn = self.conn.as_ref().ok_or(StorageError::Unavailable)?;
        let mut guard = db::lock(conn)?;
        let tx = guard.transaction()?;
        let result = f(&WriteTxn {
            tx: &tx,
            registry: &self.registry,
        })?;
        tx.commit()?;
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(result)
    }

    /// Upserts a single entity in its own transaction.
    pub fn write(&self, entity: Entity) -> StorageResult<WriteOutcome> {
        self.transaction(|tx| tx.write(entity))
    }
}

/// An open write transaction.
pub struct WriteTxn<'a> {
    tx: &'a Transaction<'a>,
    registry: &'a Registry,
}

impl WriteTxn<'_> {
    /// Upserts `entity` at its `(collection, id)`.
    ///
    /// If a record is already stored there it is merged with `entity`
    /// under the kind's schema, and the merge result is what gets stored.
    /// A stored record that no longer decodes is replaced outright.
    pub fn write(&self, entity: Entity) -> StorageResult<WriteOutcome> {
        let schema = self
            .registry
            .schema_for(entity.collection)
            .ok_or_else(|| StorageError::Unregistered(entity.collection.to_string()))?;
        let key = entity.key();

        let existing = match db::select(self.tx, self.registry, &key) {
            Ok(existing) => existing,
            Err(StorageError::Codec(e)) => {
                warn!("Replacing unreadable record {}: {}", key, e);
                None
            }
            Err(e) => return Err(e),
        };

        let (stored, outcome) = match existing {
            Some(existing) => {
                debug!("Merging incoming {} over stored record", key);
                (merge(schema, &existing, entity), WriteOutcome::Merged)
            }
            None => (entity, WriteOutcome::Inserted),
        };

        db::upsert(self.tx, &key, &encode(&stored, schema))?;
        Ok(outcome)
    }

    /// Reads a record as this transaction sees it, including its own writes.
    pub fn read(&self, key: &EntityKey) -> StorageResult<Option<Entity>> {
        db::select(self.tx, self.registry, key)
    }
}

impl EntitySource for WriteTxn<'_> {
    fn fetch(&self, key: &EntityKey) -> Option<Entity> {
        self.read(key).unwrap_or_else(|e| {
            warn!("Read of {} failed: {}", key, e);
            None
        })
    }
}
