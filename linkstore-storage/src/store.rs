use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};

use linkstore_model::{CollectionType, Entity, EntitySource, Registry};
use linkstore_types::EntityKey;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_READER_CACHE, StoreConfig};
use crate::db::{self, SharedConn};
use crate::error::{StorageError, StorageResult};
use crate::reader::ReadHandle;
use crate::writer::{WriteHandle, WriteOutcome};

enum Backing {
    /// On-disk store; each reader opens its own connection to `path`.
    File(PathBuf),
    /// In-memory store; readers share the writer's connection.
    Memory(SharedConn),
    /// Degraded mode.
    Unavailable,
}

struct Inner {
    backing: Backing,
    registry: Arc<Registry>,
    generation: Arc<AtomicU64>,
    cache_capacity: NonZeroUsize,
    writer: WriteHandle,
    reader: ReadHandle,
}

/// The persistent, partitioned entity store.
///
/// Cloning is cheap and every clone shares the same single writer. Open
/// the store once and pass it to whatever needs it.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backing = match &self.inner.backing {
            Backing::File(path) => path.display().to_string(),
            Backing::Memory(_) => ":memory:".to_string(),
            Backing::Unavailable => "unavailable".to_string(),
        };
        f.debug_struct("Store").field("backing", &backing).finish()
    }
}

impl Store {
    /// Opens the store described by `config`.
    ///
    /// Never fails: if the directory cannot be resolved or the file cannot
    /// be opened, the store comes up in degraded mode where reads are
    /// empty and writes are dropped.
    pub fn open(config: &StoreConfig, registry: Arc<Registry>) -> Self {
        match Self::try_open(config, registry.clone()) {
            Ok(store) => store,
            Err(e) => {
                warn!("Entity store unavailable, continuing without cache: {}", e);
                Self::unavailable(registry)
            }
        }
    }

    /// Opens the store described by `config`, surfacing failures.
    pub fn try_open(config: &StoreConfig, registry: Arc<Registry>) -> StorageResult<Self> {
        let path = config.path().ok_or(StorageError::NoDirectory)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let conn = db::open_writer(&path)?;
        info!("Opened entity store at {}", path.display());
        Ok(Self::assemble(
            Backing::File(path),
            Some(Arc::new(Mutex::new(conn))),
            registry,
            config.reader_cache_capacity,
        ))
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory(registry: Arc<Registry>) -> StorageResult<Self> {
        let conn = Arc::new(Mutex::new(db::open_memory()?));
        Ok(Self::assemble(
            Backing::Memory(conn.clone()),
            Some(conn),
            registry,
            DEFAULT_READER_CACHE,
        ))
    }

    /// A store in degraded mode.
    pub fn unavailable(registry: Arc<Registry>) -> Self {
        Self::assemble(Backing::Unavailable, None, registry, DEFAULT_READER_CACHE)
    }

    fn assemble(backing: Backing, writer_conn: Option<SharedConn>, registry: Arc<Registry>, capacity: usize) -> Self {
        let cache_capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let generation = Arc::new(AtomicU64::new(0));
        let writer = WriteHandle::new(writer_conn, registry.clone(), generation.clone());
        let reader = new_reader(&backing, &registry, &generation, cache_capacity);
        Self {
            inner: Arc::new(Inner {
                backing,
                registry,
                generation,
                cache_capacity,
                writer,
                reader,
            }),
        }
    }

    /// Whether the store is backed by a working database.
    pub fn is_available(&self) -> bool {
        self.inner.writer.is_available()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    /// The process-wide write handle.
    pub fn writer(&self) -> &WriteHandle {
        &self.inner.writer
    }

    /// Opens a new read handle with its own bounded cache.
    ///
    /// For on-disk stores the handle has its own connection and never
    /// waits on the writer. If that connection cannot be opened the handle
    /// reads as empty.
    pub fn open_reader(&self) -> ReadHandle {
        let inner = &self.inner;
        new_reader(&inner.backing, &inner.registry, &inner.generation, inner.cache_capacity)
    }

    /// Upserts `entity` at its `(collection, id)`, merging with any stored
    /// record. Errors are logged; in degraded mode this is a no-op.
    pub fn write(&self, entity: Entity) {
        if !self.is_available() {
            debug!("Dropping write of {}: store unavailable", entity.key());
            return;
        }
        let key = entity.key();
        if let Err(e) = self.try_write(entity) {
            warn!("Write of {} failed: {}", key, e);
        }
    }

    /// Upserts `entity`, surfacing errors.
    pub fn try_write(&self, entity: Entity) -> StorageResult<WriteOutcome> {
        self.inner.writer.write(entity)
    }

    /// Reads the entity at `(collection, id)`.
    pub fn read(&self, id: &str, collection: CollectionType) -> Option<Entity> {
        self.inner.reader.read(id, collection)
    }

    /// Reads the entity at `key`, surfacing errors.
    pub fn try_read(&self, key: &EntityKey) -> StorageResult<Option<Entity>> {
        self.inner.reader.try_read(key)
    }

    pub fn contains(&self, id: &str, collection: CollectionType) -> bool {
        self.inner.reader.contains(id, collection)
    }

    pub fn count(&self, collection: CollectionType) -> usize {
        self.inner.reader.count(collection).unwrap_or_else(|e| {
            warn!("Count of {} failed: {}", collection, e);
            0
        })
    }
}

fn new_reader(
    backing: &Backing,
    registry: &Arc<Registry>,
    generation: &Arc<AtomicU64>,
    capacity: NonZeroUsize,
) -> ReadHandle {
    let conn = match backing {
        Backing::File(path) => match db::open_reader(path) {
            Ok(conn) => Some(Arc::new(Mutex::new(conn))),
            Err(e) => {
                warn!("Could not open read handle: {}", e);
                None
            }
        },
        Backing::Memory(conn) => Some(conn.clone()),
        Backing::Unavailable => None,
    };
    ReadHandle::new(conn, registry.clone(), generation.clone(), capacity)
}

impl EntitySource for Store {
    fn fetch(&self, key: &EntityKey) -> Option<Entity> {
        self.inner.reader.fetch(key)
    }

    fn fetch_many(&self, keys: &[EntityKey]) -> Vec<Option<Entity>> {
        self.inner.reader.fetch_many(keys)
    }
}
