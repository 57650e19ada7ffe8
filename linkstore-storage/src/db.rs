//! SQLite connection setup and the record table.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use linkstore_codec::decode;
use linkstore_model::{Entity, Registry};
use linkstore_types::EntityKey;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tracing::warn;

use crate::error::{StorageError, StorageResult};

pub(crate) type SharedConn = Arc<Mutex<Connection>>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS records (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        body BLOB NOT NULL,
        PRIMARY KEY (collection, id)
    ) WITHOUT ROWID;
";

/// Opens the writer connection, creating the file and table as needed.
pub(crate) fn open_writer(path: &Path) -> StorageResult<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    // WAL lets readers keep a consistent snapshot while the writer commits.
    let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
    if !mode.eq_ignore_ascii_case("wal") {
        warn!("SQLite refused WAL mode (got {mode}); readers will block on writes");
    }
    conn.execute_batch("PRAGMA synchronous=NORMAL;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// Opens an independent read-only connection to an existing store file.
pub(crate) fn open_reader(path: &Path) -> StorageResult<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI,
    )?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

pub(crate) fn open_memory() -> StorageResult<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

pub(crate) fn lock(conn: &SharedConn) -> StorageResult<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| StorageError::LockPoisoned)
}

/// Reads and decodes one record.
///
/// Undecodable bytes are reported as an error so callers can decide
/// whether to treat the record as absent.
pub(crate) fn select(conn: &Connection, registry: &Registry, key: &EntityKey) -> StorageResult<Option<Entity>> {
    let body: Option<Vec<u8>> = conn
        .prepare_cached("SELECT body FROM records WHERE collection = ?1 AND id = ?2")?
        .query_row(params![key.collection.as_str(), key.id], |row| row.get(0))
        .optional()?;
    match body {
        Some(bytes) => Ok(Some(decode(&bytes, registry)?)),
        None => Ok(None),
    }
}

/// Stores `body` at `key`. The record's revision travels in its header.
pub(crate) fn upsert(conn: &Connection, key: &EntityKey, body: &[u8]) -> StorageResult<()> {
    conn.prepare_cached(
        "INSERT INTO records (collection, id, body) VALUES (?1, ?2, ?3)
         ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body",
    )?
    .execute(params![key.collection.as_str(), key.id, body])?;
    Ok(())
}

pub(crate) fn count(conn: &Connection, collection: &str) -> StorageResult<usize> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM records WHERE collection = ?1",
        params![collection],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(n).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkstore_codec::{encode_at, peek_header};
    use linkstore_model::{CollectionType, kinds};

    #[test]
    fn records_table_holds_only_key_and_body() {
        let conn = open_memory().unwrap();
        let columns: Vec<String> = conn
            .prepare("SELECT name FROM pragma_table_info('records')")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(columns, vec!["collection", "id", "body"]);
    }

    #[test]
    fn stored_revision_is_read_from_the_record_header() {
        let conn = open_memory().unwrap();
        let registry = Registry::standard();
        let schema = kinds::users();
        let user = schema.new_entity("42").with_field("username", "foo");
        let key = user.key();

        upsert(&conn, &key, &encode_at(&user, &schema, 1)).unwrap();

        let body: Vec<u8> = conn
            .query_row("SELECT body FROM records WHERE id = '42'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(peek_header(&body).unwrap(), (1, CollectionType::Users));
        assert_eq!(select(&conn, &registry, &key).unwrap().unwrap().version, 1);
        assert_eq!(count(&conn, "users").unwrap(), 1);
    }
}
