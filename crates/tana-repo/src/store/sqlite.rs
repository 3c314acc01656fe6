//! SQLite-backed mapping store.
//!
//! One table, `mappings(key, value)`, with values stored as JSON string
//! arrays. The on-disk shape is exactly the encoded target stack, so files
//! written by one process are readable by any other build of this crate.
//!
//! The schema lives in `schema/store.sql` at the workspace root and is
//! embedded at compile time.

use std::path::Path;

use rusqlite::{Connection, OpenFlags, params};

use super::{KeyValueStore, StoreError, StoreResult};

const SCHEMA_SQL: &str = include_str!("../../../../schema/store.sql");

/// Persistent key-value store backed by SQLite.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a store database at the given path.
    ///
    /// Creates parent directories and initializes the schema if needed.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let store = Self { conn };
        store.init_schema()?;
        tracing::debug!("opened mapping store at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store (for testing or ephemeral repositories).
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    fn decode(key: &str, raw: String) -> StoreResult<Vec<String>> {
        serde_json::from_str(&raw).map_err(|source| StoreError::CorruptValue {
            key: key.to_string(),
            source,
        })
    }
}

impl KeyValueStore for SqliteStore {
    fn exists(&self, key: &str) -> StoreResult<bool> {
        let result = self.conn.query_row(
            "SELECT 1 FROM mappings WHERE key = ?1",
            params![key],
            |_| Ok(()),
        );
        match result {
            Ok(()) => Ok(true),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<String>>> {
        let result = self.conn.query_row(
            "SELECT value FROM mappings WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(raw) => Ok(Some(Self::decode(key, raw)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &[String]) -> StoreResult<()> {
        let encoded = serde_json::to_string(value).map_err(|source| StoreError::CorruptValue {
            key: key.to_string(),
            source,
        })?;
        self.conn.execute(
            "INSERT OR REPLACE INTO mappings (key, value) VALUES (?1, ?2)",
            params![key, encoded],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM mappings WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM mappings ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }
}
