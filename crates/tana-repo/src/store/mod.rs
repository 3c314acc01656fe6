//! Key-value storage for virtual path mappings.
//!
//! The repository engine consumes storage through the [`KeyValueStore`]
//! trait: keys are canonical virtual paths, values are target stacks encoded
//! as lists of strings (see `target.rs`). Two implementations are provided:
//!
//! - [`MemoryStore`]: ordered in-memory map, for transient repositories and
//!   tests
//! - [`SqliteStore`]: persistent store backed by SQLite

mod sqlite;

pub use sqlite::SqliteStore;

use std::collections::BTreeMap;

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage layer errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt value for key {key}: {source}")]
    CorruptValue {
        key: String,
        source: serde_json::Error,
    },
}

/// Abstract mapping from virtual paths to encoded target stacks.
///
/// The engine only ever stores lists of strings; heterogeneous stores can
/// carry other value shapes for other consumers, but they are invisible
/// through this trait.
pub trait KeyValueStore {
    /// Check whether a key is present.
    fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Read the value at a key, `None` if absent.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<String>>>;

    /// Write a value, replacing any previous one.
    fn set(&mut self, key: &str, value: &[String]) -> StoreResult<()>;

    /// Delete a key. Returns true iff it existed.
    fn remove(&mut self, key: &str) -> StoreResult<bool>;

    /// All keys, in ascending lexicographic order.
    fn keys(&self) -> StoreResult<Vec<String>>;
}

/// Ordered in-memory store. Never fails.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<String>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.contains_key(key))
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<String>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[String]) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}
