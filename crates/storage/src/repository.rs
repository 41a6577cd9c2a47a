use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Logical keys of the durable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Snapshot of the running session.
    Progress,
    /// Capped list of past results.
    ResultsHistory,
}

impl StoreKey {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::Progress => "progress",
            StoreKey::ResultsHistory => "results-history",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable string store. `put` replaces the whole value under a key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read. A missing key is `Ok(None)`.
    async fn get(&self, key: StoreKey) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn put(&self, key: StoreKey, value: &str) -> Result<(), StorageError>;
}

/// Simple in-memory store for tests and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<StoreKey, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: StoreKey) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&key).cloned())
    }

    async fn put(&self, key: StoreKey, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key, value.to_owned());
        Ok(())
    }
}

/// The store behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub store: Arc<dyn KeyValueStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
        }
    }
}
