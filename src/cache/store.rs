//! Key/value persistence backends.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying filesystem failure.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A simple durable string key/value store.
///
/// The substitution seam for the host environment's persistent storage.
/// Implementations must tolerate concurrent readers and serialize writers
/// internally.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// In-memory store for tests and ephemeral hosts.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.get(key).map(|r| r.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.inner.iter().map(|r| r.key().clone()).collect())
    }
}

/// Single-file JSON store: load on open, write-through on every mutation.
///
/// A corrupt or missing file starts empty; durability problems degrade the
/// cache, they never take the engine down.
#[derive(Clone)]
pub struct FileStore {
    path: PathBuf,
    entries: Arc<DashMap<String, String>>,
}

impl FileStore {
    /// Open a store backed by `path`, loading any existing contents.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = Arc::new(DashMap::new());

        if path.exists() {
            match Self::load(&path) {
                Ok(map) => {
                    for (k, v) in map {
                        entries.insert(k, v);
                    }
                    tracing::info!(path = %path.display(), entries = entries.len(), "loaded cache store");
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cache store unreadable, starting empty");
                }
            }
        }

        Self { path, entries }
    }

    fn load(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    fn persist(&self) -> Result<(), StoreError> {
        // BTreeMap for stable on-disk ordering.
        let map: BTreeMap<String, String> = self
            .entries
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        let file = File::create(&self.path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, &map)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|r| r.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        self.persist()
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.iter().map(|r| r.key().clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_persistence() {
        let path = std::env::temp_dir().join("fx_engine_store_persistence.json");
        let _ = std::fs::remove_file(&path);

        let store = FileStore::open(&path);
        store.set("rates:USD", "{\"x\":1}").unwrap();
        store.set("rates:EUR", "{\"y\":2}").unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("rates:USD").unwrap(), Some("{\"x\":1}".to_string()));
        let mut keys = reopened.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["rates:EUR", "rates:USD"]);

        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_file_store_corrupt_file_starts_empty() {
        let path = std::env::temp_dir().join("fx_engine_store_corrupt.json");
        std::fs::write(&path, "not json at all {").unwrap();

        let store = FileStore::open(&path);
        assert!(store.keys().unwrap().is_empty());

        std::fs::remove_file(&path).unwrap_or_default();
    }
}
