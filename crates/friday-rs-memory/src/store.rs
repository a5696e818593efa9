//! Key-value storage backends for persisted memory blobs.
//!
//! Backends store one string blob per key. Writers replace the whole blob and
//! the last write wins; there are no transactions.

use crate::error::MemoryError;
use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Keyed string-blob storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the blob stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, MemoryError>;

    /// Replace the blob stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), MemoryError>;
}

/// Process-local store, lost when dropped.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, MemoryError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), MemoryError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store writing `<root>/<key>.json` per key.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    /// Directory holding one file per key.
    root: PathBuf,
}

impl FileKeyValueStore {
    /// Create a store under the given root, creating the directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("initialized file key-value store (root={})", root.display());
        Ok(Self { root })
    }

    /// Path to the blob file for a key.
    fn key_path(&self, key: &str) -> Result<PathBuf, MemoryError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(MemoryError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, MemoryError> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        debug!("read blob (key={}, len={})", key, contents.len());
        Ok(Some(contents))
    }

    /// Write through a temporary file and rename into place.
    async fn set(&self, key: &str, value: &str) -> Result<(), MemoryError> {
        let path = self.key_path(key)?;
        let temp_path = self.root.join(format!("{key}.json.tmp"));
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            file.write_all(value.as_bytes())?;
        }
        fs::rename(temp_path, path)?;
        debug!("wrote blob (key={}, len={})", key, value.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore};
    use crate::MemoryError;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn in_memory_store_replaces_values() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.get("k").await.expect("get"), None);
        store.set("k", "one").await.expect("set");
        store.set("k", "two").await.expect("set");
        assert_eq!(store.get("k").await.expect("get"), Some("two".to_string()));
    }

    #[tokio::test]
    async fn file_store_round_trips_and_survives_reopen() {
        let temp = tempdir().expect("tempdir");
        let store = FileKeyValueStore::new(temp.path()).expect("store");
        store.set("friday_ultra_memory", "{}").await.expect("set");

        let reopened = FileKeyValueStore::new(temp.path()).expect("store");
        assert_eq!(
            reopened.get("friday_ultra_memory").await.expect("get"),
            Some("{}".to_string())
        );
        assert_eq!(reopened.get("missing").await.expect("get"), None);
    }

    #[tokio::test]
    async fn file_store_rejects_path_like_keys() {
        let temp = tempdir().expect("tempdir");
        let store = FileKeyValueStore::new(temp.path()).expect("store");
        let err = store.set("../escape", "x").await.expect_err("invalid");
        match err {
            MemoryError::InvalidKey(key) => assert_eq!(key, "../escape"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
