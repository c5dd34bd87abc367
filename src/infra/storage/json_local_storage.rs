use crate::core::drafts::{LocalStorage, StorageError};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Local storage backed by one pretty-printed JSON object on disk.
///
/// Every write rewrites the whole file, which is fine for a handful of keys.
pub struct JsonLocalStorage {
    path: PathBuf,
    cache: DashMap<String, String>,
}

impl JsonLocalStorage {
    /// Opens (or lazily creates) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let cache = DashMap::new();

        if path.exists() {
            let file = std::fs::File::open(&path)?;
            let entries: BTreeMap<String, String> = serde_json::from_reader(file)?;
            for (key, value) in entries {
                cache.insert(key, value);
            }
            tracing::debug!(path = %path.display(), keys = cache.len(), "Local storage loaded");
        }

        Ok(Self { path, cache })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn snapshot(&self) -> BTreeMap<String, String> {
        self.cache
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Writes `entries` as the whole file. Sorted so the file diffs cleanly
    /// between runs.
    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = std::fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(file, entries)?;
        Ok(())
    }
}

// The cache only changes once the file has been written, so a failed write
// leaves both exactly as they were.
impl LocalStorage for JsonLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.cache.get(key).map(|value| value.clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut next = self.snapshot();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;

        self.cache.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        if !self.cache.contains_key(key) {
            return Ok(());
        }
        let mut next = self.snapshot();
        next.remove(key);
        self.persist(&next)?;

        self.cache.remove(key);
        Ok(())
    }
}
