//! In-memory key-value storage for sessions that must not touch the disk.

use std::collections::HashMap;

use parking_lot::RwLock;
use workbench_application::ports::{BoxFuture, KeyValueStorage, StorageError};

/// Keeps values in a map for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStorage {
    entries: RwLock<HashMap<String, HashMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl MemoryKeyValueStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the total size of one namespace.
    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RwLock::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn store(&self, namespace: &str, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        let bucket = entries.entry(namespace.to_string()).or_default();
        if let Some(quota) = self.quota_bytes {
            let used: usize = bucket
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            if used + value.len() > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        bucket.insert(key.to_string(), value);
        Ok(())
    }
}

impl KeyValueStorage for MemoryKeyValueStorage {
    fn get<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        let value = self
            .entries
            .read()
            .get(namespace)
            .and_then(|bucket| bucket.get(key))
            .cloned();
        Box::pin(async move { Ok(value) })
    }

    fn set<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
        value: String,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        let result = self.store(namespace, key, value);
        Box::pin(async move { result })
    }

    fn remove<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        if let Some(bucket) = self.entries.write().get_mut(namespace) {
            bucket.remove(key);
        }
        Box::pin(async { Ok(()) })
    }

    fn remove_namespace<'a>(
        &'a self,
        namespace: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        self.entries.write().remove(namespace);
        Box::pin(async { Ok(()) })
    }
}
