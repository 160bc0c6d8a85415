//! File-backed key-value storage.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<namespace>/<key>.json
//! ```
//!
//! Namespace and key are percent-encoded into file names. Writes go to a
//! temporary file first and are renamed into place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;
use url::form_urlencoded::byte_serialize;
use workbench_application::ports::{BoxFuture, KeyValueStorage, StorageError};

const EXTENSION: &str = "json";

/// Stores each value in its own file.
#[derive(Debug, Clone)]
pub struct FileKeyValueStorage {
    root: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileKeyValueStorage {
    /// Creates storage rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            quota_bytes: None,
        }
    }

    /// Limits the total size of one namespace.
    #[must_use]
    pub const fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(encode(namespace))
    }

    fn key_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.namespace_dir(namespace)
            .join(format!("{}.{EXTENSION}", encode(key)))
    }

    async fn used_bytes(dir: &Path, except: &Path) -> Result<u64, StorageError> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(io_error(&e)),
        };
        let mut used = 0;
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&e))? {
            if entry.path() == except {
                continue;
            }
            let metadata = entry.metadata().await.map_err(|e| io_error(&e))?;
            if metadata.is_file() {
                used += metadata.len();
            }
        }
        Ok(used)
    }

    async fn read(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.key_path(namespace, key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&e)),
        }
    }

    async fn write(&self, namespace: &str, key: &str, value: String) -> Result<(), StorageError> {
        let dir = self.namespace_dir(namespace);
        let path = self.key_path(namespace, key);
        if let Some(quota) = self.quota_bytes {
            let used = Self::used_bytes(&dir, &path).await?;
            let size = u64::try_from(value.len()).unwrap_or(u64::MAX);
            if used.saturating_add(size) > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }

        fs::create_dir_all(&dir).await.map_err(|e| io_error(&e))?;
        let temp = path.with_extension("tmp");
        fs::write(&temp, value).await.map_err(|e| io_error(&e))?;
        fs::rename(&temp, &path).await.map_err(|e| io_error(&e))?;
        debug!(path = %path.display(), "Stored value");
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.key_path(namespace, key)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(io_error(&e)),
            _ => Ok(()),
        }
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<(), StorageError> {
        match fs::remove_dir_all(self.namespace_dir(namespace)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(io_error(&e)),
            _ => Ok(()),
        }
    }
}

impl KeyValueStorage for FileKeyValueStorage {
    fn get<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        Box::pin(self.read(namespace, key))
    }

    fn set<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
        value: String,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(self.write(namespace, key, value))
    }

    fn remove<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(self.delete(namespace, key))
    }

    fn remove_namespace<'a>(
        &'a self,
        namespace: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(self.delete_namespace(namespace))
    }
}

fn encode(segment: &str) -> String {
    byte_serialize(segment.as_bytes()).collect()
}

fn io_error(error: &std::io::Error) -> StorageError {
    StorageError::Io(error.to_string())
}
