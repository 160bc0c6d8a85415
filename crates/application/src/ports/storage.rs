//! Key-value storage port

use thiserror::Error;

use super::BoxFuture;

/// Storage failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The backend has no room for the write.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// The backend failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// A stored value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Port for a namespaced string key-value store.
///
/// Writes replace the whole value under a key.
pub trait KeyValueStorage: Send + Sync {
    /// Reads a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, StorageError>>;

    /// Writes a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::QuotaExceeded` when the backend is full.
    fn set<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
        value: String,
    ) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Removes a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn remove<'a>(&'a self, namespace: &'a str, key: &'a str)
    -> BoxFuture<'a, Result<(), StorageError>>;

    /// Removes every value in a namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn remove_namespace<'a>(&'a self, namespace: &'a str) -> BoxFuture<'a, Result<(), StorageError>>;
}
