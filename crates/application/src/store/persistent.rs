//! Typed, expiring storage on top of a key-value backend.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ports::{Clock, KeyValueStorage, StorageError};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRef<'a, T> {
    value: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    value: T,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

/// JSON values with an optional time-to-live, scoped to one namespace.
///
/// Failures never reach the caller. Reads that fail come back as `None`,
/// writes that fail are logged, and a full backend triggers the caller's
/// recovery callback.
#[derive(Clone)]
pub struct PersistentStore {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    namespace: String,
}

impl PersistentStore {
    /// Creates a store over `storage` for `namespace`.
    #[must_use]
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            clock,
            namespace: namespace.into(),
        }
    }

    /// The namespace this store writes to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Reads a value. Expired entries are removed and read as absent.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get(&self.namespace, key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(namespace = %self.namespace, key, error = %e, "Failed to read stored value");
                return None;
            }
        };
        let envelope: Envelope<T> = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(namespace = %self.namespace, key, error = %e, "Ignoring unreadable stored value");
                return None;
            }
        };
        if envelope
            .expires_at
            .is_some_and(|expires_at| expires_at <= self.clock.now())
        {
            debug!(namespace = %self.namespace, key, "Stored value expired");
            self.remove(key).await;
            return None;
        }
        Some(envelope.value)
    }

    /// Writes a value that expires after `ttl_secs`, or never.
    ///
    /// When the backend is full, `on_quota_exceeded` runs once and the write
    /// is dropped. Returns true if the value was stored.
    pub async fn set<T, F, Fut>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: Option<u64>,
        on_quota_exceeded: F,
    ) -> bool
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let expires_at = ttl_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(TimeDelta::try_seconds)
            .and_then(|ttl| self.clock.now().checked_add_signed(ttl));
        let raw = match serde_json::to_string(&EnvelopeRef { value, expires_at }) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(namespace = %self.namespace, key, error = %e, "Failed to serialize value");
                return false;
            }
        };

        match self.storage.set(&self.namespace, key, raw).await {
            Ok(()) => true,
            Err(StorageError::QuotaExceeded) => {
                warn!(namespace = %self.namespace, key, "Storage quota exceeded, running recovery");
                on_quota_exceeded().await;
                false
            }
            Err(e) => {
                warn!(namespace = %self.namespace, key, error = %e, "Failed to store value");
                false
            }
        }
    }

    /// Removes a value.
    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.storage.remove(&self.namespace, key).await {
            warn!(namespace = %self.namespace, key, error = %e, "Failed to remove stored value");
        }
    }

    /// Removes every value in the namespace.
    pub async fn clear_namespace(&self) {
        if let Err(e) = self.storage.remove_namespace(&self.namespace).await {
            warn!(namespace = %self.namespace, error = %e, "Failed to clear namespace");
        }
    }
}
