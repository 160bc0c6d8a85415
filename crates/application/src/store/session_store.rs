//! The persisted session document.

use tokio::sync::Mutex;
use tracing::{debug, info};
use workbench_domain::{SessionState, WorkbenchSettings};

use super::PersistentStore;

/// Owns the in-memory `SessionState` and writes it through on every change.
///
/// All tabs share one session store. Updates are serialized by an async
/// mutex so a write always persists the state it produced.
pub struct SessionStore {
    store: PersistentStore,
    key: String,
    ttl_secs: Option<u64>,
    state: Mutex<SessionState>,
}

impl SessionStore {
    /// Loads the session, or starts an empty one.
    ///
    /// A loaded session is repaired before use.
    pub async fn load(store: PersistentStore, settings: &WorkbenchSettings) -> Self {
        let key = settings.session_key();
        let state = match store.get::<SessionState>(&key).await {
            Some(mut state) => {
                if state.repair() {
                    info!(key = %key, "Repaired inconsistent session state");
                }
                debug!(key = %key, tabs = state.tabs.len(), "Loaded session");
                state
            }
            None => SessionState::default(),
        };
        Self {
            store,
            key,
            ttl_secs: Some(settings.persistence_expire_secs).filter(|secs| *secs > 0),
            state: Mutex::new(state),
        }
    }

    /// The storage key of the session.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads from the current state.
    pub async fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&*self.state.lock().await)
    }

    /// A copy of the current state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Mutates the state and persists the result.
    pub async fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.state.lock().await;
        let result = f(&mut state);
        self.persist(&state).await;
        result
    }

    async fn persist(&self, state: &SessionState) {
        let store = &self.store;
        store
            .set(&self.key, state, self.ttl_secs, || async {
                store.clear_namespace().await;
            })
            .await;
    }
}
