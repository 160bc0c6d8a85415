//! The multi-tab workbench.
//!
//! `Workbench` owns the session store and one `TabSession` per open tab. It
//! handles everything that spans tabs: adding, selecting, reordering,
//! closing and restoring tabs, the endpoint registry, and session import.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info};
use workbench_domain::{
    AuthUpdate, ClosedTab, EndpointConfig, EndpointUpdate, Orientation, PlainRequestConfig,
    SessionState, TabState, ThemeMode, generate_id,
};

use crate::config::WorkbenchConfig;
use crate::error::{ApplicationError, ApplicationResult};
use crate::events::{EventBus, WorkbenchEvent};
use crate::ports::TabSurfaceFactory;
use crate::store::{PersistentStore, SessionStore};
use crate::tab_session::{TabServices, TabSession};

/// All open tabs of one session.
pub struct Workbench {
    config: Arc<WorkbenchConfig>,
    store: Arc<SessionStore>,
    services: TabServices,
    surfaces: Arc<dyn TabSurfaceFactory>,
    tabs: RwLock<HashMap<String, Arc<TabSession>>>,
}

impl Workbench {
    /// Loads the persisted session and opens its tabs.
    ///
    /// A session without tabs gets one new tab.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial tab cannot be created.
    pub async fn open(
        config: WorkbenchConfig,
        storage: PersistentStore,
        services: TabServices,
        surfaces: Arc<dyn TabSurfaceFactory>,
    ) -> ApplicationResult<Self> {
        let store = Arc::new(SessionStore::load(storage, &config.settings).await);
        let workbench = Self {
            config: Arc::new(config),
            store,
            services,
            surfaces,
            tabs: RwLock::new(HashMap::new()),
        };

        let state = workbench.store.snapshot().await;
        for tab in state.ordered_tabs() {
            let session = workbench.attach(tab);
            session.restore_view().await;
            session.probe_endpoint().await;
        }
        if state.tabs.is_empty() {
            workbench.add_tab(None, true).await?;
        } else if state.active.is_none() {
            workbench
                .store
                .update(|state| {
                    let first = state.tabs.first().cloned();
                    state.set_active(first.as_deref())
                })
                .await?;
        }
        info!(tabs = workbench.tabs.read().len(), "Workbench opened");
        Ok(workbench)
    }

    /// The runtime configuration.
    #[must_use]
    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    /// Subscribes to all workbench events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WorkbenchEvent> {
        self.services.events.subscribe()
    }

    /// The event bus shared by all tabs.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.services.events
    }

    /// A copy of the persisted session.
    pub async fn snapshot(&self) -> SessionState {
        self.store.snapshot().await
    }

    /// An open tab by id.
    #[must_use]
    pub fn tab(&self, id: &str) -> Option<Arc<TabSession>> {
        self.tabs.read().get(id).cloned()
    }

    /// The active tab.
    pub async fn active_tab(&self) -> Option<Arc<TabSession>> {
        let active = self.store.read(|state| state.active.clone()).await?;
        self.tab(&active)
    }

    /// Open tab ids in display order.
    pub async fn tab_ids(&self) -> Vec<String> {
        self.store.read(|state| state.tabs.clone()).await
    }

    /// Opens a new tab at `index`, or at the end.
    ///
    /// The tab gets the default query and the active tab's endpoint, or the
    /// default endpoint when no tab is active.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab cannot be added to the session.
    pub async fn add_tab(&self, index: Option<usize>, select: bool) -> ApplicationResult<Arc<TabSession>> {
        let settings = &self.config.settings;
        let tab = self
            .store
            .update(|state| {
                let endpoint = state
                    .active_tab()
                    .map(|tab| tab.endpoint().to_string())
                    .filter(|endpoint| !endpoint.trim().is_empty())
                    .unwrap_or_else(|| settings.default_endpoint.clone());
                let tab = TabState::new(
                    generate_id(),
                    state.next_tab_name(&settings.default_tab_name),
                    settings.default_query.clone(),
                    PlainRequestConfig::new(endpoint, settings.default_method),
                );
                state.add_tab(tab.clone(), index)?;
                if select {
                    state.set_active(Some(&tab.id))?;
                }
                Ok::<_, ApplicationError>(tab)
            })
            .await?;

        debug!(tab_id = %tab.id, name = %tab.name, "Tab added");
        let session = self.attach(&tab);
        self.emit(WorkbenchEvent::TabAdd {
            tab_id: tab.id.clone(),
        });
        if select {
            self.emit(WorkbenchEvent::TabSelect { tab_id: tab.id });
        }
        Ok(session)
    }

    /// Makes a tab active.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab is not open.
    pub async fn select_tab(&self, id: &str) -> ApplicationResult<()> {
        self.store.update(|state| state.set_active(Some(id))).await?;
        self.emit(WorkbenchEvent::TabSelect {
            tab_id: id.to_string(),
        });
        Ok(())
    }

    /// Renames a tab.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab is not open.
    pub async fn rename_tab(&self, id: &str, name: &str) -> ApplicationResult<()> {
        self.require(id)?.rename(name).await
    }

    /// Reorders the tabs.
    ///
    /// # Errors
    ///
    /// Returns an error if `order` is not a permutation of the open tabs.
    pub async fn set_tab_order(&self, order: Vec<String>) -> ApplicationResult<()> {
        self.store
            .update(|state| state.set_tab_order(order.clone()))
            .await?;
        self.emit(WorkbenchEvent::TabOrderChanged { tabs: order });
        Ok(())
    }

    /// Closes a tab.
    ///
    /// When it was active, a neighbour becomes active. Closing the last tab
    /// opens a fresh one.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab is not open.
    pub async fn close_tab(&self, id: &str) -> ApplicationResult<ClosedTab> {
        let session = self.require(id)?;
        let was_active = self
            .store
            .read(|state| state.active.as_deref() == Some(id))
            .await;
        let closed = session.close().await?;
        self.tabs.write().remove(id);
        self.emit(WorkbenchEvent::TabClose {
            tab_id: id.to_string(),
        });

        if self.store.read(|state| state.tabs.is_empty()).await {
            self.add_tab(None, true).await?;
        } else if was_active
            && let Some(active) = self.store.read(|state| state.active.clone()).await
        {
            self.emit(WorkbenchEvent::TabSelect { tab_id: active });
        }
        Ok(closed)
    }

    /// Reopens the most recently closed tab where it was and selects it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the restored tab.
    pub async fn restore_last_closed_tab(&self) -> ApplicationResult<Option<Arc<TabSession>>> {
        let restored = self
            .store
            .update(|state| {
                let id = state.restore_last_closed_tab()?;
                state.tab(&id).cloned()
            })
            .await;
        let Some(tab) = restored else {
            return Ok(None);
        };
        info!(tab_id = %tab.id, "Restored closed tab");
        let session = self.attach(&tab);
        session.restore_view().await;
        self.emit(WorkbenchEvent::TabAdd {
            tab_id: tab.id.clone(),
        });
        self.emit(WorkbenchEvent::TabSelect { tab_id: tab.id });
        Ok(Some(session))
    }

    /// Merges an imported session into this one.
    ///
    /// Imported tabs replace open tabs with the same id and are appended
    /// otherwise. Non-empty history and prefixes replace the current ones.
    /// Imported endpoint entries are merged into the registry.
    /// Returns the ids of newly opened tabs.
    ///
    /// # Errors
    ///
    /// Returns an error if an imported tab is invalid.
    pub async fn import_session(&self, imported: SessionState) -> ApplicationResult<Vec<String>> {
        let (added, replaced) = self
            .store
            .update(|state| {
                let mut added = Vec::new();
                let mut replaced = Vec::new();
                for tab in imported.ordered_tabs() {
                    if state.tab(&tab.id).is_some() {
                        state.update_tab(tab.clone())?;
                        replaced.push(tab.clone());
                    } else {
                        state.add_tab(tab.clone(), None)?;
                        added.push(tab.clone());
                    }
                }
                if let Some(active) = imported.active.as_deref()
                    && state.tabs.iter().any(|id| id == active)
                {
                    state.set_active(Some(active))?;
                }
                if !imported.endpoint_history.is_empty() {
                    state.endpoint_history.clone_from(&imported.endpoint_history);
                }
                for config in &imported.endpoint_configs {
                    let update = EndpointUpdate {
                        label: config.label.clone(),
                        show_as_button: config.show_as_button,
                        authentication: config
                            .authentication
                            .clone()
                            .map_or(AuthUpdate::Keep, AuthUpdate::Set),
                    };
                    state.add_or_update_endpoint(&config.endpoint, update);
                }
                if !imported.prefixes.trim().is_empty() {
                    state.prefixes.clone_from(&imported.prefixes);
                }
                state.auto_capture_enabled = imported.auto_capture_enabled;
                if imported.theme.is_some() {
                    state.theme = imported.theme;
                }
                if imported.orientation.is_some() {
                    state.orientation = imported.orientation;
                }
                Ok::<_, ApplicationError>((added, replaced))
            })
            .await?;

        for tab in &replaced {
            if let Some(session) = self.tab(&tab.id) {
                session.editor().set_value(&tab.query_text);
            }
        }
        let mut ids = Vec::with_capacity(added.len());
        for tab in &added {
            self.attach(tab);
            self.emit(WorkbenchEvent::TabAdd {
                tab_id: tab.id.clone(),
            });
            ids.push(tab.id.clone());
        }
        info!(added = ids.len(), replaced = replaced.len(), "Imported session");
        Ok(ids)
    }

    /// The registry entry of an endpoint.
    pub async fn endpoint_config(&self, endpoint: &str) -> Option<EndpointConfig> {
        self.store
            .read(|state| state.endpoint_config(endpoint).cloned())
            .await
    }

    /// Creates or updates an endpoint's registry entry.
    pub async fn add_or_update_endpoint(&self, endpoint: &str, update: EndpointUpdate) {
        let endpoint = endpoint.trim();
        self.store
            .update(|state| state.add_or_update_endpoint(endpoint, update))
            .await;
    }

    /// Deletes an endpoint's registry entry. Returns true if one existed.
    pub async fn delete_endpoint_config(&self, endpoint: &str) -> bool {
        self.store
            .update(|state| state.delete_endpoint_config(endpoint))
            .await
    }

    /// Endpoints offered as quick-select buttons.
    pub async fn endpoint_buttons(&self) -> Vec<EndpointConfig> {
        self.store
            .read(|state| state.endpoint_buttons().cloned().collect())
            .await
    }

    /// Enables or disables automatic `PREFIX` capture.
    pub async fn set_auto_capture(&self, enabled: bool) {
        self.store
            .update(|state| state.auto_capture_enabled = enabled)
            .await;
    }

    /// Replaces the saved prefixes.
    pub async fn set_prefixes(&self, prefixes: &str) {
        self.store
            .update(|state| state.prefixes = prefixes.to_string())
            .await;
    }

    /// Stores the theme.
    pub async fn set_theme(&self, theme: ThemeMode) {
        self.store.update(|state| state.theme = Some(theme)).await;
    }

    /// Stores the layout.
    pub async fn set_orientation(&self, orientation: Orientation) {
        self.store
            .update(|state| state.orientation = Some(orientation))
            .await;
    }

    fn attach(&self, tab: &TabState) -> Arc<TabSession> {
        let session = Arc::new(TabSession::new(
            tab.id.clone(),
            self.config.clone(),
            self.store.clone(),
            self.services.clone(),
            self.surfaces.create(tab),
        ));
        self.tabs.write().insert(tab.id.clone(), session.clone());
        session
    }

    fn require(&self, id: &str) -> ApplicationResult<Arc<TabSession>> {
        self.tab(id)
            .ok_or_else(|| ApplicationError::TabNotFound(id.to_string()))
    }

    fn emit(&self, event: WorkbenchEvent) {
        self.services.events.emit(event);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cors::CorsCache;
    use crate::test_support::{FixedClock, MemoryStorage, ScriptedTransport, TestSurfaces};
    use pretty_assertions::assert_eq;
    use workbench_domain::{AuthScheme, HttpMethod, QueryContext, WorkbenchSettings};

    const OTHER: &str = "https://other.org/sparql";

    struct Fixture {
        storage: Arc<MemoryStorage>,
        surfaces: Arc<TestSurfaces>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                storage: Arc::new(MemoryStorage::default()),
                surfaces: Arc::new(TestSurfaces::default()),
            }
        }

        async fn open(&self) -> Workbench {
            let settings = WorkbenchSettings::default();
            let clock = Arc::new(FixedClock::default());
            let persistent = PersistentStore::new(
                self.storage.clone(),
                clock.clone(),
                settings.storage_namespace.clone(),
            );
            let services = TabServices {
                transport: Arc::new(ScriptedTransport::default()),
                clock,
                token_refresher: None,
                cors: CorsCache::new(),
                events: EventBus::default(),
            };
            Workbench::open(
                WorkbenchConfig::from_settings(settings),
                persistent,
                services,
                self.surfaces.clone(),
            )
            .await
            .unwrap()
        }
    }

    fn names(events: &mut broadcast::Receiver<WorkbenchEvent>) -> Vec<&'static str> {
        let mut names = Vec::new();
        while let Ok(event) = events.try_recv() {
            names.push(event.name());
        }
        names
    }

    #[tokio::test]
    async fn test_open_empty_session_creates_default_tab() {
        let fixture = Fixture::new();
        let workbench = fixture.open().await;

        let state = workbench.snapshot().await;
        assert_eq!(state.tabs.len(), 1);
        let tab = state.active_tab().unwrap();
        let settings = &workbench.config().settings;
        assert_eq!(tab.name, settings.default_tab_name);
        assert_eq!(tab.query_text, settings.default_query);
        assert_eq!(tab.endpoint(), settings.default_endpoint);
        assert!(workbench.active_tab().await.is_some());
    }

    #[tokio::test]
    async fn test_reopen_restores_tabs_in_order() {
        let fixture = Fixture::new();
        let first_ids = {
            let workbench = fixture.open().await;
            workbench.add_tab(None, false).await.unwrap();
            workbench.tab_ids().await
        };

        let workbench = fixture.open().await;
        assert_eq!(workbench.tab_ids().await, first_ids);
        for id in &first_ids {
            assert!(workbench.tab(id).is_some());
            assert!(fixture.surfaces.editor(id).is_some());
        }
    }

    #[tokio::test]
    async fn test_add_tab_inherits_active_endpoint() {
        let fixture = Fixture::new();
        let workbench = fixture.open().await;
        let first = workbench.active_tab().await.unwrap();
        first.set_endpoint(OTHER).await.unwrap();
        let mut events = workbench.subscribe();

        let added = workbench.add_tab(Some(0), true).await.unwrap();

        let state = workbench.snapshot().await;
        assert_eq!(state.tabs[0], added.id());
        assert_eq!(state.active.as_deref(), Some(added.id()));
        let tab = state.tab(added.id()).unwrap();
        assert_eq!(tab.endpoint(), OTHER);
        assert_eq!(tab.request_config.method, HttpMethod::Post);
        assert_ne!(tab.name, state.tab(first.id()).unwrap().name);
        assert_eq!(names(&mut events), vec!["tabAdd", "tabSelect"]);
    }

    #[tokio::test]
    async fn test_select_unknown_tab_fails() {
        let fixture = Fixture::new();
        let workbench = fixture.open().await;
        assert!(workbench.select_tab("missing").await.is_err());
        assert!(matches!(
            workbench.rename_tab("missing", "x").await,
            Err(ApplicationError::TabNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_close_active_tab_selects_neighbour() {
        let fixture = Fixture::new();
        let workbench = fixture.open().await;
        let first = workbench.active_tab().await.unwrap().id().to_string();
        let second = workbench.add_tab(None, false).await.unwrap().id().to_string();
        let mut events = workbench.subscribe();

        let closed = workbench.close_tab(&first).await.unwrap();

        assert_eq!(closed.index, 0);
        assert!(workbench.tab(&first).is_none());
        assert_eq!(workbench.snapshot().await.active, Some(second));
        assert_eq!(names(&mut events), vec!["close", "tabClose", "tabSelect"]);
    }

    #[tokio::test]
    async fn test_closing_last_tab_opens_a_fresh_one() {
        let fixture = Fixture::new();
        let workbench = fixture.open().await;
        let only = workbench.active_tab().await.unwrap().id().to_string();

        workbench.close_tab(&only).await.unwrap();

        let ids = workbench.tab_ids().await;
        assert_eq!(ids.len(), 1);
        assert_ne!(ids[0], only);
        assert_eq!(workbench.snapshot().await.active.as_ref(), Some(&ids[0]));
    }

    #[tokio::test]
    async fn test_restore_last_closed_tab() {
        let fixture = Fixture::new();
        let workbench = fixture.open().await;
        let first = workbench.active_tab().await.unwrap().id().to_string();
        workbench.add_tab(None, true).await.unwrap();
        workbench.close_tab(&first).await.unwrap();

        let restored = workbench.restore_last_closed_tab().await.unwrap().unwrap();

        assert_eq!(restored.id(), first);
        let state = workbench.snapshot().await;
        assert_eq!(state.tabs[0], first);
        assert_eq!(state.active, Some(first));
        assert!(workbench.restore_last_closed_tab().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_tab_order() {
        let fixture = Fixture::new();
        let workbench = fixture.open().await;
        workbench.add_tab(None, false).await.unwrap();
        let mut order = workbench.tab_ids().await;
        order.reverse();

        workbench.set_tab_order(order.clone()).await.unwrap();
        assert_eq!(workbench.tab_ids().await, order);

        order.pop();
        assert!(workbench.set_tab_order(order).await.is_err());
    }

    #[tokio::test]
    async fn test_import_replaces_and_appends_tabs() {
        let fixture = Fixture::new();
        let workbench = fixture.open().await;
        let existing = workbench.active_tab().await.unwrap().id().to_string();

        let mut imported = SessionState::default();
        imported
            .add_tab(
                TabState::new(
                    existing.clone(),
                    "Renamed",
                    "ASK {}",
                    PlainRequestConfig::new(OTHER, HttpMethod::Get),
                ),
                None,
            )
            .unwrap();
        imported
            .add_tab(
                TabState::new("new", "New", "SELECT 1 {}", PlainRequestConfig::default()),
                None,
            )
            .unwrap();
        imported.prefixes = "PREFIX ex: <http://ex.org/>".to_string();
        imported.endpoint_history = vec![OTHER.to_string()];

        let added = workbench.import_session(imported).await.unwrap();

        assert_eq!(added, vec!["new".to_string()]);
        let state = workbench.snapshot().await;
        assert_eq!(state.tabs, vec![existing.clone(), "new".to_string()]);
        assert_eq!(state.tab(&existing).unwrap().name, "Renamed");
        assert_eq!(state.endpoint_history, vec![OTHER.to_string()]);
        assert_eq!(state.prefixes, "PREFIX ex: <http://ex.org/>");
        let editor = fixture.surfaces.editor(&existing).unwrap();
        assert_eq!(editor.query_text(), "ASK {}");
        assert!(workbench.tab("new").is_some());
    }

    #[tokio::test]
    async fn test_endpoint_registry() {
        let fixture = Fixture::new();
        let workbench = fixture.open().await;

        workbench
            .add_or_update_endpoint(
                &format!(" {OTHER} "),
                EndpointUpdate {
                    show_as_button: Some(true),
                    ..EndpointUpdate::default()
                },
            )
            .await;
        workbench
            .add_or_update_endpoint(OTHER, EndpointUpdate::authentication(AuthScheme::bearer("t")))
            .await;

        let config = workbench.endpoint_config(OTHER).await.unwrap();
        assert_eq!(config.authentication, Some(AuthScheme::bearer("t")));
        assert_eq!(workbench.endpoint_buttons().await, vec![config]);
        assert!(workbench.delete_endpoint_config(OTHER).await);
        assert!(!workbench.delete_endpoint_config(OTHER).await);
    }

    #[tokio::test]
    async fn test_preferences_persist() {
        let fixture = Fixture::new();
        {
            let workbench = fixture.open().await;
            workbench.set_theme(ThemeMode::Dark).await;
            workbench.set_orientation(Orientation::Horizontal).await;
            workbench.set_auto_capture(false).await;
        }
        let state = fixture.open().await.snapshot().await;
        assert_eq!(state.theme, Some(ThemeMode::Dark));
        assert_eq!(state.orientation, Some(Orientation::Horizontal));
        assert!(!state.auto_capture_enabled);
    }
}
