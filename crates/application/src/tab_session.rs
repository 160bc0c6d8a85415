//! One query tab: its editor, renderer, and query lifecycle.
//!
//! A tab moves `Idle -> Querying -> Idle`. Each `execute` snapshots the
//! query, resolves the request config, and runs the query. Starting a new
//! query aborts the one in flight, so at most one request per tab is live.
//! A response is only applied if its query is still current; an aborted or
//! superseded query changes no persisted state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info};
use workbench_domain::{
    ClosedTab, ConfigValue, EndpointConfig, ErrorSummary, HttpMethod, NormalizedResponse,
    PlainRequestConfig, PreparedRequest, QueryContext, QueryType, RequestArg,
    RequestConfigLayer, ResponseSummary, SuccessResponse, TabState, ValidationPattern,
    prefixes_in, validate,
};

use crate::auth::refresh_endpoint_token;
use crate::config::{RequestConfigResolver, WorkbenchConfig};
use crate::cors::CorsCache;
use crate::error::{ApplicationError, ApplicationResult};
use crate::events::{EventBus, WorkbenchEvent};
use crate::executor::{Completion, ExecutionError, ExecutionObserver, QueryExecutor};
use crate::ports::{
    CancellationToken, Clock, QueryEditor, ResultsRenderer, SparqlTransport, TabSurface,
    TokenRefresher,
};
use crate::store::SessionStore;

/// Services shared by every tab of a workbench.
#[derive(Clone)]
pub struct TabServices {
    /// Transport for queries and CORS probes
    pub transport: Arc<dyn SparqlTransport>,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// `OAuth2` refresh, if available
    pub token_refresher: Option<Arc<dyn TokenRefresher>>,
    /// CORS probe results
    pub cors: CorsCache,
    /// Event fan-out
    pub events: EventBus,
}

/// How a query ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The endpoint returned a 2xx response.
    Success {
        /// The response
        response: SuccessResponse,
        /// Time from send to completion
        duration_ms: u64,
    },
    /// The query failed.
    Failed {
        /// What went wrong
        error: ErrorSummary,
        /// Time until failure
        duration_ms: u64,
    },
    /// The query was aborted or superseded.
    Aborted,
}

#[derive(Debug)]
enum QueryPhase {
    Idle,
    Querying {
        cancel: CancellationToken,
        generation: u64,
    },
}

/// A single open tab.
pub struct TabSession {
    id: String,
    config: Arc<WorkbenchConfig>,
    store: Arc<SessionStore>,
    services: TabServices,
    executor: QueryExecutor,
    editor: Arc<dyn QueryEditor>,
    renderer: Arc<dyn ResultsRenderer>,
    phase: Mutex<QueryPhase>,
    generation: AtomicU64,
    buffered_text: Mutex<Option<String>>,
    closed: AtomicBool,
}

impl TabSession {
    /// Attaches a session to a tab that already exists in the store.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        config: Arc<WorkbenchConfig>,
        store: Arc<SessionStore>,
        services: TabServices,
        surface: TabSurface,
    ) -> Self {
        Self {
            id: id.into(),
            config,
            store,
            executor: QueryExecutor::new(services.transport.clone()),
            services,
            editor: surface.editor,
            renderer: surface.renderer,
            phase: Mutex::new(QueryPhase::Idle),
            generation: AtomicU64::new(0),
            buffered_text: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// The tab id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The tab's editor.
    #[must_use]
    pub fn editor(&self) -> &Arc<dyn QueryEditor> {
        &self.editor
    }

    /// Returns true while a query is running.
    #[must_use]
    pub fn is_querying(&self) -> bool {
        matches!(*self.phase.lock(), QueryPhase::Querying { .. })
    }

    /// Returns true once the tab has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// The persisted state of this tab.
    pub async fn state(&self) -> Option<TabState> {
        self.store.read(|state| state.tab(&self.id).cloned()).await
    }

    /// Text edited since the last flush, if any.
    #[must_use]
    pub fn pending_query_text(&self) -> Option<String> {
        self.buffered_text.lock().clone()
    }

    /// Renders the last persisted response, if there is one.
    pub async fn restore_view(&self) {
        let summary = self
            .store
            .read(|state| {
                state
                    .tab(&self.id)
                    .and_then(|tab| tab.last_response_summary.clone())
            })
            .await;
        if let Some(summary) = summary {
            self.renderer
                .set_response(&summary.response, summary.duration_ms);
        }
    }

    /// Runs the current query.
    ///
    /// `overrides` is applied as the last configuration layer for this call
    /// only. A query already in flight is aborted first.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab is closed or missing from the session.
    /// Query failures are reported as `QueryOutcome::Failed`.
    pub async fn execute(
        &self,
        overrides: Option<&RequestConfigLayer>,
    ) -> ApplicationResult<QueryOutcome> {
        self.ensure_open()?;
        let (cancel, generation) = self.begin_query();
        let query_type = self.editor.query_type();

        if let Err(e) = self.flush_query_text().await {
            self.finish_query(generation);
            return Err(e);
        }

        let ctx: &dyn QueryContext = self.editor.as_ref();
        let tab_layer = self
            .store
            .read(|state| {
                state
                    .tab(&self.id)
                    .map(|tab| tab.request_config.to_layer())
                    .unwrap_or_default()
            })
            .await;
        let endpoint = {
            let mut layers = vec![&self.config.request, &tab_layer];
            layers.extend(overrides);
            RequestConfigResolver::resolve(&layers, ctx).endpoint
        };

        if let Some(refresher) = &self.services.token_refresher {
            refresh_endpoint_token(
                &self.store,
                refresher.as_ref(),
                self.services.clock.as_ref(),
                &endpoint,
            )
            .await;
        }

        let endpoint_layer = self
            .store
            .read(|state| {
                state
                    .endpoint_config(&endpoint)
                    .map(EndpointConfig::to_layer)
                    .unwrap_or_default()
            })
            .await;
        let mut layers = vec![&self.config.request, &endpoint_layer, &tab_layer];
        layers.extend(overrides);
        let auth = RequestConfigResolver::resolve_auth(&layers, ctx);
        let mut request_config = RequestConfigResolver::resolve(&layers, ctx);
        if let Some(proxy_layer) = self.proxy_layer(&request_config.endpoint, request_config.method)
        {
            debug!(tab_id = %self.id, endpoint = %request_config.endpoint, "Routing query through CORS proxy");
            layers.push(&proxy_layer);
            request_config = RequestConfigResolver::resolve(&layers, ctx);
        }

        let observer = TabObserver {
            session: self,
            generation,
            delivered: AtomicBool::new(false),
        };
        let result = self
            .executor
            .execute(&request_config, &auth, ctx, cancel.receiver(), &observer)
            .await;
        let delivered = observer.delivered.load(Ordering::SeqCst);

        let outcome = match result {
            Ok(Completion {
                response,
                duration_ms,
            }) if delivered => {
                self.apply_success(&response, duration_ms, query_type).await;
                QueryOutcome::Success {
                    response,
                    duration_ms,
                }
            }
            Err(ExecutionError::Failed { error, duration_ms }) if delivered => {
                self.apply_failure().await;
                QueryOutcome::Failed {
                    error: error.to_summary(),
                    duration_ms,
                }
            }
            Err(ExecutionError::Aborted) => QueryOutcome::Aborted,
            Ok(_) | Err(ExecutionError::Failed { .. }) => {
                debug!(tab_id = %self.id, "Dropping response of a superseded query");
                self.services.events.emit(WorkbenchEvent::QueryAbort {
                    tab_id: self.id.clone(),
                });
                QueryOutcome::Aborted
            }
        };
        self.finish_query(generation);
        Ok(outcome)
    }

    /// Aborts the running query. Returns true if one was running.
    pub fn abort(&self) -> bool {
        match &*self.phase.lock() {
            QueryPhase::Querying { cancel, .. } => {
                cancel.cancel();
                true
            }
            QueryPhase::Idle => false,
        }
    }

    /// Switches the tab to another endpoint.
    ///
    /// The endpoint is trimmed and recorded in the history. When a CORS proxy
    /// is configured the endpoint is probed in the background. Returns true
    /// if the endpoint changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab is closed or missing from the session.
    pub async fn set_endpoint(&self, endpoint: &str) -> ApplicationResult<bool> {
        self.ensure_open()?;
        let endpoint = endpoint.trim().to_string();
        if self.config.cors_proxy().is_some() && !endpoint.is_empty() {
            self.services
                .cors
                .spawn_probe(self.services.transport.clone(), &endpoint);
        }

        let limit = self.config.settings.endpoint_history_limit;
        let change = self
            .store
            .update(|state| {
                let tab = state.tab_mut(&self.id)?;
                if tab.request_config.endpoint == endpoint {
                    return Some(None);
                }
                tab.request_config.endpoint.clone_from(&endpoint);
                let history_changed = state.record_endpoint(&endpoint, limit);
                Some(Some(history_changed.then(|| state.endpoint_history.clone())))
            })
            .await
            .ok_or_else(|| ApplicationError::TabNotFound(self.id.clone()))?;

        let Some(history) = change else {
            return Ok(false);
        };
        info!(tab_id = %self.id, endpoint = %endpoint, "Endpoint changed");
        self.emit_change();
        self.services.events.emit(WorkbenchEvent::EndpointChange {
            tab_id: self.id.clone(),
            endpoint,
        });
        if let Some(history) = history {
            self.services
                .events
                .emit(WorkbenchEvent::EndpointHistoryChange { history });
        }
        Ok(true)
    }

    /// Starts a CORS probe for the tab's endpoint when a proxy is configured.
    pub async fn probe_endpoint(&self) {
        if self.config.cors_proxy().is_none() {
            return;
        }
        let endpoint = self.state().await.map(|tab| tab.endpoint().trim().to_string());
        if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
            self.services
                .cors
                .spawn_probe(self.services.transport.clone(), &endpoint);
        }
    }

    /// Records an edit without persisting it.
    pub fn on_editor_change(&self) {
        *self.buffered_text.lock() = Some(self.editor.query_text());
    }

    /// Persists the editor text and captures its `PREFIX` declarations.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab is closed or missing from the session.
    pub async fn on_editor_blur(&self) -> ApplicationResult<()> {
        self.ensure_open()?;
        let text = self.editor.query_text();
        *self.buffered_text.lock() = None;
        let declarations = prefixes_in(&text);
        self.store
            .update(|state| {
                let tab = state.tab_mut(&self.id)?;
                tab.query_text = text;
                if state.auto_capture_enabled {
                    state.capture_prefixes(&declarations);
                }
                Some(())
            })
            .await
            .ok_or_else(|| ApplicationError::TabNotFound(self.id.clone()))?;
        self.emit_change();
        Ok(())
    }

    /// Persists the editor height.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab is closed or missing from the session.
    pub async fn on_editor_resize(&self, height: &str) -> ApplicationResult<()> {
        self.modify(|tab| tab.editor_height = Some(height.to_string()))
            .await
    }

    /// Renames the tab.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab is closed or missing from the session.
    pub async fn rename(&self, name: &str) -> ApplicationResult<()> {
        self.modify(|tab| tab.name = name.to_string()).await
    }

    /// Replaces the tab's request configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab is closed or missing from the session.
    pub async fn set_request_config(&self, config: PlainRequestConfig) -> ApplicationResult<()> {
        self.modify(|tab| tab.request_config = config).await
    }

    /// Replaces the CONSTRUCT validation patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab is closed or missing from the session.
    pub async fn set_validation_patterns(
        &self,
        patterns: Vec<ValidationPattern>,
    ) -> ApplicationResult<()> {
        self.modify(|tab| tab.validation_patterns = patterns).await
    }

    /// Closes the tab: aborts any running query and removes it from the
    /// session, keeping it as the last closed tab.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab was already closed or is missing.
    pub async fn close(&self) -> ApplicationResult<ClosedTab> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(ApplicationError::TabClosed(self.id.clone()));
        }
        self.abort();
        let closed = self
            .store
            .update(|state| state.remove_tab(&self.id))
            .await?;
        debug!(tab_id = %self.id, index = closed.index, "Tab closed");
        self.services.events.emit(WorkbenchEvent::Close {
            tab_id: self.id.clone(),
        });
        Ok(closed)
    }

    fn ensure_open(&self) -> ApplicationResult<()> {
        if self.is_closed() {
            return Err(ApplicationError::TabClosed(self.id.clone()));
        }
        Ok(())
    }

    fn begin_query(&self) -> (CancellationToken, u64) {
        let mut phase = self.phase.lock();
        if let QueryPhase::Querying { cancel, .. } = &*phase {
            debug!(tab_id = %self.id, "Aborting running query for a new one");
            cancel.cancel();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        *phase = QueryPhase::Querying {
            cancel: cancel.clone(),
            generation,
        };
        (cancel, generation)
    }

    fn finish_query(&self, generation: u64) {
        let mut phase = self.phase.lock();
        if matches!(&*phase, QueryPhase::Querying { generation: current, .. } if *current == generation)
        {
            *phase = QueryPhase::Idle;
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        matches!(&*self.phase.lock(), QueryPhase::Querying { generation: current, .. } if *current == generation)
    }

    fn proxy_layer(&self, endpoint: &str, method: HttpMethod) -> Option<RequestConfigLayer> {
        let proxy = self.config.cors_proxy()?;
        if self.services.cors.get(endpoint) != Some(false) {
            return None;
        }
        Some(
            RequestConfigLayer::new()
                .with_endpoint(ConfigValue::Static(proxy.to_string()))
                .with_method(HttpMethod::Post)
                .with_args(vec![
                    RequestArg::new("endpoint", endpoint),
                    RequestArg::new("method", method.as_str()),
                ]),
        )
    }

    async fn flush_query_text(&self) -> ApplicationResult<()> {
        let text = self.editor.query_text();
        *self.buffered_text.lock() = None;
        let changed = self
            .store
            .update(|state| {
                let tab = state.tab_mut(&self.id)?;
                let changed = tab.query_text != text;
                tab.query_text = text;
                Some(changed)
            })
            .await
            .ok_or_else(|| ApplicationError::TabNotFound(self.id.clone()))?;
        if changed {
            self.emit_change();
        }
        Ok(())
    }

    async fn apply_success(&self, response: &SuccessResponse, duration_ms: u64, query_type: QueryType) {
        let normalized = NormalizedResponse::Success(response.clone());
        let summary = ResponseSummary::capture(
            &normalized,
            duration_ms,
            self.config.settings.max_persisted_response_bytes,
        );
        if summary.is_none() {
            debug!(tab_id = %self.id, bytes = normalized.size_bytes(), "Response too large to persist");
        }

        let patterns = self
            .store
            .read(|state| {
                state
                    .tab(&self.id)
                    .map(|tab| tab.validation_patterns.clone())
                    .unwrap_or_default()
            })
            .await;
        if query_type == QueryType::Construct && !patterns.is_empty() {
            let triples = self.renderer.triples().unwrap_or_default();
            let results = validate(&triples, &patterns);
            debug!(
                tab_id = %self.id,
                found = results.iter().filter(|r| r.found).count(),
                patterns = results.len(),
                "Validated CONSTRUCT result"
            );
            self.renderer.show_validation(&results);
        } else {
            self.renderer.clear_validation();
        }

        self.set_summary(summary).await;
    }

    async fn apply_failure(&self) {
        self.renderer.clear_validation();
        self.set_summary(None).await;
    }

    async fn set_summary(&self, summary: Option<ResponseSummary>) {
        let updated = self
            .store
            .update(|state| {
                state
                    .tab_mut(&self.id)
                    .map(|tab| tab.last_response_summary = summary)
                    .is_some()
            })
            .await;
        if updated {
            self.emit_change();
        }
    }

    async fn modify(&self, f: impl FnOnce(&mut TabState)) -> ApplicationResult<()> {
        self.ensure_open()?;
        self.store
            .update(|state| state.tab_mut(&self.id).map(f))
            .await
            .ok_or_else(|| ApplicationError::TabNotFound(self.id.clone()))?;
        self.emit_change();
        Ok(())
    }

    fn emit_change(&self) {
        self.services.events.emit(WorkbenchEvent::Change {
            tab_id: self.id.clone(),
        });
    }
}

/// Forwards executor notifications for one query to the tab's renderer
/// and event bus, dropping them once the query is superseded.
struct TabObserver<'a> {
    session: &'a TabSession,
    generation: u64,
    delivered: AtomicBool,
}

impl ExecutionObserver for TabObserver<'_> {
    fn query_before(&self) {
        if !self.session.is_current(self.generation) {
            return;
        }
        self.session.services.events.emit(WorkbenchEvent::QueryBefore {
            tab_id: self.session.id.clone(),
        });
        self.session.renderer.show_loading();
    }

    fn request_created(&self, request: &PreparedRequest) {
        self.session.services.events.emit(WorkbenchEvent::Query {
            tab_id: self.session.id.clone(),
            curl: request.to_curl(),
        });
    }

    fn query_response(&self, response: &NormalizedResponse, duration_ms: u64) {
        let phase = self.session.phase.lock();
        let live = matches!(
            &*phase,
            QueryPhase::Querying { generation, cancel }
                if *generation == self.generation && !cancel.is_cancelled()
        );
        if !live {
            return;
        }
        self.delivered.store(true, Ordering::SeqCst);
        self.session.renderer.hide_loading();
        self.session.renderer.set_response(response, duration_ms);
        self.session.services.events.emit(WorkbenchEvent::QueryResponse {
            tab_id: self.session.id.clone(),
            response: response.clone(),
            duration_ms,
        });
    }

    fn query_abort(&self) {
        if self.session.is_current(self.generation) {
            self.session.renderer.hide_loading();
        }
        self.session.services.events.emit(WorkbenchEvent::QueryAbort {
            tab_id: self.session.id.clone(),
        });
    }
}
