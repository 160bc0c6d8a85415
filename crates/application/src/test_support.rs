//! Test doubles shared by the unit tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use parking_lot::Mutex;
use workbench_domain::{
    NormalizedResponse, PreparedRequest, QueryContext, QueryType, TabState, Triple,
    ValidationResult,
};

use crate::ports::{
    BoxFuture, Clock, KeyValueStorage, QueryEditor, ResultsRenderer, SparqlTransport,
    StorageError, TabSurface, TabSurfaceFactory, TransportError, TransportResponse,
};

/// In-memory storage with an optional byte quota.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<(String, String), String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Mutex::default(),
            quota: Some(quota),
        }
    }

    pub fn raw(&self, namespace: &str, key: &str) -> Option<String> {
        self.entries
            .lock()
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
    }

    pub fn insert_raw(&self, namespace: &str, key: &str, value: &str) {
        self.entries
            .lock()
            .insert((namespace.to_string(), key.to_string()), value.to_string());
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        let value = self.raw(namespace, key);
        Box::pin(async move { Ok(value) })
    }

    fn set<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
        value: String,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        let slot = (namespace.to_string(), key.to_string());
        let mut entries = self.entries.lock();
        let used: usize = entries
            .iter()
            .filter(|(k, _)| **k != slot)
            .map(|(_, v)| v.len())
            .sum();
        let result = if self.quota.is_some_and(|quota| used + value.len() > quota) {
            Err(StorageError::QuotaExceeded)
        } else {
            entries.insert(slot, value);
            Ok(())
        };
        Box::pin(async move { result })
    }

    fn remove<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        self.entries
            .lock()
            .remove(&(namespace.to_string(), key.to_string()));
        Box::pin(async { Ok(()) })
    }

    fn remove_namespace<'a>(&'a self, namespace: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        self.entries.lock().retain(|(ns, _), _| ns != namespace);
        Box::pin(async { Ok(()) })
    }
}

/// A clock that only moves when told to.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock();
        *now += TimeDelta::seconds(secs);
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
            .single()
            .unwrap_or_default();
        Self {
            now: Mutex::new(start),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// One scripted transport answer.
pub struct Scripted {
    pub result: Result<TransportResponse, TransportError>,
    pub delay: Duration,
}

impl Scripted {
    pub fn ok(body: &str) -> Self {
        Self::status(200, "OK", body)
    }

    pub fn status(status: u16, status_text: &str, body: &str) -> Self {
        Self {
            result: Ok(TransportResponse {
                status,
                status_text: status_text.to_string(),
                headers: BTreeMap::new(),
                body: body.to_string(),
            }),
            delay: Duration::ZERO,
        }
    }

    pub fn error(error: TransportError) -> Self {
        Self {
            result: Err(error),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Transport answering from a script, then with `200 OK` and an empty body.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    pub sent: Mutex<Vec<PreparedRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            sent: Mutex::default(),
        }
    }

    pub fn sent(&self) -> Vec<PreparedRequest> {
        self.sent.lock().clone()
    }
}

impl SparqlTransport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        request: &'a PreparedRequest,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        self.sent.lock().push(request.clone());
        let next = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Scripted::ok(""));
        Box::pin(async move {
            tokio::time::sleep(next.delay).await;
            next.result
        })
    }
}

/// Editor holding text and a fixed classification.
pub struct TestEditor {
    text: Mutex<String>,
    query_type: Mutex<QueryType>,
}

impl TestEditor {
    pub fn new(text: &str, query_type: QueryType) -> Self {
        Self {
            text: Mutex::new(text.to_string()),
            query_type: Mutex::new(query_type),
        }
    }

    pub fn set_query(&self, text: &str, query_type: QueryType) {
        *self.text.lock() = text.to_string();
        *self.query_type.lock() = query_type;
    }
}

impl QueryContext for TestEditor {
    fn query_text(&self) -> String {
        self.text.lock().clone()
    }

    fn query_type(&self) -> QueryType {
        *self.query_type.lock()
    }
}

impl QueryEditor for TestEditor {
    fn set_value(&self, text: &str) {
        *self.text.lock() = text.to_string();
    }
}

/// Renderer recording every call.
#[derive(Default)]
pub struct RecordingRenderer {
    pub calls: Mutex<Vec<String>>,
    pub responses: Mutex<Vec<NormalizedResponse>>,
    pub triples: Mutex<Option<Vec<Triple>>>,
    pub validation: Mutex<Option<Vec<ValidationResult>>>,
}

impl RecordingRenderer {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl ResultsRenderer for RecordingRenderer {
    fn show_loading(&self) {
        self.calls.lock().push("showLoading".to_string());
    }

    fn hide_loading(&self) {
        self.calls.lock().push("hideLoading".to_string());
    }

    fn set_response(&self, response: &NormalizedResponse, _duration_ms: u64) {
        self.calls.lock().push("setResponse".to_string());
        self.responses.lock().push(response.clone());
    }

    fn triples(&self) -> Option<Vec<Triple>> {
        self.triples.lock().clone()
    }

    fn show_validation(&self, results: &[ValidationResult]) {
        *self.validation.lock() = Some(results.to_vec());
    }

    fn clear_validation(&self) {
        *self.validation.lock() = None;
    }
}

/// Factory handing out test editors and recording renderers.
#[derive(Default)]
pub struct TestSurfaces {
    pub editors: Mutex<HashMap<String, Arc<TestEditor>>>,
    pub renderers: Mutex<HashMap<String, Arc<RecordingRenderer>>>,
}

impl TestSurfaces {
    pub fn editor(&self, tab_id: &str) -> Option<Arc<TestEditor>> {
        self.editors.lock().get(tab_id).cloned()
    }

    pub fn renderer(&self, tab_id: &str) -> Option<Arc<RecordingRenderer>> {
        self.renderers.lock().get(tab_id).cloned()
    }
}

impl TabSurfaceFactory for TestSurfaces {
    fn create(&self, tab: &TabState) -> TabSurface {
        let editor = Arc::new(TestEditor::new(&tab.query_text, QueryType::Select));
        let renderer = Arc::new(RecordingRenderer::default());
        self.editors.lock().insert(tab.id.clone(), editor.clone());
        self.renderers.lock().insert(tab.id.clone(), renderer.clone());
        TabSurface { editor, renderer }
    }
}
