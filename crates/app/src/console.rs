//! Terminal editor and renderer for tabs.
//!
//! `ConsoleEditor` holds a tab's query text and classifies it by its first
//! keyword. `ConsoleRenderer` keeps the last response so the command that
//! ran the query can print it, and reads N-Triples results for CONSTRUCT
//! validation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use workbench_application::{QueryEditor, ResultsRenderer, TabSurface, TabSurfaceFactory};
use workbench_domain::{
    NormalizedResponse, QueryContext, QueryType, TabState, Triple, ValidationResult,
};
use workbench_infrastructure::parse_ntriples;

/// Classifies query text by the first keyword after the prologue.
///
/// Comments and `PREFIX`/`BASE` declarations are skipped. Text without a
/// recognized keyword is treated as `SELECT`.
#[must_use]
pub fn classify_query(text: &str) -> QueryType {
    let mut rest = text;
    loop {
        rest = rest.trim_start();
        if let Some(comment) = rest.strip_prefix('#') {
            rest = comment.split_once('\n').map_or("", |(_, after)| after);
            continue;
        }
        let word_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let word = &rest[..word_len];
        if word.eq_ignore_ascii_case("PREFIX") || word.eq_ignore_ascii_case("BASE") {
            rest = rest.split_once('>').map_or("", |(_, after)| after);
            continue;
        }
        if word.eq_ignore_ascii_case("WITH") {
            return QueryType::Update;
        }
        return word.parse().unwrap_or_default();
    }
}

/// Query text of one tab.
#[derive(Debug, Default)]
pub struct ConsoleEditor {
    text: Mutex<String>,
}

impl ConsoleEditor {
    /// Creates an editor holding the text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(text.into()),
        }
    }
}

impl QueryContext for ConsoleEditor {
    fn query_text(&self) -> String {
        self.text.lock().clone()
    }

    fn query_type(&self) -> QueryType {
        classify_query(&self.text.lock())
    }
}

impl QueryEditor for ConsoleEditor {
    fn set_value(&self, text: &str) {
        *self.text.lock() = text.to_string();
    }
}

/// Keeps what a tab rendered last.
#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    loading: AtomicBool,
    response: Mutex<Option<(NormalizedResponse, u64)>>,
    validation: Mutex<Option<Vec<ValidationResult>>>,
}

impl ConsoleRenderer {
    /// The last rendered response and its duration.
    #[must_use]
    pub fn response(&self) -> Option<(NormalizedResponse, u64)> {
        self.response.lock().clone()
    }

    /// The last shown validation results.
    #[must_use]
    pub fn validation(&self) -> Option<Vec<ValidationResult>> {
        self.validation.lock().clone()
    }

    /// Whether a query is running.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }
}

impl ResultsRenderer for ConsoleRenderer {
    fn show_loading(&self) {
        self.loading.store(true, Ordering::SeqCst);
    }

    fn hide_loading(&self) {
        self.loading.store(false, Ordering::SeqCst);
    }

    fn set_response(&self, response: &NormalizedResponse, duration_ms: u64) {
        debug!(ok = response.is_ok(), duration_ms, "Rendering response");
        *self.response.lock() = Some((response.clone(), duration_ms));
    }

    fn triples(&self) -> Option<Vec<Triple>> {
        let response = self.response.lock();
        let (response, _) = response.as_ref()?;
        response.content().map(parse_ntriples)
    }

    fn show_validation(&self, results: &[ValidationResult]) {
        *self.validation.lock() = Some(results.to_vec());
    }

    fn clear_validation(&self) {
        *self.validation.lock() = None;
    }
}

/// Creates console surfaces and remembers each tab's renderer.
#[derive(Debug, Default)]
pub struct ConsoleSurfaces {
    renderers: Mutex<HashMap<String, Arc<ConsoleRenderer>>>,
}

impl ConsoleSurfaces {
    /// The renderer created for a tab.
    #[must_use]
    pub fn renderer(&self, tab_id: &str) -> Option<Arc<ConsoleRenderer>> {
        self.renderers.lock().get(tab_id).cloned()
    }
}

impl TabSurfaceFactory for ConsoleSurfaces {
    fn create(&self, tab: &TabState) -> TabSurface {
        let renderer = Arc::new(ConsoleRenderer::default());
        self.renderers
            .lock()
            .insert(tab.id.clone(), Arc::clone(&renderer));
        TabSurface {
            editor: Arc::new(ConsoleEditor::new(tab.query_text.clone())),
            renderer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use workbench_domain::{PlainRequestConfig, SuccessResponse};

    #[test]
    fn test_classify_skips_prologue() {
        let query = "# list things\nPREFIX ex: <http://ex.org/#>\nBASE <http://b/>\nconstruct { ?s ?p ?o } WHERE { ?s ?p ?o }";
        assert_eq!(classify_query(query), QueryType::Construct);
        assert_eq!(classify_query("  ASK {}"), QueryType::Ask);
        assert_eq!(classify_query("DESCRIBE <http://x>"), QueryType::Describe);
    }

    #[test]
    fn test_classify_updates() {
        assert_eq!(
            classify_query("INSERT DATA { <a> <b> <c> }"),
            QueryType::Update
        );
        assert_eq!(
            classify_query("WITH <http://g> DELETE { ?s ?p ?o } WHERE { ?s ?p ?o }"),
            QueryType::Update
        );
        assert_eq!(classify_query("CLEAR ALL"), QueryType::Update);
    }

    #[test]
    fn test_classify_defaults_to_select() {
        assert_eq!(classify_query(""), QueryType::Select);
        assert_eq!(classify_query("# only a comment"), QueryType::Select);
        assert_eq!(classify_query("{ ?s ?p ?o }"), QueryType::Select);
    }

    #[test]
    fn test_renderer_triples_only_for_success() {
        let renderer = ConsoleRenderer::default();
        assert_eq!(renderer.triples(), None);
        renderer.set_response(
            &NormalizedResponse::Success(SuccessResponse {
                ok: true,
                status: 200,
                status_text: "OK".to_string(),
                headers: BTreeMap::new(),
                content: "<http://s> <http://p> \"caf\\u00E9\" . # one\n".to_string(),
            }),
            5,
        );
        assert_eq!(
            renderer.triples(),
            Some(vec![Triple::new("http://s", "http://p", "caf\u{e9}")])
        );
        assert_eq!(renderer.response().map(|(_, ms)| ms), Some(5));
    }

    #[test]
    fn test_surfaces_track_renderers() {
        let surfaces = ConsoleSurfaces::default();
        let tab = TabState::new("t1", "Query", "ASK {}", PlainRequestConfig::default());
        let surface = surfaces.create(&tab);
        assert_eq!(surface.editor.query_text(), "ASK {}");
        assert_eq!(surface.editor.query_type(), QueryType::Ask);
        surface.renderer.show_loading();
        assert_eq!(surfaces.renderer("t1").map(|r| r.is_loading()), Some(true));
        assert!(surfaces.renderer("t2").is_none());
    }
}
