//! Ports to the query editor and the results renderer.

use std::sync::Arc;

use workbench_domain::{NormalizedResponse, QueryContext, TabState, Triple, ValidationResult};

/// The editor widget owning a tab's query text.
///
/// Classification of the text is the editor's job; the workbench treats the
/// query itself as opaque.
pub trait QueryEditor: QueryContext {
    /// Replaces the editor content.
    fn set_value(&self, text: &str);
}

/// Displays query results and the loading indicator.
pub trait ResultsRenderer: Send + Sync {
    /// Shows the loading indicator.
    fn show_loading(&self);

    /// Hides the loading indicator.
    fn hide_loading(&self);

    /// Renders a response.
    fn set_response(&self, response: &NormalizedResponse, duration_ms: u64);

    /// Triples of the last rendered graph response, if it was parsed.
    fn triples(&self) -> Option<Vec<Triple>> {
        None
    }

    /// Shows CONSTRUCT validation results.
    fn show_validation(&self, _results: &[ValidationResult]) {}

    /// Clears any shown validation results.
    fn clear_validation(&self) {}
}

/// The editor and renderer of one tab.
#[derive(Clone)]
pub struct TabSurface {
    /// Query editor
    pub editor: Arc<dyn QueryEditor>,
    /// Results renderer
    pub renderer: Arc<dyn ResultsRenderer>,
}

/// Creates the editor and renderer for a tab when it is opened.
pub trait TabSurfaceFactory: Send + Sync {
    /// Builds the surface for a tab, initialized from its persisted state.
    fn create(&self, tab: &TabState) -> TabSurface;
}
