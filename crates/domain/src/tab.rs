//! Persisted state of one query tab.

use serde::{Deserialize, Serialize};

use crate::request::PlainRequestConfig;
use crate::response::ResponseSummary;
use crate::settings::Orientation;
use crate::validation::ValidationPattern;

/// Everything a tab persists between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabState {
    /// Unique tab id
    pub id: String,
    /// Display name
    pub name: String,
    /// Last flushed query text
    #[serde(default)]
    pub query_text: String,
    /// Editor height, as reported by the editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_height: Option<String>,
    /// Data-only request configuration
    #[serde(default)]
    pub request_config: PlainRequestConfig,
    /// Last successful response, if small enough to keep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_response_summary: Option<ResponseSummary>,
    /// Expected CONSTRUCT patterns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_patterns: Vec<ValidationPattern>,
    /// Per-tab layout override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
}

impl TabState {
    /// Creates a tab with the given query and request config.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        query_text: impl Into<String>,
        request_config: PlainRequestConfig,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            query_text: query_text.into(),
            editor_height: None,
            request_config,
            last_response_summary: None,
            validation_patterns: Vec::new(),
            orientation: None,
        }
    }

    /// The endpoint this tab queries.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.request_config.endpoint
    }
}
