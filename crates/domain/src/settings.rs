//! Workbench Settings Domain Model
//!
//! Defines the user-editable defaults the workbench starts from.

use serde::{Deserialize, Serialize};

use crate::request::HttpMethod;

/// Theme mode preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Light mode theme (default).
    #[default]
    Light,
    /// Dark mode theme.
    Dark,
}

impl ThemeMode {
    /// Returns true if dark mode is selected.
    #[must_use]
    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }
}

/// Layout of editor and results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Results below the editor (default).
    #[default]
    Vertical,
    /// Results beside the editor.
    Horizontal,
}

/// Settings for the workbench.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbenchSettings {
    /// Endpoint used by new tabs.
    #[serde(default = "default_endpoint")]
    pub default_endpoint: String,

    /// Method used by new tabs.
    #[serde(default)]
    pub default_method: HttpMethod,

    /// Proxy used for endpoints that do not support CORS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors_proxy: Option<String>,

    /// Lifetime of the persisted session in seconds.
    #[serde(default = "default_persistence_expire_secs")]
    pub persistence_expire_secs: u64,

    /// Responses larger than this are not persisted. `None` means unbounded.
    #[serde(default = "default_max_persisted_response_bytes")]
    pub max_persisted_response_bytes: Option<usize>,

    /// Maximum number of remembered endpoints.
    #[serde(default = "default_endpoint_history_limit")]
    pub endpoint_history_limit: usize,

    /// Name given to new tabs.
    #[serde(default = "default_tab_name")]
    pub default_tab_name: String,

    /// Query text of new tabs.
    #[serde(default = "default_query")]
    pub default_query: String,

    /// Storage namespace.
    #[serde(default = "default_storage_namespace")]
    pub storage_namespace: String,

    /// Key of the session within the namespace.
    #[serde(default = "default_persistence_label")]
    pub persistence_label: String,

    /// Theme mode preference.
    #[serde(default)]
    pub theme: ThemeMode,

    /// Editor and results layout.
    #[serde(default)]
    pub orientation: Orientation,
}

fn default_endpoint() -> String {
    "https://dbpedia.org/sparql".to_string()
}

const fn default_persistence_expire_secs() -> u64 {
    60 * 60 * 24 * 30
}

#[allow(clippy::unnecessary_wraps)]
const fn default_max_persisted_response_bytes() -> Option<usize> {
    Some(100_000)
}

const fn default_endpoint_history_limit() -> usize {
    50
}

fn default_tab_name() -> String {
    "Query".to_string()
}

fn default_query() -> String {
    "SELECT * WHERE {\n  ?sub ?pred ?obj .\n} LIMIT 10".to_string()
}

fn default_storage_namespace() -> String {
    "workbench".to_string()
}

fn default_persistence_label() -> String {
    "session".to_string()
}

impl Default for WorkbenchSettings {
    fn default() -> Self {
        Self {
            default_endpoint: default_endpoint(),
            default_method: HttpMethod::default(),
            cors_proxy: None,
            persistence_expire_secs: default_persistence_expire_secs(),
            max_persisted_response_bytes: default_max_persisted_response_bytes(),
            endpoint_history_limit: default_endpoint_history_limit(),
            default_tab_name: default_tab_name(),
            default_query: default_query(),
            storage_namespace: default_storage_namespace(),
            persistence_label: default_persistence_label(),
            theme: ThemeMode::default(),
            orientation: Orientation::default(),
        }
    }
}

impl WorkbenchSettings {
    /// Storage key of the session.
    #[must_use]
    pub fn session_key(&self) -> String {
        format!("{}_{}", self.storage_namespace, self.persistence_label)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_settings() {
        let settings = WorkbenchSettings::default();
        assert_eq!(settings.default_method, HttpMethod::Post);
        assert_eq!(settings.max_persisted_response_bytes, Some(100_000));
        assert_eq!(settings.endpoint_history_limit, 50);
        assert_eq!(settings.session_key(), "workbench_session");
    }

    #[test]
    fn missing_fields_use_defaults() {
        let settings: WorkbenchSettings =
            serde_json::from_str(r#"{"defaultEndpoint":"https://ex.org/sparql","theme":"dark"}"#)
                .unwrap();
        assert_eq!(settings.default_endpoint, "https://ex.org/sparql");
        assert!(settings.theme.is_dark());
        assert_eq!(settings.default_tab_name, "Query");
    }

    #[test]
    fn explicit_null_means_unbounded() {
        let settings: WorkbenchSettings =
            serde_json::from_str(r#"{"maxPersistedResponseBytes":null}"#).unwrap();
        assert_eq!(settings.max_persisted_response_bytes, None);
    }
}
