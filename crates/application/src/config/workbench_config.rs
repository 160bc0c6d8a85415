//! Runtime workbench configuration.

use workbench_domain::{
    ConfigValue, QueryAdjuster, RequestConfigLayer, WorkbenchSettings,
    request::{DEFAULT_ACCEPT_GRAPH, DEFAULT_ACCEPT_SELECT, DEFAULT_ACCEPT_UPDATE},
};

/// Settings plus the global request layer.
///
/// The global layer is the first layer of every request and is the only one
/// whose query adjustment hook is honoured. It may carry dynamic values,
/// which is why it lives here and not in the persisted settings.
#[derive(Debug, Clone)]
pub struct WorkbenchConfig {
    /// Persisted settings
    pub settings: WorkbenchSettings,
    /// Global request defaults
    pub request: RequestConfigLayer,
}

impl WorkbenchConfig {
    /// Builds the global layer from settings.
    #[must_use]
    pub fn from_settings(settings: WorkbenchSettings) -> Self {
        let request = RequestConfigLayer::new()
            .with_endpoint(ConfigValue::Static(settings.default_endpoint.clone()))
            .with_method(settings.default_method)
            .with_accept_header_select(ConfigValue::Static(DEFAULT_ACCEPT_SELECT.to_string()))
            .with_accept_header_graph(ConfigValue::Static(DEFAULT_ACCEPT_GRAPH.to_string()))
            .with_accept_header_update(ConfigValue::Static(DEFAULT_ACCEPT_UPDATE.to_string()));
        Self { settings, request }
    }

    /// Replaces the global request layer.
    #[must_use]
    pub fn with_request_layer(mut self, request: RequestConfigLayer) -> Self {
        self.request = request;
        self
    }

    /// Installs the query adjustment hook on the global layer.
    #[must_use]
    pub fn with_query_adjuster(mut self, adjuster: QueryAdjuster) -> Self {
        self.request.adjust_query_before_request = Some(adjuster);
        self
    }

    /// The CORS proxy, if one is configured and non-blank.
    #[must_use]
    pub fn cors_proxy(&self) -> Option<&str> {
        self.settings
            .cors_proxy
            .as_deref()
            .map(str::trim)
            .filter(|proxy| !proxy.is_empty())
    }
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self::from_settings(WorkbenchSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use workbench_domain::{HttpMethod, QueryType, StaticQuery};

    #[test]
    fn test_global_layer_mirrors_settings() {
        let settings = WorkbenchSettings {
            default_endpoint: "https://ex.org/sparql".to_string(),
            default_method: HttpMethod::Get,
            ..WorkbenchSettings::default()
        };
        let config = WorkbenchConfig::from_settings(settings);
        let ctx = StaticQuery::new("ASK {}", QueryType::Ask);

        let endpoint = config.request.endpoint.as_ref().map(|v| v.resolve(&ctx));
        assert_eq!(endpoint, Some(Ok("https://ex.org/sparql".to_string())));
        let method = config.request.method.as_ref().map(|v| v.resolve(&ctx));
        assert_eq!(method, Some(Ok(HttpMethod::Get)));
    }

    #[test]
    fn test_blank_proxy_is_ignored() {
        let mut config = WorkbenchConfig::default();
        assert_eq!(config.cors_proxy(), None);
        config.settings.cors_proxy = Some("  ".to_string());
        assert_eq!(config.cors_proxy(), None);
        config.settings.cors_proxy = Some(" https://proxy.example/ ".to_string());
        assert_eq!(config.cors_proxy(), Some("https://proxy.example/"));
    }
}
