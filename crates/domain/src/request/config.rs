//! Layered request configuration.
//!
//! A request is described by several partial layers (global defaults,
//! endpoint settings, the tab's persisted config, per-call overrides).
//! `RequestConfigLayer` is one such layer and may hold dynamic values.
//! `PlainRequestConfig` is the data-only form persisted with a tab.
//! `ConcreteRequestConfig` is the fully resolved result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use super::{HttpMethod, RequestArg};
use crate::auth::AuthLayer;
use crate::error::{DomainError, DomainResult};
use crate::query::{QueryMode, QueryType};
use crate::value::{ConfigValue, QueryAdjuster};

/// Accept header used for SELECT and ASK when nothing else is configured.
pub const DEFAULT_ACCEPT_SELECT: &str = "application/sparql-results+json";

/// Accept header used for CONSTRUCT and DESCRIBE when nothing else is configured.
pub const DEFAULT_ACCEPT_GRAPH: &str = "text/turtle";

/// Accept header used for updates when nothing else is configured.
pub const DEFAULT_ACCEPT_UPDATE: &str = "text/plain,*/*;q=0.9";

/// One partial layer of request configuration.
///
/// Every field is optional. Scalars from later layers replace earlier ones;
/// list fields are concatenated across layers.
#[derive(Debug, Clone, Default)]
pub struct RequestConfigLayer {
    /// Endpoint URL
    pub endpoint: Option<ConfigValue<String>>,
    /// Configured method; updates are always sent as POST
    pub method: Option<ConfigValue<HttpMethod>>,
    /// Accept header for SELECT and ASK
    pub accept_header_select: Option<ConfigValue<String>>,
    /// Accept header for CONSTRUCT and DESCRIBE
    pub accept_header_graph: Option<ConfigValue<String>>,
    /// Accept header for updates
    pub accept_header_update: Option<ConfigValue<String>>,
    /// Named graph URIs
    pub named_graphs: Option<ConfigValue<Vec<String>>>,
    /// Default graph URIs
    pub default_graphs: Option<ConfigValue<Vec<String>>>,
    /// Extra arguments
    pub args: Option<ConfigValue<Vec<RequestArg>>>,
    /// Extra headers, merged per header name
    pub headers: Option<ConfigValue<BTreeMap<String, String>>>,
    /// Send cookies and credentials cross-origin
    pub with_credentials: Option<ConfigValue<bool>>,
    /// Argument name for the query text, overriding `query`/`update`
    pub query_argument: Option<ConfigValue<String>>,
    /// Final rewrite of the query text. Only honoured on the global layer.
    pub adjust_query_before_request: Option<QueryAdjuster>,
    /// Authentication contributed by this layer
    pub auth: AuthLayer,
}

impl RequestConfigLayer {
    /// Creates an empty layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<ConfigValue<String>>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the method.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<ConfigValue<HttpMethod>>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Sets the SELECT accept header.
    #[must_use]
    pub fn with_accept_header_select(mut self, accept: impl Into<ConfigValue<String>>) -> Self {
        self.accept_header_select = Some(accept.into());
        self
    }

    /// Sets the graph accept header.
    #[must_use]
    pub fn with_accept_header_graph(mut self, accept: impl Into<ConfigValue<String>>) -> Self {
        self.accept_header_graph = Some(accept.into());
        self
    }

    /// Sets the update accept header.
    #[must_use]
    pub fn with_accept_header_update(mut self, accept: impl Into<ConfigValue<String>>) -> Self {
        self.accept_header_update = Some(accept.into());
        self
    }

    /// Sets the named graphs of this layer.
    #[must_use]
    pub fn with_named_graphs(mut self, graphs: impl Into<ConfigValue<Vec<String>>>) -> Self {
        self.named_graphs = Some(graphs.into());
        self
    }

    /// Sets the default graphs of this layer.
    #[must_use]
    pub fn with_default_graphs(mut self, graphs: impl Into<ConfigValue<Vec<String>>>) -> Self {
        self.default_graphs = Some(graphs.into());
        self
    }

    /// Sets the extra arguments of this layer.
    #[must_use]
    pub fn with_args(mut self, args: impl Into<ConfigValue<Vec<RequestArg>>>) -> Self {
        self.args = Some(args.into());
        self
    }

    /// Sets the extra headers of this layer.
    #[must_use]
    pub fn with_headers(
        mut self,
        headers: impl Into<ConfigValue<BTreeMap<String, String>>>,
    ) -> Self {
        self.headers = Some(headers.into());
        self
    }

    /// Sets the credentials flag.
    #[must_use]
    pub fn with_credentials(mut self, with_credentials: impl Into<ConfigValue<bool>>) -> Self {
        self.with_credentials = Some(with_credentials.into());
        self
    }

    /// Sets the query argument name.
    #[must_use]
    pub fn with_query_argument(mut self, name: impl Into<ConfigValue<String>>) -> Self {
        self.query_argument = Some(name.into());
        self
    }

    /// Sets the query adjustment hook.
    #[must_use]
    pub fn with_adjust_query_before_request(mut self, adjuster: QueryAdjuster) -> Self {
        self.adjust_query_before_request = Some(adjuster);
        self
    }

    /// Sets the authentication of this layer.
    #[must_use]
    pub fn with_auth(mut self, auth: AuthLayer) -> Self {
        self.auth = auth;
        self
    }
}

/// The data-only request configuration persisted with a tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlainRequestConfig {
    /// Endpoint URL. Empty means "inherit".
    #[serde(default)]
    pub endpoint: String,
    /// Configured method
    #[serde(default)]
    pub method: HttpMethod,
    /// Accept header for SELECT and ASK
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_header_select: Option<String>,
    /// Accept header for CONSTRUCT and DESCRIBE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_header_graph: Option<String>,
    /// Accept header for updates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_header_update: Option<String>,
    /// Named graph URIs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub named_graphs: Vec<String>,
    /// Default graph URIs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_graphs: Vec<String>,
    /// Extra arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<RequestArg>,
    /// Extra headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Credentials flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_credentials: Option<bool>,
    /// Query argument name override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_argument: Option<String>,
}

impl PlainRequestConfig {
    /// Creates a config for an endpoint and method.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            ..Self::default()
        }
    }

    /// Converts to a static configuration layer.
    ///
    /// Empty collections and an empty endpoint contribute nothing, so the
    /// layer never masks values from earlier layers with blanks.
    #[must_use]
    pub fn to_layer(&self) -> RequestConfigLayer {
        let non_empty_list = |items: &Vec<String>| {
            (!items.is_empty()).then(|| ConfigValue::Static(items.clone()))
        };
        let endpoint = self.endpoint.trim();

        RequestConfigLayer {
            endpoint: (!endpoint.is_empty()).then(|| ConfigValue::Static(endpoint.to_string())),
            method: Some(ConfigValue::Static(self.method)),
            accept_header_select: self.accept_header_select.clone().map(ConfigValue::Static),
            accept_header_graph: self.accept_header_graph.clone().map(ConfigValue::Static),
            accept_header_update: self.accept_header_update.clone().map(ConfigValue::Static),
            named_graphs: non_empty_list(&self.named_graphs),
            default_graphs: non_empty_list(&self.default_graphs),
            args: (!self.args.is_empty()).then(|| ConfigValue::Static(self.args.clone())),
            headers: (!self.headers.is_empty()).then(|| ConfigValue::Static(self.headers.clone())),
            with_credentials: self.with_credentials.map(ConfigValue::Static),
            query_argument: self.query_argument.clone().map(ConfigValue::Static),
            adjust_query_before_request: None,
            auth: AuthLayer::default(),
        }
    }
}

/// A fully resolved request configuration.
#[derive(Debug, Clone)]
pub struct ConcreteRequestConfig {
    /// Endpoint URL
    pub endpoint: String,
    /// Configured method
    pub method: HttpMethod,
    /// Accept header for SELECT and ASK
    pub accept_header_select: String,
    /// Accept header for CONSTRUCT and DESCRIBE
    pub accept_header_graph: String,
    /// Accept header for updates
    pub accept_header_update: String,
    /// Named graph URIs
    pub named_graphs: Vec<String>,
    /// Default graph URIs
    pub default_graphs: Vec<String>,
    /// Extra arguments
    pub args: Vec<RequestArg>,
    /// Extra headers, before authentication is attached
    pub headers: BTreeMap<String, String>,
    /// Credentials flag
    pub with_credentials: bool,
    /// Query argument name override
    pub query_argument: Option<String>,
    /// Query adjustment hook, copied through unresolved
    pub adjust_query_before_request: Option<QueryAdjuster>,
}

impl Default for ConcreteRequestConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            method: HttpMethod::default(),
            accept_header_select: DEFAULT_ACCEPT_SELECT.to_string(),
            accept_header_graph: DEFAULT_ACCEPT_GRAPH.to_string(),
            accept_header_update: DEFAULT_ACCEPT_UPDATE.to_string(),
            named_graphs: Vec::new(),
            default_graphs: Vec::new(),
            args: Vec::new(),
            headers: BTreeMap::new(),
            with_credentials: false,
            query_argument: None,
            adjust_query_before_request: None,
        }
    }
}

impl ConcreteRequestConfig {
    /// Selects the Accept header for a query.
    ///
    /// Update mode wins over the query type; graph-returning forms use the
    /// graph header; everything else uses the SELECT header.
    #[must_use]
    pub fn accept_header(&self, mode: QueryMode, query_type: QueryType) -> &str {
        if mode == QueryMode::Update {
            &self.accept_header_update
        } else if query_type.returns_graph() {
            &self.accept_header_graph
        } else {
            &self.accept_header_select
        }
    }

    /// Parses the endpoint as an absolute HTTP(S) URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is empty, malformed, or not HTTP(S).
    pub fn endpoint_url(&self) -> DomainResult<Url> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(DomainError::InvalidUrl("no endpoint configured".to_string()));
        }
        let url = Url::parse(endpoint)
            .map_err(|e| DomainError::InvalidUrl(format!("{endpoint}: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(DomainError::InvalidUrl(format!(
                "{endpoint}: unsupported scheme {other}"
            ))),
        }
    }

    /// Returns the argument name carrying the query text.
    #[must_use]
    pub fn query_argument_name(&self, mode: QueryMode) -> &str {
        self.query_argument
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| mode.argument_name())
    }

    /// Projects to the persisted, data-only form.
    #[must_use]
    pub fn to_plain(&self) -> PlainRequestConfig {
        PlainRequestConfig {
            endpoint: self.endpoint.clone(),
            method: self.method,
            accept_header_select: Some(self.accept_header_select.clone()),
            accept_header_graph: Some(self.accept_header_graph.clone()),
            accept_header_update: Some(self.accept_header_update.clone()),
            named_graphs: self.named_graphs.clone(),
            default_graphs: self.default_graphs.clone(),
            args: self.args.clone(),
            headers: self.headers.clone(),
            with_credentials: Some(self.with_credentials),
            query_argument: self.query_argument.clone(),
        }
    }
}
