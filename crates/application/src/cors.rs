//! Per-endpoint CORS support cache.
//!
//! A probe sends a trivial ASK query straight to the endpoint. Any HTTP
//! answer means the endpoint is reachable directly; a network failure means
//! requests should go through the CORS proxy. Probes run in the background
//! and request construction only reads whatever is cached at the time.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use url::Url;
use workbench_domain::{CredentialsMode, HttpMethod, PreparedRequest};

use crate::ports::SparqlTransport;

/// The probe query.
pub const PROBE_QUERY: &str = "ASK {?x ?y ?z}";

/// Shared cache of CORS probe results, keyed by endpoint.
#[derive(Debug, Clone, Default)]
pub struct CorsCache {
    entries: Arc<RwLock<HashMap<String, bool>>>,
}

impl CorsCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached result. `None` while unknown.
    #[must_use]
    pub fn get(&self, endpoint: &str) -> Option<bool> {
        self.entries.read().get(endpoint).copied()
    }

    /// Records a result.
    pub fn set(&self, endpoint: &str, cors_enabled: bool) {
        self.entries.write().insert(endpoint.to_string(), cors_enabled);
    }

    /// Probes an endpoint and caches the result.
    ///
    /// Returns the cached value without probing when one exists.
    pub async fn probe(&self, transport: &dyn SparqlTransport, endpoint: &str) -> bool {
        if let Some(known) = self.get(endpoint) {
            return known;
        }
        let cors_enabled = match probe_request(endpoint) {
            Some(request) => transport.send(&request).await.is_ok(),
            None => false,
        };
        debug!(endpoint, cors_enabled, "CORS probe finished");
        self.set(endpoint, cors_enabled);
        cors_enabled
    }

    /// Starts a probe in the background unless a result is cached.
    pub fn spawn_probe(&self, transport: Arc<dyn SparqlTransport>, endpoint: &str) {
        if self.get(endpoint).is_some() {
            return;
        }
        let cache = self.clone();
        let endpoint = endpoint.to_string();
        tokio::spawn(async move {
            cache.probe(transport.as_ref(), &endpoint).await;
        });
    }
}

fn probe_request(endpoint: &str) -> Option<PreparedRequest> {
    let mut url = Url::parse(endpoint).ok()?;
    url.query_pairs_mut().append_pair("query", PROBE_QUERY);
    Some(PreparedRequest {
        method: HttpMethod::Get,
        url: url.to_string(),
        headers: BTreeMap::new(),
        body: None,
        credentials: CredentialsMode::SameOrigin,
    })
}
