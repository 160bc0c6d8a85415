//! SPARQL transport implementation using reqwest.
//!
//! This adapter implements the `SparqlTransport` port. It keeps two clients:
//! one with a cookie store for requests sent with credentials, and one
//! without for same-origin requests.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, Method, Url};
use tracing::debug;
use workbench_application::ports::{BoxFuture, SparqlTransport, TransportError, TransportResponse};
use workbench_domain::{CredentialsMode, HttpMethod, PreparedRequest};

/// Maximum redirects followed per request.
const MAX_REDIRECTS: usize = 10;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// SPARQL transport implementation using reqwest.
pub struct ReqwestTransport {
    client: Client,
    credentialed: Client,
}

impl ReqwestTransport {
    /// Creates a transport with default settings.
    ///
    /// Default configuration:
    /// - Request timeout: 60 seconds
    /// - Follow redirects: up to 10
    /// - User-Agent: "sparql-workbench/<version>"
    ///
    /// # Errors
    ///
    /// Returns an error if a client cannot be created.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a transport with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if a client cannot be created.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            client: Self::build_client(timeout, false)?,
            credentialed: Self::build_client(timeout, true)?,
        })
    }

    fn build_client(timeout: Duration, cookies: bool) -> Result<Client, TransportError> {
        Client::builder()
            .user_agent(concat!("sparql-workbench/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .cookie_store(cookies)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        }
    }

    const fn client_for(&self, credentials: CredentialsMode) -> &Client {
        match credentials {
            CredentialsMode::Include => &self.credentialed,
            CredentialsMode::SameOrigin => &self.client,
        }
    }

    fn map_error(error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout;
        }
        if error.is_connect() || error.is_redirect() {
            return TransportError::Connection(error.to_string());
        }
        if error.is_body() || error.is_decode() {
            return TransportError::Body(error.to_string());
        }
        TransportError::Other(error.to_string())
    }
}

impl SparqlTransport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        request: &'a PreparedRequest,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        Box::pin(async move {
            let url = Url::parse(&request.url)
                .map_err(|e| TransportError::InvalidUrl(format!("{e}: {}", request.url)))?;

            let mut builder = self
                .client_for(request.credentials)
                .request(Self::to_reqwest_method(request.method), url);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }

            debug!(method = %request.method, url = %request.url, "Sending SPARQL request");
            let response = builder.send().await.map_err(|e| Self::map_error(&e))?;

            let status = response.status();
            let headers: BTreeMap<String, String> = response
                .headers()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
                .collect();
            let body = response
                .text()
                .await
                .map_err(|e| TransportError::Body(format!("Failed to read body: {e}")))?;

            Ok(TransportResponse {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                headers,
                body,
            })
        })
    }
}
