//! Query execution against a SPARQL endpoint.
//!
//! The executor turns a resolved config and the editor's query into a
//! `PreparedRequest`, hands it to the transport, and normalizes the result.
//! It reports progress to an `ExecutionObserver` before sending, once the
//! request exists, and when a response or error arrives. An abort yields
//! `ExecutionError::Aborted` and no response notification.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::debug;
use url::form_urlencoded;
use workbench_domain::{
    AuthSchemes, ConcreteRequestConfig, CredentialsMode, DomainError, ErrorSummary, HttpMethod,
    NormalizedResponse, PreparedRequest, QueryContext, QueryMode, RequestArg, SuccessResponse,
    request::{FORM_CONTENT_TYPE, graph_args},
};

use crate::auth::AuthenticationAttacher;
use crate::ports::{CancellationReceiver, SparqlTransport, TransportError, TransportResponse};

/// Why a query produced no successful response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The request could not be built; nothing was sent.
    #[error("configuration error: {0}")]
    Configuration(#[from] DomainError),

    /// No HTTP response was received.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {status} {status_text}")]
    Http {
        /// Status code
        status: u16,
        /// Reason phrase
        status_text: String,
        /// Response body
        text: String,
    },
}

impl QueryError {
    /// The error as shown by a results renderer.
    #[must_use]
    pub fn to_summary(&self) -> ErrorSummary {
        match self {
            Self::Configuration(e) => ErrorSummary {
                status: None,
                status_text: Some("Configuration error".to_string()),
                text: Some(e.to_string()),
            },
            Self::Transport(e) => ErrorSummary::network(e.to_string()),
            Self::Http {
                status,
                status_text,
                text,
            } => ErrorSummary::http(*status, status_text.clone(), text.clone()),
        }
    }
}

/// Outcome of an execution that did not succeed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// The query failed.
    #[error("{error}")]
    Failed {
        /// What went wrong
        #[source]
        error: QueryError,
        /// Time from start to failure
        duration_ms: u64,
    },

    /// The caller cancelled the query.
    #[error("query aborted")]
    Aborted,
}

/// A successful execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The response
    pub response: SuccessResponse,
    /// Time from send to completion
    pub duration_ms: u64,
}

/// Receives lifecycle notifications from the executor.
pub trait ExecutionObserver: Send + Sync {
    /// Called before anything else happens.
    fn query_before(&self) {}

    /// Called once the request has been built.
    fn request_created(&self, _request: &PreparedRequest) {}

    /// Called with the normalized outcome, unless the query was aborted.
    fn query_response(&self, _response: &NormalizedResponse, _duration_ms: u64) {}

    /// Called when the query was aborted.
    fn query_abort(&self) {}
}

/// An observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ExecutionObserver for NoopObserver {}

/// Sends SPARQL queries through a transport.
pub struct QueryExecutor {
    transport: Arc<dyn SparqlTransport>,
}

impl QueryExecutor {
    /// Creates an executor over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn SparqlTransport>) -> Self {
        Self { transport }
    }

    /// Builds the HTTP request for a query.
    ///
    /// Updates are always sent as POST. POST carries the arguments as a form
    /// body; GET appends them to the endpoint's query string.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Configuration` if the endpoint is not a usable URL.
    pub fn prepare(
        config: &ConcreteRequestConfig,
        auth: &AuthSchemes,
        ctx: &dyn QueryContext,
    ) -> Result<PreparedRequest, QueryError> {
        let mode = ctx.query_mode();
        let method = if mode == QueryMode::Update {
            HttpMethod::Post
        } else {
            config.method
        };
        let mut url = config.endpoint_url()?;

        let query_text = config
            .adjust_query_before_request
            .as_ref()
            .map_or_else(|| ctx.query_text(), |adjust| adjust.apply(ctx));

        let (named_graph_arg, default_graph_arg) = match mode {
            QueryMode::Query => ("named-graph-uri", "default-graph-uri"),
            QueryMode::Update => ("using-named-graph-uri", "using-graph-uri"),
        };
        let mut args = vec![RequestArg::new(config.query_argument_name(mode), query_text)];
        args.extend(graph_args(named_graph_arg, &config.named_graphs));
        args.extend(graph_args(default_graph_arg, &config.default_graphs));
        args.extend(config.args.iter().cloned());

        let mut headers = BTreeMap::from([(
            "Accept".to_string(),
            config.accept_header(mode, ctx.query_type()).to_string(),
        )]);
        for (name, value) in &config.headers {
            set_header(&mut headers, name, value.clone());
        }
        let mut headers = AuthenticationAttacher::attach(&headers, auth);

        let body = match method {
            HttpMethod::Post => {
                set_header(&mut headers, "Content-Type", FORM_CONTENT_TYPE.to_string());
                Some(
                    form_urlencoded::Serializer::new(String::new())
                        .extend_pairs(args.iter().map(RequestArg::as_pair))
                        .finish(),
                )
            }
            HttpMethod::Get => {
                url.query_pairs_mut()
                    .extend_pairs(args.iter().map(RequestArg::as_pair));
                None
            }
        };

        Ok(PreparedRequest {
            method,
            url: url.to_string(),
            headers,
            body,
            credentials: CredentialsMode::from_flag(config.with_credentials),
        })
    }

    /// Prepares and sends a query, racing it against cancellation.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::Aborted` if cancelled, otherwise
    /// `ExecutionError::Failed` for configuration, transport, and HTTP errors.
    pub async fn execute(
        &self,
        config: &ConcreteRequestConfig,
        auth: &AuthSchemes,
        ctx: &dyn QueryContext,
        mut cancel: CancellationReceiver,
        observer: &dyn ExecutionObserver,
    ) -> Result<Completion, ExecutionError> {
        observer.query_before();
        let started = Instant::now();

        let request = match Self::prepare(config, auth, ctx) {
            Ok(request) => request,
            Err(error) => {
                let duration_ms = elapsed_ms(started);
                observer.query_response(&NormalizedResponse::failure(error.to_summary()), duration_ms);
                return Err(ExecutionError::Failed { error, duration_ms });
            }
        };
        observer.request_created(&request);
        debug!(method = %request.method, url = %request.url, "Sending query");

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = self.transport.send(&request) => Some(result),
        };
        let duration_ms = elapsed_ms(started);

        let result = match result {
            None | Some(Err(TransportError::Cancelled)) => None,
            Some(_) if cancel.is_cancelled() => None,
            Some(result) => Some(result),
        };
        let Some(result) = result else {
            debug!("Query aborted");
            observer.query_abort();
            return Err(ExecutionError::Aborted);
        };

        let outcome = match result {
            Ok(response) if response.is_success() => Ok(Completion {
                response: into_success(response),
                duration_ms,
            }),
            Ok(response) => Err(QueryError::Http {
                status: response.status,
                status_text: response.status_text,
                text: response.body,
            }),
            Err(e) => Err(QueryError::Transport(e)),
        };

        match outcome {
            Ok(completion) => {
                observer.query_response(
                    &NormalizedResponse::Success(completion.response.clone()),
                    duration_ms,
                );
                Ok(completion)
            }
            Err(error) => {
                debug!(error = %error, "Query failed");
                observer.query_response(&NormalizedResponse::failure(error.to_summary()), duration_ms);
                Err(ExecutionError::Failed { error, duration_ms })
            }
        }
    }
}

impl ExecutionError {
    /// The response a renderer shows for this outcome. Aborts show nothing.
    #[must_use]
    pub fn to_response(&self) -> Option<NormalizedResponse> {
        match self {
            Self::Failed { error, .. } => Some(NormalizedResponse::failure(error.to_summary())),
            Self::Aborted => None,
        }
    }
}

/// Sets a header, replacing any existing header of the same name in any case.
fn set_header(headers: &mut BTreeMap<String, String>, name: &str, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
}

fn into_success(response: TransportResponse) -> SuccessResponse {
    SuccessResponse {
        ok: true,
        status: response.status,
        status_text: response.status_text,
        headers: response.headers,
        content: response.body,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ports::{BoxFuture, CancellationToken};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use workbench_domain::{AuthScheme, BearerAuth, QueryAdjuster, QueryType, StaticQuery};

    /// Mock transport for testing.
    struct MockTransport {
        response: Result<TransportResponse, TransportError>,
        delay: Duration,
        sent: Mutex<Vec<PreparedRequest>>,
    }

    impl MockTransport {
        fn ok(body: &str) -> Self {
            Self::with_status(200, "OK", body)
        }

        fn with_status(status: u16, status_text: &str, body: &str) -> Self {
            Self {
                response: Ok(TransportResponse {
                    status,
                    status_text: status_text.to_string(),
                    headers: BTreeMap::from([(
                        "content-type".to_string(),
                        "application/sparql-results+json".to_string(),
                    )]),
                    body: body.to_string(),
                }),
                delay: Duration::ZERO,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn error(error: TransportError) -> Self {
            Self {
                response: Err(error),
                delay: Duration::ZERO,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    impl SparqlTransport for MockTransport {
        fn send<'a>(
            &'a self,
            request: &'a PreparedRequest,
        ) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
            self.sent.lock().push(request.clone());
            let result = self.response.clone();
            let delay = self.delay;
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                result
            })
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl ExecutionObserver for RecordingObserver {
        fn query_before(&self) {
            self.events.lock().push("queryBefore".to_string());
        }

        fn request_created(&self, request: &PreparedRequest) {
            self.events.lock().push(format!("query {}", request.method));
        }

        fn query_response(&self, response: &NormalizedResponse, _duration_ms: u64) {
            self.events
                .lock()
                .push(format!("queryResponse ok={}", response.is_ok()));
        }

        fn query_abort(&self) {
            self.events.lock().push("queryAbort".to_string());
        }
    }

    fn config(endpoint: &str, method: HttpMethod) -> ConcreteRequestConfig {
        ConcreteRequestConfig {
            endpoint: endpoint.to_string(),
            method,
            ..ConcreteRequestConfig::default()
        }
    }

    fn select() -> StaticQuery {
        StaticQuery::new("SELECT * WHERE {?s ?p ?o}", QueryType::Select)
    }

    #[test]
    fn test_prepare_post_select() {
        let request = QueryExecutor::prepare(
            &config("https://ex.org/sparql", HttpMethod::Post),
            &AuthSchemes::default(),
            &select(),
        )
        .unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://ex.org/sparql");
        assert_eq!(
            request.body.as_deref(),
            Some("query=SELECT+*+WHERE+%7B%3Fs+%3Fp+%3Fo%7D")
        );
        assert_eq!(request.header("accept"), Some("application/sparql-results+json"));
        assert_eq!(request.header("content-type"), Some(FORM_CONTENT_TYPE));
        assert_eq!(request.credentials, CredentialsMode::SameOrigin);
    }

    #[test]
    fn test_prepare_get_appends_to_existing_query_string() {
        let mut config = config("https://ex.org/sparql?key=1", HttpMethod::Get);
        config.default_graphs = vec!["http://g/d".to_string()];
        config.args = vec![RequestArg::new("timeout", "30")];

        let request = QueryExecutor::prepare(&config, &AuthSchemes::default(), &select()).unwrap();
        assert_eq!(request.body, None);
        assert_eq!(request.header("content-type"), None);
        assert_eq!(
            request.url,
            "https://ex.org/sparql?key=1&query=SELECT+*+WHERE+%7B%3Fs+%3Fp+%3Fo%7D\
             &default-graph-uri=http%3A%2F%2Fg%2Fd&timeout=30"
        );
    }

    #[test]
    fn test_update_forces_post_and_update_args() {
        let mut config = config("https://ex.org/update", HttpMethod::Get);
        config.named_graphs = vec!["http://g/n".to_string()];
        config.default_graphs = vec!["http://g/d".to_string()];
        let ctx = StaticQuery::new("INSERT DATA {}", QueryType::Update);

        let request = QueryExecutor::prepare(&config, &AuthSchemes::default(), &ctx).unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.body.as_deref(),
            Some(
                "update=INSERT+DATA+%7B%7D&using-named-graph-uri=http%3A%2F%2Fg%2Fn\
                 &using-graph-uri=http%3A%2F%2Fg%2Fd"
            )
        );
        assert_eq!(request.header("accept"), Some(config.accept_header_update.as_str()));
    }

    #[test]
    fn test_construct_uses_graph_accept() {
        let mut config = config("https://ex.org/sparql", HttpMethod::Post);
        config.accept_header_select = "application/json".to_string();
        config.accept_header_graph = "application/n-triples".to_string();
        let ctx = StaticQuery::new("CONSTRUCT WHERE { ?s ?p ?o }", QueryType::Construct);

        let request = QueryExecutor::prepare(&config, &AuthSchemes::default(), &ctx).unwrap();
        assert_eq!(request.header("Accept"), Some("application/n-triples"));
    }

    #[test]
    fn test_configured_headers_override_accept() {
        let mut config = config("https://ex.org/sparql", HttpMethod::Post);
        config.headers = BTreeMap::from([("accept".to_string(), "text/csv".to_string())]);
        let request = QueryExecutor::prepare(&config, &AuthSchemes::default(), &select()).unwrap();
        assert_eq!(request.header("Accept"), Some("text/csv"));
        assert_eq!(request.headers.len(), 2);
    }

    #[test]
    fn test_custom_query_argument_and_adjuster() {
        let mut config = config("https://ex.org/sparql", HttpMethod::Post);
        config.query_argument = Some("q".to_string());
        config.adjust_query_before_request = Some(QueryAdjuster::new(|ctx| {
            format!("{} LIMIT 5", ctx.query_text())
        }));
        let ctx = StaticQuery::new("ASK {}", QueryType::Ask);

        let request = QueryExecutor::prepare(&config, &AuthSchemes::default(), &ctx).unwrap();
        assert_eq!(request.body.as_deref(), Some("q=ASK+%7B%7D+LIMIT+5"));
    }

    #[test]
    fn test_auth_and_credentials_are_applied() {
        let mut config = config("https://ex.org/sparql", HttpMethod::Post);
        config.with_credentials = true;
        let auth = AuthSchemes::from(AuthScheme::Bearer(BearerAuth {
            token: "abc".to_string(),
        }));

        let request = QueryExecutor::prepare(&config, &auth, &select()).unwrap();
        assert_eq!(request.header("Authorization"), Some("Bearer abc"));
        assert_eq!(request.credentials, CredentialsMode::Include);
    }

    #[test]
    fn test_prepare_rejects_bad_endpoints() {
        for endpoint in ["", "not a url", "ftp://ex.org/sparql"] {
            let result = QueryExecutor::prepare(
                &config(endpoint, HttpMethod::Post),
                &AuthSchemes::default(),
                &select(),
            );
            assert!(matches!(result, Err(QueryError::Configuration(_))), "{endpoint}");
        }
    }

    #[tokio::test]
    async fn test_execute_success_notifies_in_order() {
        let transport = Arc::new(MockTransport::ok(r#"{"head":{}}"#));
        let executor = QueryExecutor::new(transport.clone());
        let observer = RecordingObserver::default();
        let token = CancellationToken::new();

        let completion = executor
            .execute(
                &config("https://ex.org/sparql", HttpMethod::Post),
                &AuthSchemes::default(),
                &select(),
                token.receiver(),
                &observer,
            )
            .await
            .unwrap();

        assert_eq!(completion.response.status, 200);
        assert_eq!(completion.response.content, r#"{"head":{}}"#);
        assert_eq!(transport.sent.lock().len(), 1);
        assert_eq!(
            *observer.events.lock(),
            vec!["queryBefore", "query POST", "queryResponse ok=true"]
        );
    }

    #[tokio::test]
    async fn test_execute_http_error_keeps_body() {
        let executor = QueryExecutor::new(Arc::new(MockTransport::with_status(
            400,
            "Bad Request",
            "Parse error",
        )));
        let result = executor
            .execute(
                &config("https://ex.org/sparql", HttpMethod::Post),
                &AuthSchemes::default(),
                &select(),
                CancellationToken::new().receiver(),
                &NoopObserver,
            )
            .await;

        let Err(ExecutionError::Failed { error, .. }) = result else {
            panic!("expected failure");
        };
        assert_eq!(
            error.to_summary(),
            ErrorSummary::http(400, "Bad Request", "Parse error")
        );
    }

    #[tokio::test]
    async fn test_execute_transport_error_has_no_status() {
        let executor = QueryExecutor::new(Arc::new(MockTransport::error(
            TransportError::Connection("refused".to_string()),
        )));
        let observer = RecordingObserver::default();
        let result = executor
            .execute(
                &config("https://ex.org/sparql", HttpMethod::Post),
                &AuthSchemes::default(),
                &select(),
                CancellationToken::new().receiver(),
                &observer,
            )
            .await;

        let response = result.unwrap_err().to_response().unwrap();
        assert_eq!(response.error().and_then(|e| e.status), None);
        assert_eq!(observer.events.lock().last().map(String::as_str), Some("queryResponse ok=false"));
    }

    #[tokio::test]
    async fn test_configuration_error_never_sends() {
        let transport = Arc::new(MockTransport::ok(""));
        let executor = QueryExecutor::new(transport.clone());
        let result = executor
            .execute(
                &config("", HttpMethod::Post),
                &AuthSchemes::default(),
                &select(),
                CancellationToken::new().receiver(),
                &NoopObserver,
            )
            .await;

        assert!(matches!(
            result,
            Err(ExecutionError::Failed {
                error: QueryError::Configuration(_),
                ..
            })
        ));
        assert!(transport.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_abort_skips_response_notification() {
        let transport = Arc::new(MockTransport::ok("late").slow(Duration::from_secs(10)));
        let executor = QueryExecutor::new(transport);
        let observer = RecordingObserver::default();
        let token = CancellationToken::new();

        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        let result = executor
            .execute(
                &config("https://ex.org/sparql", HttpMethod::Post),
                &AuthSchemes::default(),
                &select(),
                token.receiver(),
                &observer,
            )
            .await;

        assert_eq!(result, Err(ExecutionError::Aborted));
        assert_eq!(
            *observer.events.lock(),
            vec!["queryBefore", "query POST", "queryAbort"]
        );
    }
}
