//! End-to-end tests: the workbench over reqwest, file storage and the
//! `OAuth2` refresh client, against a mock SPARQL endpoint.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use workbench_application::{
    CorsCache, EventBus, PersistentStore, QueryEditor, QueryOutcome, ResultsRenderer, TabServices,
    TabSurface, TabSurfaceFactory, Workbench, WorkbenchConfig,
};
use workbench_domain::{
    AuthScheme, EndpointUpdate, NormalizedResponse, OAuth2Auth, QueryContext, QueryType,
    TabState, WorkbenchSettings,
};
use workbench_infrastructure::{
    FileKeyValueStorage, OAuth2RefreshClient, ReqwestTransport, SystemClock,
};

const RESULTS: &str = r#"{"head":{"vars":["s"]},"results":{"bindings":[]}}"#;

struct Editor(Mutex<String>);

impl QueryContext for Editor {
    fn query_text(&self) -> String {
        self.0.lock().clone()
    }

    fn query_type(&self) -> QueryType {
        QueryType::Select
    }
}

impl QueryEditor for Editor {
    fn set_value(&self, text: &str) {
        *self.0.lock() = text.to_string();
    }
}

#[derive(Default)]
struct Renderer(Mutex<Vec<NormalizedResponse>>);

impl ResultsRenderer for Renderer {
    fn show_loading(&self) {}

    fn hide_loading(&self) {}

    fn set_response(&self, response: &NormalizedResponse, _duration_ms: u64) {
        self.0.lock().push(response.clone());
    }
}

struct Surfaces;

impl TabSurfaceFactory for Surfaces {
    fn create(&self, tab: &TabState) -> TabSurface {
        TabSurface {
            editor: Arc::new(Editor(Mutex::new(tab.query_text.clone()))),
            renderer: Arc::new(Renderer::default()),
        }
    }
}

async fn open(dir: &TempDir, endpoint: &str) -> Workbench {
    let settings = WorkbenchSettings {
        default_endpoint: endpoint.to_string(),
        ..WorkbenchSettings::default()
    };
    let clock = Arc::new(SystemClock::new());
    let storage = PersistentStore::new(
        Arc::new(FileKeyValueStorage::new(dir.path())),
        clock.clone(),
        settings.storage_namespace.clone(),
    );
    let services = TabServices {
        transport: Arc::new(ReqwestTransport::new().unwrap()),
        clock,
        token_refresher: Some(Arc::new(OAuth2RefreshClient::new())),
        cors: CorsCache::new(),
        events: EventBus::default(),
    };
    Workbench::open(
        WorkbenchConfig::from_settings(settings),
        storage,
        services,
        Arc::new(Surfaces),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_query_result_survives_restart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sparql"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("query=SELECT"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/sparql-results+json")
                .set_body_string(RESULTS),
        )
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let endpoint = format!("{}/sparql", server.uri());

    let tab_id = {
        let workbench = open(&dir, &endpoint).await;
        let tab = workbench.active_tab().await.unwrap();
        tab.editor().set_value("SELECT ?s WHERE { ?s ?p ?o }");

        let outcome = tab.execute(None).await.unwrap();

        let QueryOutcome::Success { response, .. } = outcome else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(response.content, RESULTS);
        tab.id().to_string()
    };

    let workbench = open(&dir, &endpoint).await;
    let state = workbench.snapshot().await;
    assert_eq!(state.tabs, vec![tab_id.clone()]);
    let tab = state.tab(&tab_id).unwrap();
    assert_eq!(tab.query_text, "SELECT ?s WHERE { ?s ?p ?o }");
    let summary = tab.last_response_summary.as_ref().unwrap();
    assert_eq!(summary.response.content(), Some(RESULTS));
}

#[tokio::test]
async fn test_expired_oauth2_token_is_refreshed_before_the_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sparql"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let endpoint = format!("{}/sparql", server.uri());
    let workbench = open(&dir, &endpoint).await;

    let mut token = OAuth2Auth::new("stale");
    token.expiry = Some(Utc::now() - Duration::minutes(5));
    token.refresh_token = Some("old-refresh".to_string());
    token.client_id = Some("workbench".to_string());
    token.token_endpoint = Some(format!("{}/token", server.uri()));
    workbench
        .add_or_update_endpoint(&endpoint, EndpointUpdate::authentication(AuthScheme::OAuth2(token)))
        .await;

    let tab = workbench.active_tab().await.unwrap();
    let outcome = tab.execute(None).await.unwrap();
    assert!(matches!(outcome, QueryOutcome::Success { .. }), "{outcome:?}");

    let Some(AuthScheme::OAuth2(stored)) = workbench
        .endpoint_config(&endpoint)
        .await
        .and_then(|config| config.authentication)
    else {
        panic!("expected stored OAuth2 token");
    };
    assert_eq!(stored.access_token, "fresh");
    assert_eq!(stored.refresh_token.as_deref(), Some("old-refresh"));
    assert!(stored.expiry.unwrap() > Utc::now());
}

#[tokio::test]
async fn test_http_error_is_reported_and_not_cached_as_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("login required"))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let workbench = open(&dir, &format!("{}/sparql", server.uri())).await;
    let tab = workbench.active_tab().await.unwrap();

    let outcome = tab.execute(None).await.unwrap();

    let QueryOutcome::Failed { error, .. } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(error.status, Some(401));
    assert_eq!(error.text.as_deref(), Some("login required"));
    let state = workbench.snapshot().await;
    assert!(state.tab(tab.id()).unwrap().last_response_summary.is_none());
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_connectivity_failure() {
    let dir = TempDir::new().unwrap();
    let workbench = open(&dir, "http://127.0.0.1:1/sparql").await;
    let tab = workbench.active_tab().await.unwrap();

    let outcome = tab.execute(None).await.unwrap();

    let QueryOutcome::Failed { error, .. } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(error.status, None);
}
