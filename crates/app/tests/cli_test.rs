//! Command line tests against a mock SPARQL endpoint.
//!
//! Each invocation opens the session from the data directory, like separate
//! runs of the binary would.

#![allow(clippy::unwrap_used)]

use clap::Parser;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use workbench::{Args, run};

const RESULTS: &str = r#"{"head":{"vars":["s"]},"results":{"bindings":[]}}"#;

struct Harness {
    dir: TempDir,
    endpoint: String,
}

impl Harness {
    fn new(server: &MockServer) -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            endpoint: format!("{}/sparql", server.uri()),
        }
    }

    /// Runs one command and returns its success flag and output.
    async fn run(&self, command: &[&str]) -> (bool, String) {
        let data_dir = self.dir.path().join("data");
        let settings = self.dir.path().join("settings.json");
        let mut argv = vec![
            "workbench".to_string(),
            "--data-dir".to_string(),
            data_dir.display().to_string(),
            "--settings".to_string(),
            settings.display().to_string(),
            "--default-endpoint".to_string(),
            self.endpoint.clone(),
        ];
        argv.extend(command.iter().map(ToString::to_string));
        let args = Args::try_parse_from(argv).unwrap();
        let mut out = Vec::new();
        let ok = run(args, &mut out).await.unwrap();
        (ok, String::from_utf8(out).unwrap())
    }
}

async fn mount_select(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/sparql"))
        .and(body_string_contains("query=SELECT"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/sparql-results+json")
                .set_body_string(RESULTS),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_query_is_kept_for_the_next_run() {
    let server = MockServer::start().await;
    mount_select(&server, 2).await;
    let harness = Harness::new(&server);

    let (ok, out) = harness
        .run(&["query", "SELECT ?s WHERE { ?s ?p ?o }"])
        .await;
    assert!(ok);
    assert_eq!(out, format!("{RESULTS}\n"));

    // No query text reruns what the tab holds
    let (ok, out) = harness.run(&["query"]).await;
    assert!(ok);
    assert_eq!(out, format!("{RESULTS}\n"));

    let (_, tabs) = harness.run(&["tabs"]).await;
    let lines: Vec<&str> = tabs.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("* "));
    assert!(lines[0].contains(&harness.endpoint));
    assert!(lines[0].ends_with(" ms"));
}

#[tokio::test]
async fn test_curl_is_printed_before_results() {
    let server = MockServer::start().await;
    mount_select(&server, 1).await;
    let harness = Harness::new(&server);

    let (ok, out) = harness
        .run(&["query", "--curl", "SELECT * WHERE { ?s ?p ?o }"])
        .await;
    assert!(ok);
    let first = out.lines().next().unwrap();
    assert!(first.starts_with("curl "));
    assert!(first.contains("/sparql"));
}

#[tokio::test]
async fn test_http_error_reports_guidance() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&server)
        .await;
    let harness = Harness::new(&server);

    let (ok, out) = harness.run(&["query", "ASK {}"]).await;
    assert!(!ok);
    assert!(out.starts_with("Error: 500"));
    assert!(out.contains("backend exploded"));
    assert!(out.contains("  - "));
}

#[tokio::test]
async fn test_construct_expectations() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sparql"))
        .and(header_regex("Accept", "^application/n-triples"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/n-triples")
                .set_body_string("<http://ex.org/s> <http://ex.org/p> \"o\" .\n"),
        )
        .mount(&server)
        .await;
    let harness = Harness::new(&server);
    let query = "CONSTRUCT { ?s ?p ?o } WHERE { ?s ?p ?o }";

    let (ok, out) = harness
        .run(&["query", query, "--expect", "<http://ex.org/s> http://ex.org/* *"])
        .await;
    assert!(ok);
    assert!(out.contains("PASS http://ex.org/s http://ex.org/* *: 1 matching"));

    let (ok, out) = harness
        .run(&["query", query, "--expect", "* * missing"])
        .await;
    assert!(!ok);
    assert!(out.contains("FAIL * * missing: 0 matching"));
}

#[tokio::test]
async fn test_registered_bearer_token_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sparql"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS))
        .expect(1)
        .mount(&server)
        .await;
    let harness = Harness::new(&server);

    let endpoint = harness.endpoint.clone();
    let (ok, _) = harness
        .run(&["endpoint", "set", &endpoint, "--label", "Mock", "--bearer", "secret"])
        .await;
    assert!(ok);
    let (_, list) = harness.run(&["endpoint", "list"]).await;
    assert_eq!(list, format!("{endpoint}\tMock\tbearer\n"));

    let (ok, _) = harness.run(&["query", "ASK {}"]).await;
    assert!(ok);
}

#[tokio::test]
async fn test_close_and_restore_tab() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server);

    let (_, new_id) = harness.run(&["new-tab", "--name", "Second"]).await;
    let new_id = new_id.trim().to_string();
    let (_, tabs) = harness.run(&["tabs"]).await;
    assert_eq!(tabs.lines().count(), 2);

    let (ok, out) = harness.run(&["close-tab"]).await;
    assert!(ok);
    assert_eq!(out, format!("Closed Second ({new_id})\n"));
    let (_, tabs) = harness.run(&["tabs"]).await;
    assert_eq!(tabs.lines().count(), 1);

    let (ok, restored) = harness.run(&["restore-tab"]).await;
    assert!(ok);
    assert_eq!(restored.trim(), new_id);
    let (ok, _) = harness.run(&["restore-tab"]).await;
    assert!(!ok);
}

#[tokio::test]
async fn test_export_and_import_turtle() {
    let server = MockServer::start().await;
    let source = Harness::new(&server);
    let (_, id) = source.run(&["new-tab", "--name", "Exported"]).await;
    let file = source.dir.path().join("session.ttl");
    let (ok, _) = source
        .run(&["export", "--output", &file.display().to_string()])
        .await;
    assert!(ok);
    let turtle = std::fs::read_to_string(&file).unwrap();
    assert!(turtle.contains("yasgui:Configuration"));

    let target = Harness::new(&server);
    let (ok, out) = target
        .run(&["import", &file.display().to_string()])
        .await;
    assert!(ok);
    assert_eq!(out, "Imported 2 new tabs\n");
    let (_, tabs) = target.run(&["tabs"]).await;
    assert!(tabs.contains(id.trim()));
    assert!(tabs.contains("Exported"));
}

#[tokio::test]
async fn test_settings_are_saved_with_overrides() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server);

    let (ok, out) = harness.run(&["settings", "--save"]).await;
    assert!(ok);
    assert!(out.contains(&harness.endpoint));
    let saved = std::fs::read_to_string(harness.dir.path().join("settings.json")).unwrap();
    assert!(saved.contains("\"defaultEndpoint\""));
}
