//! Full runs against mock feed, completion, and contents API servers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use newsdesk_core::{LiveServices, PipelineConfig, RunOutcome, SilentProgress, run_pipeline};
use newsdesk_shared::{AppConfig, Credentials, MarkerPolicy, NewsdeskError};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const RSS: &str = include_str!("../../../../fixtures/feeds/rss_three_items.xml");
const ATOM: &str = include_str!("../../../../fixtures/feeds/atom_two_entries.xml");
const EXISTING_PAGE: &str = include_str!("../../../../fixtures/pages/existing_index.html");

fn app_config(server: &MockServer, policy: MarkerPolicy) -> AppConfig {
    let mut config = AppConfig::default();
    config.openai.base_url = format!("{}/v1", server.uri());
    config.github.api_base = server.uri();
    config.defaults.timeout_secs = 5;
    config.page.marker_policy = policy;
    config
}

fn credentials() -> Credentials {
    Credentials {
        openai_api_key: "sk-test".into(),
        github_token: "ghp_test".into(),
    }
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "choices": [ { "message": { "role": "assistant", "content": content } } ]
    }))
}

async fn mount_feeds(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/feeds/rss"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(RSS, "application/rss+xml"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feeds/atom"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ATOM, "application/atom+xml"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feeds/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(server)
        .await;
}

async fn mount_completions(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("articles/benchmark"))
        .respond_with(completion("<article>benchmark</article>"))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("articles/seed-round"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("tech.example.org/foldable"))
        .respond_with(completion("<article>foldable</article>"))
        .expect(1)
        .mount(server)
        .await;
}

/// Decoded `content` of the single PUT the server received.
async fn written_page(server: &MockServer) -> serde_json::Value {
    let requests: Vec<Request> = server.received_requests().await.unwrap_or_default();
    let puts: Vec<&Request> = requests
        .iter()
        .filter(|r| r.method.as_str() == "PUT")
        .collect();
    assert_eq!(puts.len(), 1, "exactly one write per run");
    let mut body: serde_json::Value = serde_json::from_slice(&puts[0].body).unwrap();
    let encoded = body["content"].as_str().unwrap().to_string();
    let decoded = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
    body["content"] = serde_json::Value::String(decoded);
    body
}

fn feeds(server: &MockServer) -> Vec<String> {
    vec![
        format!("{}/feeds/down", server.uri()),
        format!("{}/feeds/rss", server.uri()),
        format!("{}/feeds/atom", server.uri()),
    ]
}

#[tokio::test]
async fn run_updates_existing_page() {
    let server = MockServer::start().await;
    mount_feeds(&server).await;
    mount_completions(&server).await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/site/contents/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sha": "sha-0",
            "encoding": "base64",
            "content": STANDARD.encode(EXISTING_PAGE),
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/repos/octo/site/contents/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let app = app_config(&server, MarkerPolicy::Consume);
    let live =
        LiveServices::from_config(&app, &credentials(), "octo/site".parse().unwrap()).unwrap();
    let config = PipelineConfig::new(&feeds(&server), &app);

    let report = run_pipeline(live.services(), &config, &SilentProgress)
        .await
        .unwrap();

    assert_eq!(report.feed_failures.len(), 1);
    assert!(report.feed_failures[0].is_transient());
    assert_eq!(report.collected, 4);
    assert_eq!(report.attempted, 3);
    assert_eq!(report.summarized, 2);
    assert!(report.published());

    let body = written_page(&server).await;
    assert_eq!(body["sha"], "sha-0");
    assert_eq!(body["message"], "Update news");

    let (prefix, suffix) = EXISTING_PAGE.split_once("<!-- NEW_ARTICLES -->").unwrap();
    assert_eq!(
        body["content"],
        format!("{prefix}\n<article>benchmark</article>\n<article>foldable</article>\n{suffix}")
    );
}

#[tokio::test]
async fn first_run_creates_page_from_template() {
    let server = MockServer::start().await;
    mount_feeds(&server).await;
    mount_completions(&server).await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/site/contents/index.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/repos/octo/site/contents/index.html"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let app = app_config(&server, MarkerPolicy::Retain);
    let live =
        LiveServices::from_config(&app, &credentials(), "octo/site".parse().unwrap()).unwrap();
    let config = PipelineConfig::new(&feeds(&server), &app);

    let report = run_pipeline(live.services(), &config, &SilentProgress)
        .await
        .unwrap();
    assert!(matches!(report.outcome, RunOutcome::Published(_)));

    let body = written_page(&server).await;
    assert!(body.get("sha").is_none());
    assert_eq!(body["message"], "Init site");

    let html = body["content"].as_str().unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<!-- NEW_ARTICLES -->\n<article>benchmark</article>"));
    assert!(html.ends_with("<article>foldable</article>\n</main></body></html>"));
}

#[tokio::test]
async fn stale_version_fails_the_run() {
    let server = MockServer::start().await;
    mount_feeds(&server).await;
    mount_completions(&server).await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/site/contents/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sha": "sha-0",
            "content": STANDARD.encode(EXISTING_PAGE),
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "message": "index.html does not match sha-0"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_config(&server, MarkerPolicy::Retain);
    let live =
        LiveServices::from_config(&app, &credentials(), "octo/site".parse().unwrap()).unwrap();
    let config = PipelineConfig::new(&feeds(&server), &app);

    let err = run_pipeline(live.services(), &config, &SilentProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, NewsdeskError::Conflict { .. }));
}
