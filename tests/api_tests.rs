//! HTTP surface: routes, status mapping and history side effects.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use common::{failed, record, succeeded, token, FakeApi};
use line_sketch::api::{router, AppState};
use line_sketch::history::{HistoryStore, MemoryBackend};
use line_sketch::orchestrator::{JobOrchestrator, PollPolicy};
use line_sketch::PromptComposer;

const IMAGE: &str = "data:image/png;base64,iVBORw0KGgo=";

fn app(api: Arc<FakeApi>, policy: PollPolicy) -> (Router, Arc<HistoryStore>) {
    let history = Arc::new(HistoryStore::open(Box::new(MemoryBackend::new())).unwrap());
    let state = Arc::new(AppState {
        orchestrator: Arc::new(JobOrchestrator::new(api, policy, Some(token()))),
        history: history.clone(),
        composer: PromptComposer::new(),
        shutdown: CancellationToken::new(),
    });
    (router(state), history)
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()));
    (status, value)
}

#[tokio::test]
async fn generate_returns_output_and_records_history() {
    let api = Arc::new(FakeApi::new());
    api.push_create(Ok(succeeded("pred-1", &["https://x/out.webp"])));
    let (app, history) = app(api.clone(), PollPolicy::default());

    let body = json!({
        "imageDataUrl": IMAGE,
        "id": "job-1",
        "filename": "cat.png",
        "params": {"style": "modern-sketch", "lineThickness": "thick", "preserveShading": true},
    });
    let (status, value) = send(app, "POST", "/generate", Some(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);
    assert_eq!(value["output"], "https://x/out.webp");
    assert!(value.get("historyError").is_none());

    let stored = history.get("job-1").await.unwrap();
    assert_eq!(stored.filename, "cat.png");
    assert_eq!(stored.result_image_ref, "https://x/out.webp");
    assert_eq!(stored.params.style.key(), "modern");
}

#[tokio::test]
async fn missing_image_is_a_bad_request() {
    let api = Arc::new(FakeApi::new());
    let (app, history) = app(api.clone(), PollPolicy::default());

    let (status, value) = send(app, "POST", "/generate", Some(json!({"params": {}}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["category"], "validation");
    assert_eq!(value["retryable"], false);
    assert_eq!(api.creates(), 0);
    assert!(history.is_empty().await);
}

#[tokio::test]
async fn remote_failure_maps_to_500_and_skips_history() {
    let api = Arc::new(FakeApi::new());
    api.push_create(Ok(failed("pred-1", "nsfw content detected")));
    let (app, history) = app(api, PollPolicy::default());

    let (status, value) = send(app, "POST", "/generate", Some(json!({"imageDataUrl": IMAGE}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(value["details"], "nsfw content detected");
    assert!(history.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn exhausted_poll_budget_maps_to_408() {
    let api = Arc::new(FakeApi::new());
    let policy = PollPolicy { interval: Duration::from_secs(1), max_attempts: 3, query_retries: 0 };
    let (app, _) = app(api.clone(), policy);

    let (status, value) = send(app, "POST", "/generate", Some(json!({"imageDataUrl": IMAGE}))).await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(value["retryable"], true);
    assert_eq!(api.gets(), 3);
}

#[tokio::test]
async fn history_routes_list_get_and_delete() {
    let api = Arc::new(FakeApi::new());
    let (app, history) = app(api, PollPolicy::default());
    history.add(record("old", 1)).await.unwrap();
    history.add(record("new", 2)).await.unwrap();

    let (status, value) = send(app.clone(), "GET", "/history", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = value.as_array().unwrap().iter().map(|r| r["id"].as_str().unwrap().to_string()).collect();
    assert_eq!(ids, vec!["new", "old"]);

    let (status, value) = send(app.clone(), "GET", "/history/old", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["filename"], "old.png");

    let (status, value) = send(app.clone(), "DELETE", "/history/old", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["removed"], true);

    let (status, value) = send(app.clone(), "DELETE", "/history/old", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["removed"], false);

    let (status, _) = send(app.clone(), "GET", "/history/old", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(app, "DELETE", "/history", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(history.is_empty().await);
}

#[tokio::test]
async fn compose_route_matches_library_composer() {
    let api = Arc::new(FakeApi::new());
    let (app, _) = app(api, PollPolicy::default());

    let (status, value) = send(
        app,
        "POST",
        "/compose",
        Some(json!({"style": "pencil", "lineThickness": "thin", "preserveShading": false})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let expected = PromptComposer::new().compose(&serde_json::from_value(json!({"lineThickness": "thin"})).unwrap());
    assert_eq!(value["prompt"], expected.prompt);
}

#[tokio::test]
async fn token_verify_prefers_header_credential() {
    let api = Arc::new(FakeApi::new());
    let (app, _) = app(api, PollPolicy::default());

    let request = Request::builder()
        .method("POST")
        .uri("/token/verify")
        .header("x-replicate-api-key", "not-a-replicate-token")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["valid"], true);
    assert_eq!(value["formatOk"], false);
}

#[tokio::test]
async fn malformed_json_gets_the_validation_body() {
    let api = Arc::new(FakeApi::new());
    let (app, _) = app(api.clone(), PollPolicy::default());

    let body = json!({"imageDataUrl": IMAGE, "params": {"preserveShading": "yes"}});
    let (status, value) = send(app.clone(), "POST", "/generate", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["category"], "validation");
    assert_eq!(value["retryable"], false);
    assert!(value["details"].as_str().unwrap().contains("Invalid request body"));
    assert_eq!(api.creates(), 0);

    let (status, value) = send(app, "POST", "/compose", Some(json!({"preserveShading": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["category"], "validation");
}
