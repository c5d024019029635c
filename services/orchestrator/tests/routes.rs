mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use common::*;
use llm_orchestrator::state::AppState;

async fn app_for(host: &str) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(ollama_boundary(host, MODELS)));
    (llm_orchestrator::router(state.clone()), state)
}

async fn call(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_status_starts_idle() {
    let (app, _) = app_for("127.0.0.1:1").await;
    let (status, body) = call(&app, "GET", "/llm/status", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "idle");
    assert_eq!(body["endpoint"], "http://127.0.0.1:1");
    assert_eq!(body["provider"]["name"], "ollama");
    assert!(body["last_run"].is_null());
}

#[tokio::test]
async fn test_init_without_body_uses_configured_host() {
    let fake = FakeRuntime::new(&["nomic-embed-text", GEN_MODEL]);
    let host = fake.spawn().await;
    let (app, state) = app_for(&host).await;
    let mut progress = state.subscribe();

    let (status, body) = call(&app, "POST", "/llm/init", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let first = progress.recv().await.unwrap();
    assert_eq!(first.status, format!("Connecting to LLM runtime at {host}"));

    let (_, body) = call(&app, "GET", "/llm/status", None).await;
    assert_eq!(body["state"], "running");
    assert_eq!(body["last_progress"]["stage"], "completed");
}

#[tokio::test]
async fn test_init_switches_host() {
    let fake = FakeRuntime::new(&["nomic-embed-text", GEN_MODEL]);
    let host = fake.spawn().await;
    let (app, _) = app_for("127.0.0.1:1").await;

    let (_, body) = call(&app, "POST", "/llm/init", Some(json!({}))).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("Cannot reach LLM runtime"));

    let (_, body) = call(&app, "POST", "/llm/init", Some(json!({ "host": host }))).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_generate_and_embed_routes() {
    let fake = FakeRuntime::new(&["nomic-embed-text", GEN_MODEL]);
    fake.reply_with("pong");
    let host = fake.spawn().await;
    let (app, _) = app_for(&host).await;

    let (_, body) = call(
        &app,
        "POST",
        "/llm/generate",
        Some(json!({ "model": GEN_MODEL, "prompt": "ping" })),
    )
    .await;
    assert_eq!(body, json!({ "success": true, "data": "pong" }));

    let (_, body) = call(&app, "POST", "/llm/generate", Some(json!({ "model": "ghost", "prompt": "x" }))).await;
    assert_eq!(body["success"], false);
    assert!(body.get("data").is_none());

    let (_, body) = call(&app, "POST", "/llm/embed", Some(json!({ "input": "hello" }))).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0].as_array().unwrap().len(), 3);

    let (_, body) = call(&app, "GET", "/llm/question-model", None).await;
    assert_eq!(body["data"], GEN_MODEL);
}

#[tokio::test]
async fn test_cancel_and_questions_without_work() {
    let (app, _) = app_for("127.0.0.1:1").await;

    let (_, body) = call(&app, "POST", "/llm/cancel", None).await;
    assert_eq!(body, json!({ "success": true, "data": false }));

    let (_, body) = call(&app, "POST", "/llm/questions", Some(json!({ "subject_id": "s1" }))).await;
    assert_eq!(
        body,
        json!({ "success": false, "error": "Question generation is not available" })
    );
}
