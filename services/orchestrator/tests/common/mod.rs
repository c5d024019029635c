//! Test doubles: a fake Ollama-compatible runtime served over real HTTP, and
//! an in-memory provider whose downloads wait for a gate.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

use llm_orchestrator::commands::CommandBoundary;
use llm_orchestrator::config::AppConfig;
use llm_orchestrator::error::RuntimeError;
use llm_orchestrator::host::RuntimeEndpoint;
use llm_orchestrator::provider::{LlmProvider, ProviderInfo, PullStream};
use llm_orchestrator::provider_ollama::OllamaProvider;
use llm_orchestrator::types::{EmbedResponse, GenerateRequest, GenerateResponse};
use modelops::{InstalledModel, InstalledModelSnapshot, ProvisioningProgress, PullPart};

pub const EMBED_MODEL: &str = "nomic-embed-text";
pub const GEN_MODEL: &str = "gemma3n:e2b-it-q4_K_M";
pub const MODELS: &str = "embedding=nomic-embed-text,generation=gemma3n:e2b-it-q4_K_M";

/// How the fake runtime answers `/api/pull` for one model.
#[derive(Clone, Debug)]
pub enum PullScript {
    /// Progress lines `(completed, total)`, then `success`.
    Succeed(Vec<(u64, u64)>),
    /// Progress lines, then the body closes without `success`.
    EndsEarly(Vec<(u64, u64)>),
    /// Non-2xx answer with `{"error": ..}`.
    HttpError(u16, String),
    /// A 200 stream carrying `{"error": ..}`.
    ErrorLine(String),
}

#[derive(Clone, Default)]
pub struct FakeRuntime {
    installed: Arc<Mutex<Vec<String>>>,
    pulls: Arc<Mutex<HashMap<String, PullScript>>>,
    reply: Arc<Mutex<String>>,
    embeddings: Arc<Mutex<Vec<Vec<f32>>>>,
    tags_delay: Arc<Mutex<Option<Duration>>>,
    tags_budget: Arc<Mutex<Option<usize>>>,
    pub tags_calls: Arc<AtomicUsize>,
    pub generate_calls: Arc<AtomicUsize>,
    pub pull_calls: Arc<AtomicUsize>,
}

impl FakeRuntime {
    pub fn new(installed: &[&str]) -> Self {
        let fake = Self::default();
        *fake.installed.lock().unwrap() = installed.iter().map(|s| s.to_string()).collect();
        *fake.reply.lock().unwrap() = "hello from the fake runtime".to_string();
        *fake.embeddings.lock().unwrap() = vec![vec![0.1, 0.2, 0.3]];
        fake
    }

    pub fn script_pull(&self, model: &str, script: PullScript) -> &Self {
        self.pulls.lock().unwrap().insert(model.to_string(), script);
        self
    }

    pub fn reply_with(&self, text: &str) -> &Self {
        *self.reply.lock().unwrap() = text.to_string();
        self
    }

    pub fn embed_with(&self, embeddings: Vec<Vec<f32>>) -> &Self {
        *self.embeddings.lock().unwrap() = embeddings;
        self
    }

    /// `/api/tags` holds every answer back this long.
    pub fn stall_listing(&self, delay: Duration) -> &Self {
        *self.tags_delay.lock().unwrap() = Some(delay);
        self
    }

    /// `/api/tags` answers normally `calls` times, then with HTTP 500.
    pub fn break_listing_after(&self, calls: usize) -> &Self {
        *self.tags_budget.lock().unwrap() = Some(calls);
        self
    }

    pub fn installed(&self) -> Vec<String> {
        self.installed.lock().unwrap().clone()
    }

    pub fn generations(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    /// Serves the fake on an ephemeral port; returns its base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/api/tags", get(tags))
            .route("/api/pull", post(pull))
            .route("/api/generate", post(generate))
            .route("/api/embed", post(embed))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}

#[derive(Deserialize)]
struct ModelBody {
    model: String,
}

async fn tags(State(fake): State<FakeRuntime>) -> Response {
    let call = fake.tags_calls.fetch_add(1, Ordering::SeqCst);
    let delay = *fake.tags_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let budget = *fake.tags_budget.lock().unwrap();
    if budget.is_some_and(|n| call >= n) {
        let body = Json(json!({ "error": "model index is corrupt" }));
        return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
    }

    let models: Vec<_> = fake
        .installed()
        .into_iter()
        .map(|name| json!({ "name": name, "model": name, "size": 1024 }))
        .collect();
    Json(json!({ "models": models })).into_response()
}

fn progress_lines(steps: &[(u64, u64)]) -> String {
    let mut body = String::from("{\"status\":\"pulling manifest\"}\n");
    for (completed, total) in steps {
        body.push_str(&json!({
            "status": "pulling abc123",
            "digest": "sha256:abc123",
            "total": total,
            "completed": completed,
        }).to_string());
        body.push('\n');
    }
    body
}

fn ndjson(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/x-ndjson")], body).into_response()
}

async fn pull(State(fake): State<FakeRuntime>, Json(req): Json<ModelBody>) -> Response {
    fake.pull_calls.fetch_add(1, Ordering::SeqCst);
    let script = fake
        .pulls
        .lock()
        .unwrap()
        .get(&req.model)
        .cloned()
        .unwrap_or(PullScript::Succeed(vec![(100, 100)]));

    match script {
        PullScript::Succeed(steps) => {
            let mut body = progress_lines(&steps);
            body.push_str("{\"status\":\"verifying sha256 digest\"}\n{\"status\":\"success\"}\n");
            fake.installed.lock().unwrap().push(format!("{}:latest", req.model));
            ndjson(body)
        }
        PullScript::EndsEarly(steps) => ndjson(progress_lines(&steps)),
        PullScript::HttpError(code, msg) => {
            let status = StatusCode::from_u16(code).unwrap();
            (status, Json(json!({ "error": msg }))).into_response()
        }
        PullScript::ErrorLine(msg) => {
            let mut body = progress_lines(&[]);
            body.push_str(&json!({ "error": msg }).to_string());
            body.push('\n');
            ndjson(body)
        }
    }
}

async fn generate(State(fake): State<FakeRuntime>, Json(req): Json<ModelBody>) -> Json<serde_json::Value> {
    fake.generate_calls.fetch_add(1, Ordering::SeqCst);
    let reply = fake.reply.lock().unwrap().clone();
    Json(json!({ "model": req.model, "response": reply, "done": true }))
}

async fn embed(State(fake): State<FakeRuntime>, Json(req): Json<ModelBody>) -> Json<serde_json::Value> {
    let embeddings = fake.embeddings.lock().unwrap().clone();
    Json(json!({ "model": req.model, "embeddings": embeddings }))
}

pub fn config(host: &str, models: &str) -> AppConfig {
    let host = host.to_string();
    let models = models.to_string();
    AppConfig::from_lookup(|key| match key {
        "LLM_HOST" => Some(host.clone()),
        "LLM_MODELS" => Some(models.clone()),
        "LLM_PROBE_TIMEOUT_MS" => Some("1000".to_string()),
        "LLM_REQUEST_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap()
}

/// Boundary over the real HTTP provider, pointed at `host`.
pub fn ollama_boundary(host: &str, models: &str) -> CommandBoundary {
    let cfg = config(host, models);
    let provider = OllamaProvider::new(cfg.request_timeout).unwrap();
    CommandBoundary::new(Arc::new(provider), &cfg)
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<ProvisioningProgress>) -> Vec<ProvisioningProgress> {
    let mut out = Vec::new();
    while let Ok(p) = rx.try_recv() {
        out.push(p);
    }
    out
}

/// Opened once; every download parked on it resumes.
#[derive(Default)]
pub struct Gate {
    open: AtomicBool,
    notify: Notify,
}

impl Gate {
    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.open.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }
}

/// In-memory runtime whose downloads block until the gate opens.
#[derive(Default)]
pub struct GatedProvider {
    installed: Arc<Mutex<Vec<String>>>,
    pub gate: Arc<Gate>,
    /// Park in `pull` itself, before any stream exists.
    park_on_connect: bool,
}

impl GatedProvider {
    pub fn new(installed: &[&str]) -> Self {
        let provider = Self::default();
        *provider.installed.lock().unwrap() = installed.iter().map(|s| s.to_string()).collect();
        provider
    }

    pub fn parked_on_connect(installed: &[&str]) -> Self {
        Self {
            park_on_connect: true,
            ..Self::new(installed)
        }
    }
}

struct GatedPull {
    model: String,
    installed: Arc<Mutex<Vec<String>>>,
    gate: Arc<Gate>,
    parts: Vec<PullPart>,
}

#[async_trait]
impl PullStream for GatedPull {
    async fn next_part(&mut self) -> Option<Result<PullPart, RuntimeError>> {
        self.gate.wait().await;
        if self.parts.is_empty() {
            return None;
        }
        let part = self.parts.remove(0);
        if part.is_success() {
            self.installed.lock().unwrap().push(self.model.clone());
        }
        Some(Ok(part))
    }
}

#[async_trait]
impl LlmProvider for GatedProvider {
    async fn list_models(&self, _endpoint: &RuntimeEndpoint) -> Result<InstalledModelSnapshot, RuntimeError> {
        let names = self.installed.lock().unwrap().clone();
        Ok(InstalledModelSnapshot::new(
            names.into_iter().map(InstalledModel::named).collect(),
        ))
    }

    async fn pull(&self, _endpoint: &RuntimeEndpoint, model: &str) -> Result<Box<dyn PullStream>, RuntimeError> {
        if self.park_on_connect {
            self.gate.wait().await;
        }
        Ok(Box::new(GatedPull {
            model: model.to_string(),
            installed: self.installed.clone(),
            gate: self.gate.clone(),
            parts: vec![PullPart::bytes(10, 10), PullPart::status("success")],
        }))
    }

    async fn generate(&self, _endpoint: &RuntimeEndpoint, _req: &GenerateRequest) -> Result<GenerateResponse, RuntimeError> {
        Err(RuntimeError::Stream("generate is not served here".to_string()))
    }

    async fn embed(&self, _endpoint: &RuntimeEndpoint, _model: &str, _input: &str) -> Result<EmbedResponse, RuntimeError> {
        Err(RuntimeError::Stream("embed is not served here".to_string()))
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "gated".to_string(),
        }
    }
}
