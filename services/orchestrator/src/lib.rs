//! Local LLM runtime connection lifecycle: probe, provision, infer.
//!
//! Library exports for the binary, the demo and the integration tests.

pub mod commands;
pub mod config;
pub mod error;
pub mod gateway;
pub mod host;
pub mod probe;
pub mod progress;
pub mod provider;
pub mod provider_ollama;
pub mod provisioning;
pub mod questions;
pub mod registry;
pub mod routes_inference;
pub mod routes_questions;
pub mod routes_runtime;
pub mod runtime;
pub mod state;
pub mod types;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::SharedState;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/llm/init", post(routes_runtime::post_init))
        .route("/llm/cancel", post(routes_runtime::post_cancel))
        .route("/llm/status", get(routes_runtime::get_status))
        .route("/llm/progress", get(routes_runtime::get_progress))
        .route("/llm/generate", post(routes_inference::post_generate))
        .route("/llm/embed", post(routes_inference::post_embed))
        .route("/llm/question-model", get(routes_inference::get_question_model))
        .route("/llm/questions", post(routes_questions::post_questions))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
