use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::commands::CommandResponse;
use crate::state::SharedState;
use crate::types::GenerateRequest;

#[derive(Debug, Deserialize)]
pub struct EmbedReq {
    pub input: String,
}

pub async fn post_generate(
    State(state): State<SharedState>,
    Json(req): Json<GenerateRequest>,
) -> Json<CommandResponse<String>> {
    Json(state.commands.generate(&req).await)
}

pub async fn post_embed(
    State(state): State<SharedState>,
    Json(req): Json<EmbedReq>,
) -> Json<CommandResponse<Vec<Vec<f32>>>> {
    Json(state.commands.embed(&req.input).await)
}

pub async fn get_question_model(State(state): State<SharedState>) -> Json<CommandResponse<String>> {
    Json(state.commands.recommend_question_model().await)
}
