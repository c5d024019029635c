use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::commands::CommandResponse;
use crate::questions::{GenerateQuestionOptions, GeneratedQuestion};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct QuestionsReq {
    pub subject_id: String,
    #[serde(default)]
    pub options: GenerateQuestionOptions,
}

pub async fn post_questions(
    State(state): State<SharedState>,
    Json(req): Json<QuestionsReq>,
) -> Json<CommandResponse<Vec<GeneratedQuestion>>> {
    Json(state.commands.generate_questions(&req.subject_id, &req.options).await)
}
