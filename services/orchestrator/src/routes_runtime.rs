use async_stream::stream;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::commands::CommandResponse;
use crate::runtime::RuntimeStatus;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct InitReq {
    #[serde(default)]
    pub host: Option<String>,
}

/// Runs initialisation to the end; progress goes out on `/llm/progress`.
pub async fn post_init(
    State(state): State<SharedState>,
    body: Option<Json<InitReq>>,
) -> Json<CommandResponse<()>> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    Json(state.commands.initialise(req.host.as_deref(), &state.progress).await)
}

pub async fn post_cancel(State(state): State<SharedState>) -> Json<CommandResponse<bool>> {
    Json(state.commands.cancel_initialise().await)
}

pub async fn get_status(State(state): State<SharedState>) -> Json<RuntimeStatus> {
    Json(state.commands.status().await)
}

pub async fn get_progress(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.subscribe();

    let stream = stream! {
        loop {
            match rx.recv().await {
                Ok(progress) => match Event::default().event("progress").json_data(&progress) {
                    Ok(event) => yield Ok(event),
                    Err(e) => warn!(error = %e, "dropping unserialisable progress record"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "progress subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
