use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use llm_orchestrator::commands::CommandBoundary;
use llm_orchestrator::config::AppConfig;
use llm_orchestrator::provider_ollama::OllamaProvider;
use llm_orchestrator::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env()?;

    let provider = OllamaProvider::new(cfg.request_timeout).context("Failed to build LLM runtime client")?;
    let commands = CommandBoundary::new(Arc::new(provider), &cfg);
    let app_state = Arc::new(AppState::new(commands));

    if cfg.auto_init {
        let shared = app_state.clone();
        tokio::spawn(async move {
            let resp = shared.commands.initialise(None, &shared.progress).await;
            if let Some(error) = resp.error {
                warn!(%error, "automatic LLM runtime initialisation failed");
            }
        });
    }

    let app = llm_orchestrator::router(app_state);

    let addr = &cfg.bind_addr;
    info!(%addr, "orchestrator listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
