//! Provisions the configured models against a local runtime and prints every
//! progress record, then runs one generation.
//!
//! `cargo run -p provision-demo -- [host] [prompt]`

use anyhow::{bail, Context, Result};
use std::sync::Arc;

use llm_orchestrator::commands::CommandBoundary;
use llm_orchestrator::config::AppConfig;
use llm_orchestrator::progress::FnSink;
use llm_orchestrator::provider_ollama::OllamaProvider;
use llm_orchestrator::types::GenerateRequest;
use modelops::{ModelRole, ProvisioningProgress};

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let host = args.next();
    let prompt = args.next().unwrap_or_else(|| "Say hello in one sentence.".to_string());

    let cfg = AppConfig::from_env()?;
    let provider = OllamaProvider::new(cfg.request_timeout).context("Failed to build LLM runtime client")?;
    let commands = CommandBoundary::new(Arc::new(provider), &cfg);

    let sink = FnSink(|p: ProvisioningProgress| {
        let model = p.model.as_deref().unwrap_or("-");
        println!("[{:>3}%] {:<17} {:<28} {}", p.percentage, format!("{:?}", p.stage), model, p.status);
    });

    let resp = commands.initialise(host.as_deref(), &sink).await;
    if let Some(error) = resp.error {
        bail!("initialisation failed: {error}");
    }

    let model = cfg
        .models
        .model_for(ModelRole::Generation)
        .unwrap_or(cfg.question_model.as_str())
        .to_string();
    let out = commands.generate(&GenerateRequest::new(model, prompt)).await;
    match (out.data, out.error) {
        (Some(text), _) => println!("\n{text}"),
        (None, Some(error)) => bail!("generate failed: {error}"),
        (None, None) => bail!("generate returned nothing"),
    }

    Ok(())
}
