use anyhow::{bail, Context, Result};
use modelops::{ModelRole, RequiredModelSet, DEFAULT_MODEL_ROLES};
use std::time::Duration;

pub const DEFAULT_PREFERRED_QUESTION_MODEL: &str = "gemma3n:e4b-it-fp16";

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Raw host as configured; resolved by `host::resolve_host`.
    pub llm_host: Option<String>,
    pub bind_addr: String,
    pub probe_timeout: Duration,
    pub request_timeout: Duration,
    pub models: RequiredModelSet,
    /// Model behind `embed`.
    pub embedding_model: String,
    /// Question-generation model used when the preferred one is absent.
    pub question_model: String,
    pub preferred_question_model: String,
    pub auto_init: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let llm_host = lookup("LLM_HOST").filter(|h| !h.trim().is_empty());
        let bind_addr = lookup("ORCH_BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());

        let probe_ms = parse_u64(&lookup, "LLM_PROBE_TIMEOUT_MS", 3_000)?;
        let request_secs = parse_u64(&lookup, "LLM_REQUEST_TIMEOUT_SECS", 300)?;

        let roles = lookup("LLM_MODELS").unwrap_or_else(|| DEFAULT_MODEL_ROLES.to_string());
        let models = RequiredModelSet::parse(&roles).context("Invalid LLM_MODELS")?;
        let Some(embedding_model) = models.model_for(ModelRole::Embedding).map(str::to_string) else {
            bail!("LLM_MODELS must name an embedding model");
        };
        let Some(question_model) = models
            .model_for(ModelRole::QuestionGeneration)
            .or_else(|| models.model_for(ModelRole::Generation))
            .map(str::to_string)
        else {
            bail!("LLM_MODELS must name a generation or question_generation model");
        };

        let preferred_question_model = lookup("LLM_PREFERRED_QUESTION_MODEL")
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_PREFERRED_QUESTION_MODEL.to_string());

        let auto_init = lookup("LLM_AUTO_INIT")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
            .unwrap_or(false);

        // Tiny sanity checks (fail fast, fail loud)
        if probe_ms == 0 {
            bail!("LLM_PROBE_TIMEOUT_MS must be greater than zero");
        }
        if request_secs == 0 {
            bail!("LLM_REQUEST_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            llm_host,
            bind_addr,
            probe_timeout: Duration::from_millis(probe_ms),
            request_timeout: Duration::from_secs(request_secs),
            models,
            embedding_model,
            question_model,
            preferred_question_model,
            auto_init,
        })
    }
}

fn parse_u64<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a non-negative integer, got {v:?}")),
        None => Ok(default),
    }
}
