use async_trait::async_trait;
use modelops::{InstalledModelSnapshot, PullPart};

use crate::error::RuntimeError;
use crate::host::RuntimeEndpoint;
use crate::types::{EmbedResponse, GenerateRequest, GenerateResponse};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProviderInfo {
    pub name: String,
}

/// Parts of one streamed model download, pulled by the consumer.
#[async_trait]
pub trait PullStream: Send {
    /// `None` once the runtime closes the stream.
    async fn next_part(&mut self) -> Option<Result<PullPart, RuntimeError>>;
}

/// The four operations the orchestrator needs from an LLM runtime.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn list_models(&self, endpoint: &RuntimeEndpoint) -> Result<InstalledModelSnapshot, RuntimeError>;
    async fn pull(&self, endpoint: &RuntimeEndpoint, model: &str) -> Result<Box<dyn PullStream>, RuntimeError>;
    async fn generate(&self, endpoint: &RuntimeEndpoint, req: &GenerateRequest) -> Result<GenerateResponse, RuntimeError>;
    async fn embed(&self, endpoint: &RuntimeEndpoint, model: &str, input: &str) -> Result<EmbedResponse, RuntimeError>;
    fn info(&self) -> ProviderInfo;
}
