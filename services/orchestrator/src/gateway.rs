use modelops::InstalledModelSnapshot;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{OrchestratorError, Result};
use crate::host::RuntimeEndpoint;
use crate::probe::RuntimeProbe;
use crate::provider::LlmProvider;
use crate::provisioning::ProvisioningOrchestrator;
use crate::types::GenerateRequest;

/// Returned in place of an empty generation.
pub const EMPTY_GENERATION: &str = "No response from model";

/// Generate and embed, each gated on reachability and model presence.
///
/// No session state: every call re-probes and re-lists, so it is safe next to
/// a running provisioning pass. A `ModelNotInstalled` seen mid-provisioning
/// may clear up on retry.
#[derive(Clone)]
pub struct InferenceGateway {
    provider: Arc<dyn LlmProvider>,
    probe: RuntimeProbe,
    orchestrator: Arc<ProvisioningOrchestrator>,
    embedding_model: String,
    question_model: String,
    preferred_question_model: String,
}

impl InferenceGateway {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        probe: RuntimeProbe,
        orchestrator: Arc<ProvisioningOrchestrator>,
        embedding_model: impl Into<String>,
        question_model: impl Into<String>,
        preferred_question_model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            probe,
            orchestrator,
            embedding_model: embedding_model.into(),
            question_model: question_model.into(),
            preferred_question_model: preferred_question_model.into(),
        }
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub async fn generate(&self, req: &GenerateRequest) -> Result<String> {
        let endpoint = self.gate(&req.model).await?;
        info!(endpoint = %endpoint, model = %req.model, "generate");

        let resp = self.provider.generate(&endpoint, req).await.map_err(|e| {
            warn!(model = %req.model, error = %e, "generate failed");
            OrchestratorError::from_dispatch(endpoint.as_str(), e)
        })?;

        if resp.response.is_empty() {
            return Ok(EMPTY_GENERATION.to_string());
        }
        Ok(resp.response)
    }

    pub async fn embed(&self, input: &str) -> Result<Vec<Vec<f32>>> {
        let endpoint = self.gate(&self.embedding_model).await?;

        let resp = self
            .provider
            .embed(&endpoint, &self.embedding_model, input)
            .await
            .map_err(|e| {
                warn!(model = %self.embedding_model, error = %e, "embed failed");
                OrchestratorError::from_dispatch(endpoint.as_str(), e)
            })?;

        if resp.embeddings.is_empty() {
            return Err(OrchestratorError::UnexpectedRuntimeResponse(
                "runtime returned no embeddings".to_string(),
            ));
        }
        Ok(resp.embeddings)
    }

    /// The preferred question model when the runtime already has it, the
    /// configured one otherwise.
    pub async fn recommend_question_model(&self) -> Result<String> {
        let endpoint = self.reachable_endpoint().await?;
        let installed = self.installed(&endpoint).await?;
        if installed.contains(&self.preferred_question_model) {
            Ok(self.preferred_question_model.clone())
        } else {
            Ok(self.question_model.clone())
        }
    }

    async fn reachable_endpoint(&self) -> Result<RuntimeEndpoint> {
        let endpoint = self.orchestrator.endpoint().await;
        if !self.probe.is_reachable(&endpoint).await {
            return Err(OrchestratorError::RuntimeUnreachable {
                endpoint: endpoint.to_string(),
            });
        }
        Ok(endpoint)
    }

    async fn installed(&self, endpoint: &RuntimeEndpoint) -> Result<InstalledModelSnapshot> {
        self.provider
            .list_models(endpoint)
            .await
            .map_err(|e| OrchestratorError::RegistryUnavailable {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
    }

    async fn gate(&self, model: &str) -> Result<RuntimeEndpoint> {
        let endpoint = self.reachable_endpoint().await?;
        let installed = self.installed(&endpoint).await?;
        // an empty id would match every listing
        if model.trim().is_empty() || !installed.contains(model) {
            debug!(model, installed = ?installed.names().collect::<Vec<_>>(), "requested model is not installed");
            return Err(OrchestratorError::ModelNotInstalled {
                model: model.to_string(),
            });
        }
        Ok(endpoint)
    }
}
