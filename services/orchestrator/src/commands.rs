//! The narrow surface a host application drives.
//!
//! Every command resolves to a `CommandResponse`; errors never escape as
//! `Err`. Provisioning progress goes out-of-band through the caller's sink.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use tracing::warn;

use crate::config::AppConfig;
use crate::gateway::InferenceGateway;
use crate::host::resolve_host;
use crate::probe::RuntimeProbe;
use crate::progress::ProgressSink;
use crate::provider::LlmProvider;
use crate::provisioning::ProvisioningOrchestrator;
use crate::questions::{GenerateQuestionOptions, GeneratedQuestion, QuestionGenerator};
use crate::registry::ModelRegistry;
use crate::runtime::RuntimeStatus;
use crate::types::GenerateRequest;

pub const QUESTIONS_UNAVAILABLE: &str = "Question generation is not available";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> CommandResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Display) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }

    pub fn from_result<E: Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e),
        }
    }
}

impl CommandResponse<()> {
    pub fn done() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }
}

pub struct CommandBoundary {
    orchestrator: Arc<ProvisioningOrchestrator>,
    gateway: InferenceGateway,
    questions: Option<Arc<dyn QuestionGenerator>>,
}

impl CommandBoundary {
    /// Wires probe, registry, orchestrator and gateway around one provider.
    pub fn new(provider: Arc<dyn LlmProvider>, cfg: &AppConfig) -> Self {
        let probe = RuntimeProbe::new(provider.clone(), cfg.probe_timeout);
        let registry = ModelRegistry::new(provider.clone(), probe.clone());
        let orchestrator = Arc::new(ProvisioningOrchestrator::new(
            registry,
            provider.info(),
            cfg.models.clone(),
            resolve_host(cfg.llm_host.as_deref()),
        ));
        let gateway = InferenceGateway::new(
            provider,
            probe,
            orchestrator.clone(),
            &cfg.embedding_model,
            &cfg.question_model,
            &cfg.preferred_question_model,
        );
        Self {
            orchestrator,
            gateway,
            questions: None,
        }
    }

    pub fn with_question_generator(mut self, generator: Arc<dyn QuestionGenerator>) -> Self {
        self.questions = Some(generator);
        self
    }

    pub fn orchestrator(&self) -> &Arc<ProvisioningOrchestrator> {
        &self.orchestrator
    }

    pub fn gateway(&self) -> &InferenceGateway {
        &self.gateway
    }

    /// Succeeds also when another initialisation is already running.
    pub async fn initialise(&self, host: Option<&str>, sink: &dyn ProgressSink) -> CommandResponse<()> {
        match self.orchestrator.init(host, sink).await {
            Ok(_) => CommandResponse::done(),
            Err(e) => CommandResponse::err(e),
        }
    }

    /// `data` tells whether a run was actually interrupted.
    pub async fn cancel_initialise(&self) -> CommandResponse<bool> {
        CommandResponse::ok(self.orchestrator.cancel().await)
    }

    pub async fn status(&self) -> RuntimeStatus {
        self.orchestrator.status().await
    }

    pub async fn generate(&self, req: &GenerateRequest) -> CommandResponse<String> {
        CommandResponse::from_result(self.gateway.generate(req).await)
    }

    pub async fn embed(&self, input: &str) -> CommandResponse<Vec<Vec<f32>>> {
        CommandResponse::from_result(self.gateway.embed(input).await)
    }

    pub async fn recommend_question_model(&self) -> CommandResponse<String> {
        CommandResponse::from_result(self.gateway.recommend_question_model().await)
    }

    pub async fn generate_questions(
        &self,
        subject_id: &str,
        options: &GenerateQuestionOptions,
    ) -> CommandResponse<Vec<GeneratedQuestion>> {
        let Some(generator) = &self.questions else {
            return CommandResponse::err(QUESTIONS_UNAVAILABLE);
        };
        match generator.generate_questions(&self.gateway, subject_id, options).await {
            Ok(questions) => CommandResponse::ok(questions),
            Err(e) => {
                warn!(subject_id, error = %e, "question generation failed");
                CommandResponse::err(format!("{e:#}"))
            }
        }
    }
}
