use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::gateway::InferenceGateway;

fn default_count() -> u32 {
    5
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerateQuestionOptions {
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub question_types: Vec<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

impl Default for GenerateQuestionOptions {
    fn default() -> Self {
        Self {
            count: default_count(),
            difficulty: None,
            question_types: Vec::new(),
            topic: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

/// Downstream consumer that turns a subject into questions. It lives outside
/// this crate and calls back into the gateway for generation.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate_questions(
        &self,
        gateway: &InferenceGateway,
        subject_id: &str,
        options: &GenerateQuestionOptions,
    ) -> anyhow::Result<Vec<GeneratedQuestion>>;
}
