use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ModelOpsError;

/// The job a model does for the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    Embedding,
    Generation,
    QuestionGeneration,
}

impl ModelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::Embedding => "embedding",
            ModelRole::Generation => "generation",
            ModelRole::QuestionGeneration => "question_generation",
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelRole {
    type Err = ModelOpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "embedding" => Ok(ModelRole::Embedding),
            "generation" => Ok(ModelRole::Generation),
            "question_generation" => Ok(ModelRole::QuestionGeneration),
            other => Err(ModelOpsError::UnknownRole(other.to_string())),
        }
    }
}

/// One entry of the runtime's model listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstalledModel {
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

impl InstalledModel {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: None,
            size: None,
            digest: None,
            modified_at: None,
        }
    }
}

/// Models known to the runtime at one point in time. Never cached: the
/// runtime's installed set changes out-of-band.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InstalledModelSnapshot {
    #[serde(default)]
    pub models: Vec<InstalledModel>,
}

impl InstalledModelSnapshot {
    pub fn new(models: Vec<InstalledModel>) -> Self {
        Self { models }
    }

    /// Substring match, so `gemma3` is satisfied by `gemma3:latest`.
    pub fn contains(&self, model_id: &str) -> bool {
        self.models.iter().any(|m| m.name.contains(model_id))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
