use crate::{ModelOpsError, ModelRole, Result};
use serde::{Deserialize, Serialize};

/// Role table the application ships with.
pub const DEFAULT_MODEL_ROLES: &str = "embedding=nomic-embed-text,generation=gemma3n:e2b-it-q4_K_M,question_generation=gemma3n:e2b-it-q4_K_M";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequirement {
    pub role: ModelRole,
    pub model: String,
}

/// Models that must be installed before the application is usable.
///
/// Built once from the role table. `models()` is de-duplicated and keeps
/// first-seen order, so two roles sharing a model cause one download.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredModelSet {
    requirements: Vec<ModelRequirement>,
    models: Vec<String>,
}

impl RequiredModelSet {
    pub fn from_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = (ModelRole, S)>,
        S: Into<String>,
    {
        let requirements: Vec<ModelRequirement> = roles
            .into_iter()
            .map(|(role, model)| ModelRequirement {
                role,
                model: model.into(),
            })
            .collect();

        let mut models: Vec<String> = Vec::with_capacity(requirements.len());
        for req in &requirements {
            if !models.iter().any(|m| m == &req.model) {
                models.push(req.model.clone());
            }
        }

        Self {
            requirements,
            models,
        }
    }

    /// Parses `role=model` pairs separated by commas.
    pub fn parse(table: &str) -> Result<Self> {
        let mut roles = Vec::new();
        for entry in table.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (role, model) = entry
                .split_once('=')
                .ok_or_else(|| ModelOpsError::MalformedEntry(entry.to_string()))?;
            let role: ModelRole = role.parse()?;
            let model = model.trim();
            if model.is_empty() {
                return Err(ModelOpsError::EmptyModel(role));
            }
            roles.push((role, model.to_string()));
        }
        if roles.is_empty() {
            return Err(ModelOpsError::NoModels);
        }
        Ok(Self::from_roles(roles))
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn requirements(&self) -> &[ModelRequirement] {
        &self.requirements
    }

    /// First model configured for `role`.
    pub fn model_for(&self, role: ModelRole) -> Option<&str> {
        self.requirements
            .iter()
            .find(|r| r.role == role)
            .map(|r| r.model.as_str())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
