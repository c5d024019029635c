use crate::ModelRole;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelOpsError {
    #[error("unknown model role: {0}")]
    UnknownRole(String),
    #[error("expected `role=model`, got `{0}`")]
    MalformedEntry(String),
    #[error("no model given for role {0}")]
    EmptyModel(ModelRole),
    #[error("no required models configured")]
    NoModels,
}

pub type Result<T> = std::result::Result<T, ModelOpsError>;
