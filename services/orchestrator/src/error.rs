use thiserror::Error;

/// Failure talking to the runtime over the wire.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("runtime answered HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed runtime payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("stream error: {0}")]
    Stream(String),
}

impl RuntimeError {
    /// True when the runtime could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        match self {
            RuntimeError::Transport(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Cannot reach LLM runtime at {endpoint}")]
    RuntimeUnreachable { endpoint: String },

    #[error("Model registry unavailable at {endpoint}: {reason}")]
    RegistryUnavailable { endpoint: String, reason: String },

    #[error("Model {model} is not installed. Please download it first.")]
    ModelNotInstalled { model: String },

    #[error("Failed to download model {model}: {reason}")]
    DownloadFailed { model: String, reason: String },

    #[error("Unexpected response from LLM runtime: {0}")]
    UnexpectedRuntimeResponse(String),

    #[error("Initialisation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

impl OrchestratorError {
    /// Maps a dispatch failure from generate/embed into the taxonomy.
    pub(crate) fn from_dispatch(endpoint: &str, err: RuntimeError) -> Self {
        if err.is_unreachable() {
            OrchestratorError::RuntimeUnreachable {
                endpoint: endpoint.to_string(),
            }
        } else {
            OrchestratorError::UnexpectedRuntimeResponse(err.to_string())
        }
    }
}
