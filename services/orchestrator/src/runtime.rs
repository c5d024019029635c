use chrono::{DateTime, Utc};
use modelops::ProvisioningProgress;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::host::RuntimeEndpoint;
use crate::provider::ProviderInfo;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Idle,
    Initialising,
    Running,
}

/// Bookkeeping for the most recent `init` run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InitRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl InitRun {
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            error: None,
        }
    }

    pub fn finish(&mut self, error: Option<String>) {
        self.finished_at = Some(Utc::now());
        self.error = error;
    }
}

/// What a host shows when it asks "how is the runtime doing".
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuntimeStatus {
    pub state: ConnectionState,
    pub endpoint: RuntimeEndpoint,
    pub provider: ProviderInfo,
    pub last_run: Option<InitRun>,
    pub last_progress: Option<ProvisioningProgress>,
}
