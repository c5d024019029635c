use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::host::RuntimeEndpoint;
use crate::provider::LlmProvider;

/// Reachability gate shared by provisioning, generate and embed.
///
/// Every caller re-probes; the runtime may start or stop between calls, so a
/// cached answer would go stale.
#[derive(Clone)]
pub struct RuntimeProbe {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl RuntimeProbe {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Lists models under a bounded timeout. Transport errors are logged, not returned.
    pub async fn is_reachable(&self, endpoint: &RuntimeEndpoint) -> bool {
        match tokio::time::timeout(self.timeout, self.provider.list_models(endpoint)).await {
            Ok(Ok(_)) => {
                debug!(endpoint = %endpoint, "runtime reachable");
                true
            }
            Ok(Err(e)) => {
                info!(endpoint = %endpoint, error = %e, "runtime is not reachable");
                false
            }
            Err(_) => {
                info!(endpoint = %endpoint, timeout_ms = self.timeout.as_millis() as u64, "runtime probe timed out");
                false
            }
        }
    }
}
