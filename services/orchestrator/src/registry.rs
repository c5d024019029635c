use modelops::{InstalledModelSnapshot, PullEvent, PullTracker};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{OrchestratorError, Result};
use crate::host::RuntimeEndpoint;
use crate::probe::RuntimeProbe;
use crate::progress::ProgressSink;
use crate::provider::LlmProvider;

/// Lists installed models and drives streamed downloads.
#[derive(Clone)]
pub struct ModelRegistry {
    provider: Arc<dyn LlmProvider>,
    probe: RuntimeProbe,
}

impl ModelRegistry {
    pub fn new(provider: Arc<dyn LlmProvider>, probe: RuntimeProbe) -> Self {
        Self { provider, probe }
    }

    pub fn probe(&self) -> &RuntimeProbe {
        &self.probe
    }

    /// Always a fresh listing; fails if the probe fails first.
    pub async fn list_installed(&self, endpoint: &RuntimeEndpoint) -> Result<InstalledModelSnapshot> {
        if !self.probe.is_reachable(endpoint).await {
            return Err(OrchestratorError::RegistryUnavailable {
                endpoint: endpoint.to_string(),
                reason: "runtime did not answer the reachability probe".to_string(),
            });
        }
        self.provider
            .list_models(endpoint)
            .await
            .map_err(|e| OrchestratorError::RegistryUnavailable {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
    }

    /// Downloads `model`, forwarding progress to `sink`.
    ///
    /// Stops reading at the success token. Every failure, including a stream
    /// that closes without the success token, emits one `download_failed`
    /// record and returns `DownloadFailed` (or `Cancelled`). No retries.
    pub async fn download_model(
        &self,
        endpoint: &RuntimeEndpoint,
        model: &str,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut tracker = PullTracker::new(model);
        sink.emit(tracker.started());
        info!(endpoint = %endpoint, model, "downloading model");

        let started = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(model, "model download cancelled before the stream opened");
                sink.emit(tracker.failure(OrchestratorError::Cancelled));
                return Err(OrchestratorError::Cancelled);
            }
            started = self.provider.pull(endpoint, model) => started,
        };

        let mut stream = match started {
            Ok(stream) => stream,
            Err(e) => {
                warn!(model, error = %e, "failed to start model download");
                return Err(fail(sink, &tracker, e.to_string()));
            }
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(model, "model download cancelled");
                    sink.emit(tracker.failure(OrchestratorError::Cancelled));
                    return Err(OrchestratorError::Cancelled);
                }
                next = stream.next_part() => next,
            };

            let part = match next {
                Some(Ok(part)) => part,
                Some(Err(e)) => {
                    warn!(model, error = %e, "model download stream failed");
                    return Err(fail(sink, &tracker, e.to_string()));
                }
                None => {
                    warn!(model, "model download stream ended without success");
                    return Err(fail(
                        sink,
                        &tracker,
                        "stream ended before the runtime reported success".to_string(),
                    ));
                }
            };

            for event in tracker.observe(&part) {
                match event {
                    PullEvent::Progress(p) => sink.emit(p),
                    PullEvent::Succeeded(p) => {
                        sink.emit(p);
                        info!(model, "model downloaded successfully");
                        return Ok(());
                    }
                    PullEvent::Failed(reason) => {
                        warn!(model, reason = %reason, "runtime reported a download error");
                        return Err(fail(sink, &tracker, reason));
                    }
                }
            }
        }
    }
}

fn fail(sink: &dyn ProgressSink, tracker: &PullTracker, reason: String) -> OrchestratorError {
    let err = OrchestratorError::DownloadFailed {
        model: tracker.model().to_string(),
        reason,
    };
    sink.emit(tracker.failure(&err));
    err
}
