use modelops::{ProvisioningProgress, RequiredModelSet};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::{OrchestratorError, Result};
use crate::host::{resolve_host, RuntimeEndpoint};
use crate::progress::ProgressSink;
use crate::provider::ProviderInfo;
use crate::registry::ModelRegistry;
use crate::runtime::{ConnectionState, InitRun, RuntimeStatus};
use crate::types::InitOutcome;

/// Owns the connection state machine and the current runtime endpoint.
///
/// ```text
/// Idle         --init-->     Initialising --ok-->   Running
/// Initialising --failure-->  Idle
/// Running      --init-->     Initialising
/// Initialising --init-->     (no-op)
/// ```
///
/// State, token and run bookkeeping sit behind std mutexes that are never
/// held across an await, so they can also be released from `Drop`.
pub struct ProvisioningOrchestrator {
    registry: ModelRegistry,
    provider_info: ProviderInfo,
    required: RequiredModelSet,
    state: Mutex<ConnectionState>,
    /// Held while entering a run and while settling one, so a new run never
    /// starts between the final state change and the terminal record.
    transition: Mutex<()>,
    endpoint: RwLock<RuntimeEndpoint>,
    cancel: Mutex<Option<CancellationToken>>,
    last_run: Mutex<Option<InitRun>>,
    last_progress: Mutex<Option<ProvisioningProgress>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Forwards to the caller's sink and remembers the latest record.
struct RecordingSink<'a> {
    inner: &'a dyn ProgressSink,
    last: &'a Mutex<Option<ProvisioningProgress>>,
}

impl ProgressSink for RecordingSink<'_> {
    fn emit(&self, progress: ProvisioningProgress) {
        *lock(self.last) = Some(progress.clone());
        self.inner.emit(progress);
    }
}

/// Puts the machine back to `Idle` if a run is dropped before it settles,
/// e.g. an HTTP client hanging up on `/llm/init`.
struct RunGuard<'a> {
    orchestrator: &'a ProvisioningOrchestrator,
    armed: bool,
}

impl RunGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("initialisation abandoned before it finished");
        let o = self.orchestrator;
        if let Some(token) = lock(&o.cancel).take() {
            token.cancel();
        }
        if let Some(run) = lock(&o.last_run).as_mut() {
            run.finish(Some(ABANDONED.to_string()));
        }
        *lock(&o.state) = ConnectionState::Idle;
    }
}

const ABANDONED: &str = "Initialisation abandoned by the caller";

impl ProvisioningOrchestrator {
    pub fn new(
        registry: ModelRegistry,
        provider_info: ProviderInfo,
        required: RequiredModelSet,
        endpoint: RuntimeEndpoint,
    ) -> Self {
        Self {
            registry,
            provider_info,
            required,
            state: Mutex::new(ConnectionState::Idle),
            transition: Mutex::new(()),
            endpoint: RwLock::new(endpoint),
            cancel: Mutex::new(None),
            last_run: Mutex::new(None),
            last_progress: Mutex::new(None),
        }
    }

    pub async fn state(&self) -> ConnectionState {
        *lock(&self.state)
    }

    pub async fn endpoint(&self) -> RuntimeEndpoint {
        self.endpoint.read().await.clone()
    }

    pub fn last_progress(&self) -> Option<ProvisioningProgress> {
        lock(&self.last_progress).clone()
    }

    pub async fn status(&self) -> RuntimeStatus {
        let endpoint = self.endpoint().await;
        RuntimeStatus {
            state: *lock(&self.state),
            endpoint,
            provider: self.provider_info.clone(),
            last_run: lock(&self.last_run).clone(),
            last_progress: self.last_progress(),
        }
    }

    pub async fn init(&self, host: Option<&str>, sink: &dyn ProgressSink) -> Result<InitOutcome> {
        self.init_with_cancel(host, sink, CancellationToken::new()).await
    }

    /// Runs one provisioning pass. A blank or absent `host` keeps the
    /// current endpoint.
    ///
    /// Returns `AlreadyInitialising` without touching anything if another run
    /// is in flight. On failure the terminal record is emitted, the state goes
    /// back to `Idle` and the error is returned. Dropping the future midway
    /// also leaves the state `Idle`, without a terminal record.
    pub async fn init_with_cancel(
        &self,
        host: Option<&str>,
        sink: &dyn ProgressSink,
        cancel: CancellationToken,
    ) -> Result<InitOutcome> {
        {
            let _entering = lock(&self.transition);
            let mut state = lock(&self.state);
            if *state == ConnectionState::Initialising {
                info!("LLM runtime is already initialising");
                return Ok(InitOutcome::AlreadyInitialising);
            }
            *state = ConnectionState::Initialising;
        }
        let guard = RunGuard {
            orchestrator: self,
            armed: true,
        };

        let run = InitRun::start();
        let run_id = run.run_id;
        *lock(&self.last_run) = Some(run);
        *lock(&self.cancel) = Some(cancel.clone());

        let endpoint = {
            let mut current = self.endpoint.write().await;
            if let Some(host) = host.filter(|h| !h.trim().is_empty()) {
                *current = resolve_host(Some(host));
            }
            current.clone()
        };

        let sink = RecordingSink {
            inner: sink,
            last: &self.last_progress,
        };

        info!(%run_id, endpoint = %endpoint, "initialising LLM runtime");
        let result = self.provision(&endpoint, &sink, &cancel).await;

        let (next, terminal, run_error) = match &result {
            Ok(()) => {
                info!(%run_id, "LLM runtime initialisation complete");
                (ConnectionState::Running, ProvisioningProgress::completed(), None)
            }
            Err(e) => {
                error!(%run_id, error = %e, "LLM runtime initialisation failed");
                (ConnectionState::Idle, ProvisioningProgress::failed(e), Some(e.to_string()))
            }
        };

        *lock(&self.cancel) = None;
        if let Some(run) = lock(&self.last_run).as_mut() {
            run.finish(run_error);
        }
        {
            let _settling = lock(&self.transition);
            *lock(&self.state) = next;
            sink.emit(terminal);
        }
        guard.disarm();

        result.map(|()| InitOutcome::Completed)
    }

    /// Cancels the in-flight run. False when nothing is running.
    pub async fn cancel(&self) -> bool {
        match lock(&self.cancel).as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    async fn provision(
        &self,
        endpoint: &RuntimeEndpoint,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        sink.emit(ProvisioningProgress::connecting(endpoint.as_str()));

        if !self.registry.probe().is_reachable(endpoint).await {
            return Err(OrchestratorError::RuntimeUnreachable {
                endpoint: endpoint.to_string(),
            });
        }

        sink.emit(ProvisioningProgress::connected());
        sink.emit(ProvisioningProgress::checking_models());

        // Sequential on purpose: one download at a time, progress attributable
        // to one model. The listing is refetched per model since downloads
        // change it.
        let mut failures = Vec::new();
        for model in self.required.models() {
            if cancel.is_cancelled() {
                return Err(OrchestratorError::Cancelled);
            }

            let installed = self.registry.list_installed(endpoint).await?;
            if installed.contains(model) {
                info!(model = %model, "model already installed");
                sink.emit(ProvisioningProgress::already_installed(model));
                continue;
            }

            match self.registry.download_model(endpoint, model, sink, cancel).await {
                Ok(()) => {}
                Err(OrchestratorError::Cancelled) => return Err(OrchestratorError::Cancelled),
                Err(e) => failures.push(e),
            }
        }

        summarize(failures)
    }
}

fn summarize(mut failures: Vec<OrchestratorError>) -> Result<()> {
    match failures.len() {
        0 => Ok(()),
        1 => Err(failures.remove(0)),
        n => {
            let models: Vec<String> = failures
                .iter()
                .filter_map(|e| match e {
                    OrchestratorError::DownloadFailed { model, .. } => Some(model.clone()),
                    _ => None,
                })
                .collect();
            warn!(count = n, "several model downloads failed");
            Err(OrchestratorError::DownloadFailed {
                model: models.join(", "),
                reason: format!("{n} downloads failed"),
            })
        }
    }
}
