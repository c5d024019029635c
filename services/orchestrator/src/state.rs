use modelops::ProvisioningProgress;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::commands::CommandBoundary;

pub type SharedState = Arc<AppState>;

/// Slow SSE subscribers that fall this far behind skip records.
const PROGRESS_BUFFER: usize = 256;

pub struct AppState {
    pub commands: CommandBoundary,
    pub progress: broadcast::Sender<ProvisioningProgress>,
}

impl AppState {
    pub fn new(commands: CommandBoundary) -> Self {
        let (progress, _) = broadcast::channel(PROGRESS_BUFFER);
        Self { commands, progress }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProvisioningProgress> {
        self.progress.subscribe()
    }
}
