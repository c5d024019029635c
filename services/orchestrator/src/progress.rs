use modelops::ProvisioningProgress;
use tokio::sync::{broadcast, mpsc};

/// Receives provisioning progress in the exact order it is produced.
///
/// `emit` is called inline by the producing step and must not block;
/// delivery is fire-and-forget.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, progress: ProvisioningProgress);
}

impl ProgressSink for mpsc::UnboundedSender<ProvisioningProgress> {
    fn emit(&self, progress: ProvisioningProgress) {
        // receiver gone: nobody is listening any more
        let _ = self.send(progress);
    }
}

impl ProgressSink for broadcast::Sender<ProvisioningProgress> {
    fn emit(&self, progress: ProvisioningProgress) {
        // no subscribers is fine
        let _ = self.send(progress);
    }
}

/// Adapts a closure.
pub struct FnSink<F>(pub F);

impl<F> ProgressSink for FnSink<F>
where
    F: Fn(ProvisioningProgress) + Send + Sync,
{
    fn emit(&self, progress: ProvisioningProgress) {
        (self.0)(progress)
    }
}
