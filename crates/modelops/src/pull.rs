use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::ProvisioningProgress;

/// Status token the runtime sends once a pull has fully landed.
pub const PULL_SUCCESS: &str = "success";

/// One part of a streamed model download, as sent by the runtime.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PullPart {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub completed: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PullPart {
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::default()
        }
    }

    pub fn bytes(completed: u64, total: u64) -> Self {
        Self {
            status: Some("downloading".into()),
            total: Some(total),
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(PULL_SUCCESS)
    }

    /// `(downloaded, total)` when both counters are present and non-zero.
    pub fn byte_counts(&self) -> Option<(u64, u64)> {
        match (self.completed, self.total) {
            (Some(done), Some(total)) if done > 0 && total > 0 => Some((done, total)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PullEvent {
    Progress(ProvisioningProgress),
    /// Terminal; stop reading the stream.
    Succeeded(ProvisioningProgress),
    /// Terminal; the runtime reported an error inside the stream.
    Failed(String),
}

/// Turns the parts of one model's download into progress records.
#[derive(Clone, Debug)]
pub struct PullTracker {
    model: String,
    downloaded: u64,
    total: u64,
}

impl PullTracker {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            downloaded: 0,
            total: 0,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn started(&self) -> ProvisioningProgress {
        ProvisioningProgress::download_started(&self.model)
    }

    /// Parts without a byte-count pair produce no progress record.
    pub fn observe(&mut self, part: &PullPart) -> Vec<PullEvent> {
        if let Some(err) = &part.error {
            return vec![PullEvent::Failed(err.clone())];
        }

        let mut events = Vec::new();
        if let Some((done, total)) = part.byte_counts() {
            self.downloaded = done;
            self.total = total;
            events.push(PullEvent::Progress(ProvisioningProgress::downloading(
                &self.model,
                done,
                total,
            )));
        }

        if part.is_success() {
            let size = if self.total > 0 { self.total } else { self.downloaded };
            events.push(PullEvent::Succeeded(ProvisioningProgress::downloaded(
                &self.model,
                size,
                size,
            )));
        }
        events
    }

    pub fn failure(&self, reason: impl Display) -> ProvisioningProgress {
        ProvisioningProgress::download_failed(&self.model, self.downloaded, self.total, reason)
    }
}
