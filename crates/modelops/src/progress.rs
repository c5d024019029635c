use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Connecting,
    Connected,
    CheckingModels,
    AlreadyInstalled,
    DownloadStarted,
    Downloading,
    Downloaded,
    DownloadFailed,
    Completed,
    Failed,
}

/// One provisioning notification. Emitted per meaningful state change, never
/// per byte.
///
/// `completed` marks the terminal record of a whole initialisation run
/// (stage `Completed`, or `Failed` with an error). A single model finishing
/// its download is stage `Downloaded` at 100%.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningProgress {
    pub stage: ProgressStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub downloaded: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub percentage: u8,
    pub status: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `round(downloaded / total * 100)`, clamped to 0..=100. Zero total reads as 0%.
pub fn percentage(downloaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (downloaded as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

impl ProvisioningProgress {
    fn status_only(stage: ProgressStage, status: String) -> Self {
        Self {
            stage,
            model: None,
            downloaded: 0,
            total: 0,
            percentage: 0,
            status,
            completed: false,
            error: None,
        }
    }

    fn for_model(stage: ProgressStage, model: &str, downloaded: u64, total: u64, status: String) -> Self {
        Self {
            stage,
            model: Some(model.to_string()),
            downloaded,
            total,
            percentage: percentage(downloaded, total),
            status,
            completed: false,
            error: None,
        }
    }

    pub fn connecting(endpoint: &str) -> Self {
        Self::status_only(
            ProgressStage::Connecting,
            format!("Connecting to LLM runtime at {endpoint}"),
        )
    }

    pub fn connected() -> Self {
        Self::status_only(ProgressStage::Connected, "Connected to LLM runtime".into())
    }

    pub fn checking_models() -> Self {
        Self::status_only(ProgressStage::CheckingModels, "Checking required models".into())
    }

    pub fn already_installed(model: &str) -> Self {
        let mut p = Self::status_only(
            ProgressStage::AlreadyInstalled,
            format!("model {model} is already installed"),
        );
        p.model = Some(model.to_string());
        p
    }

    pub fn download_started(model: &str) -> Self {
        Self::for_model(
            ProgressStage::DownloadStarted,
            model,
            0,
            0,
            format!("starting model download {model}"),
        )
    }

    pub fn downloading(model: &str, downloaded: u64, total: u64) -> Self {
        Self::for_model(
            ProgressStage::Downloading,
            model,
            downloaded,
            total,
            format!("downloading model {model}"),
        )
    }

    pub fn downloaded(model: &str, downloaded: u64, total: u64) -> Self {
        let mut p = Self::for_model(
            ProgressStage::Downloaded,
            model,
            downloaded,
            total,
            format!("model {model} downloaded successfully"),
        );
        p.percentage = 100;
        p
    }

    pub fn download_failed(model: &str, downloaded: u64, total: u64, error: impl Display) -> Self {
        let mut p = Self::for_model(
            ProgressStage::DownloadFailed,
            model,
            downloaded,
            total,
            format!("model {model} download failed"),
        );
        p.error = Some(error.to_string());
        p
    }

    pub fn completed() -> Self {
        let mut p = Self::status_only(
            ProgressStage::Completed,
            "LLM runtime initialisation complete".into(),
        );
        p.completed = true;
        p
    }

    pub fn failed(error: impl Display) -> Self {
        let error = error.to_string();
        let mut p = Self::status_only(
            ProgressStage::Failed,
            format!("initialisation failed due to {error}"),
        );
        p.completed = true;
        p.error = Some(error);
        p
    }

    pub fn is_terminal(&self) -> bool {
        self.completed
    }
}
