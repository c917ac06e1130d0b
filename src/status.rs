//! Run status enum and the set-membership classifiers used across the UI.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Submitted,
    Queued,
    Downloading,
    Running,
    Uploading,
    Stopping,
    Stopped,
    Aborting,
    Aborted,
    Failed,
    Done,
    #[serde(other)]
    Unknown,
}

const FINISHED: &[RunStatus] = &[
    RunStatus::Stopped,
    RunStatus::Aborted,
    RunStatus::Failed,
    RunStatus::Done,
];

const RESUMABLE: &[RunStatus] = &[RunStatus::Stopped, RunStatus::Aborted];

const FAILED: &[RunStatus] = &[RunStatus::Failed, RunStatus::Aborted];

const RUNNING: &[RunStatus] = &[
    RunStatus::Submitted,
    RunStatus::Uploading,
    RunStatus::Downloading,
    RunStatus::Running,
    RunStatus::Queued,
];

/// Coarse colour class of a status, used for icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Success,
    Error,
    Warning,
    InProgress,
    Neutral,
}

impl RunStatus {
    pub const ALL: [RunStatus; 11] = [
        RunStatus::Submitted,
        RunStatus::Queued,
        RunStatus::Downloading,
        RunStatus::Running,
        RunStatus::Uploading,
        RunStatus::Stopping,
        RunStatus::Stopped,
        RunStatus::Aborting,
        RunStatus::Aborted,
        RunStatus::Failed,
        RunStatus::Done,
    ];

    pub fn is_finished(self) -> bool {
        FINISHED.contains(&self)
    }

    /// Stopped and aborted runs can be restarted from their last state.
    pub fn is_resumable(self) -> bool {
        RESUMABLE.contains(&self)
    }

    pub fn is_failed(self) -> bool {
        FAILED.contains(&self)
    }

    pub fn is_running(self) -> bool {
        RUNNING.contains(&self)
    }

    /// Wire name, as sent and received by the API.
    pub fn label(self) -> &'static str {
        match self {
            RunStatus::Submitted => "submitted",
            RunStatus::Queued => "queued",
            RunStatus::Downloading => "downloading",
            RunStatus::Running => "running",
            RunStatus::Uploading => "uploading",
            RunStatus::Stopping => "stopping",
            RunStatus::Stopped => "stopped",
            RunStatus::Aborting => "aborting",
            RunStatus::Aborted => "aborted",
            RunStatus::Failed => "failed",
            RunStatus::Done => "done",
            RunStatus::Unknown => "unknown",
        }
    }

    pub fn tone(self) -> StatusTone {
        match self {
            RunStatus::Done => StatusTone::Success,
            RunStatus::Failed => StatusTone::Error,
            RunStatus::Aborted | RunStatus::Aborting | RunStatus::Stopping => StatusTone::Warning,
            s if s.is_running() => StatusTone::InProgress,
            _ => StatusTone::Neutral,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        RunStatus::ALL
            .into_iter()
            .find(|st| st.label() == wanted)
            .ok_or_else(|| format!("unknown run status '{s}'"))
    }
}
