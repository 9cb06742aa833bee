//! Job lifecycle status shared by all four job kinds.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a job: `PENDING → QUEUED → PROCESSING →
/// {COMPLETED | FAILED | CANCELLED}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created but not yet submitted to the broker
    Pending,
    /// Published to the input queue, waiting for a worker
    Queued,
    /// A worker has picked the job up
    Processing,
    /// Terminal: result applied successfully
    Completed,
    /// Terminal: job failed
    Failed,
    /// Terminal: cancelled externally
    Cancelled,
}

impl JobStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` if the job is in a terminal state
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns `true` if the transition `self → next` is legal.
    ///
    /// Any non-terminal state may move to `Cancelled` (external API);
    /// terminal states accept nothing.
    #[must_use]
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (_, Self::Cancelled) => true,
            (Self::Pending, Self::Queued) => true,
            (Self::Pending, Self::Failed) => true,
            (Self::Queued, Self::Processing) => true,
            (Self::Queued, Self::Failed) => true,
            (Self::Processing, Self::Completed) => true,
            (Self::Processing, Self::Failed) => true,
            _ => false,
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "queued" => Ok(Self::Queued),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown job status: {s}")),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
