//! Domain events published on the in-process event bus.

use serde::{Deserialize, Serialize};

use crate::registry::JobKind;

/// Lifecycle and progress notifications. Observability only; no component
/// drives state transitions off the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A producer published a job to its input queue.
    JobQueued { kind: JobKind, job_id: i64 },
    /// A worker picked the job up.
    JobStarted { kind: JobKind, job_id: i64 },
    /// A result consumer applied a `completed` envelope.
    JobCompleted { kind: JobKind, job_id: i64 },
    /// A result consumer applied a `failed` envelope, or a producer failed
    /// to publish.
    JobFailed {
        kind: JobKind,
        job_id: i64,
        error: String,
    },
    /// The orchestrator scored one sheet of a batch.
    SheetScored {
        job_id: i64,
        sheet_id: u32,
        score: u32,
        flagged: bool,
    },
    /// An index-recognition result was applied to a spreadsheet row.
    IndexResolved {
        job_id: i64,
        sheet_id: u32,
        confidence: f64,
    },
}
