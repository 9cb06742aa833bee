//! Fan-in routing for index-recognition results.
//!
//! One consumer binds `index_task_results` per worker process and routes
//! each envelope to the orchestrator that fanned the requests out, keyed by
//! `task_id`. Results for unknown tasks (orchestrator finished, or another
//! worker owns the batch's deadline) are logged and acked.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;

use omr_domain::error::Result;
use omr_domain::ports::MessageHandler;
use omr_domain::registry::{IndexTaskResult, ResultEnvelope};

/// Routing table from `task_id` to the owning orchestrator's channel.
#[derive(Default)]
pub struct IndexResultRouter {
    channels: DashMap<i64, mpsc::UnboundedSender<IndexTaskResult>>,
}

impl IndexResultRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in a task's results. Must be called before the
    /// first request is fanned out so no result slips through.
    pub fn register(&self, task_id: i64) -> mpsc::UnboundedReceiver<IndexTaskResult> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.channels.insert(task_id, tx);
        rx
    }

    /// Drop a task's route. Idempotent.
    pub fn deregister(&self, task_id: i64) {
        self.channels.remove(&task_id);
    }

    /// Route one result. Returns `false` when no orchestrator is listening.
    pub fn route(&self, result: IndexTaskResult) -> bool {
        match self.channels.get(&result.task_id) {
            Some(tx) => tx.send(result).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl MessageHandler for IndexResultRouter {
    async fn handle(&self, body: &[u8]) -> Result<()> {
        let envelope: ResultEnvelope<IndexTaskResult> = serde_json::from_slice(body)?;
        match envelope.result {
            Some(result) if envelope.is_completed() => {
                let task_id = result.task_id;
                let sheet_id = result.sheet_id;
                if !self.route(result) {
                    omr_domain::warn!(
                        "index_router",
                        "Index result with no listening orchestrator",
                        &format!("task={task_id} sheet={sheet_id}")
                    );
                }
            }
            _ => {
                // A failed recognition never reaches a row; the sheet runs
                // into the fan-in deadline and is flagged index_timeout.
                omr_domain::warn!(
                    "index_router",
                    "Failed index task",
                    &format!(
                        "task={} error={}",
                        envelope.job_id,
                        envelope.error_message.as_deref().unwrap_or("unknown")
                    )
                );
            }
        }
        Ok(())
    }
}
