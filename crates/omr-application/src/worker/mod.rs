//! Data-plane worker: consumers on the three input queues plus the
//! index-result router, each handler running its pipeline stage and always
//! publishing a result envelope before ack/nack.

mod handlers;

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use omr_domain::error::{Error, Result};
use omr_domain::events::DomainEvent;
use omr_domain::ports::{BrokerProvider, EventBusProvider, JobControlRepository, MessageHandler};
use omr_domain::registry::{JobKind, ResultEnvelope};

pub use handlers::{
    MarkingConfigHandler, MarkingJobHandler, TemplateConfigHandler, WorkerDeps,
};

use crate::QueueNames;
use crate::index_router::IndexResultRouter;

/// Publish a result envelope on the kind's result routing key. Results are
/// not priority-ordered.
pub(crate) async fn publish_result<T: Serialize + Send + Sync>(
    broker: &Arc<dyn BrokerProvider>,
    kind: JobKind,
    envelope: &ResultEnvelope<T>,
) -> Result<()> {
    let body = serde_json::to_vec(envelope)?;
    broker.publish(kind.result_routing_key(), body, 0).await
}

/// Shared handler skeleton: parse the request, stamp `Processing`, run the
/// stage, and publish exactly one envelope. Failures publish a `failed`
/// envelope first and then surface the error so the delivery is nacked.
pub(crate) async fn process_request<Req, Res, F, Fut>(
    body: &[u8],
    kind: JobKind,
    broker: &Arc<dyn BrokerProvider>,
    control: &Arc<dyn JobControlRepository>,
    events: &Arc<dyn EventBusProvider>,
    job_id_of: fn(&Req) -> i64,
    stage: F,
) -> Result<()>
where
    Req: DeserializeOwned,
    Res: Serialize + Send + Sync,
    F: FnOnce(Req) -> Fut,
    Fut: std::future::Future<Output = Result<Res>>,
{
    let request: Req = serde_json::from_slice(body)?;
    let job_id = job_id_of(&request);

    if let Err(e) = control.mark_processing(kind, job_id, Utc::now()).await {
        // The record may live in another deployment's database; processing
        // continues and the result consumer reconciles.
        omr_domain::warn!(
            "worker",
            "Could not stamp processing",
            &format!("{kind}:{job_id}: {e}")
        );
    }
    let _ = events
        .publish_event(DomainEvent::JobStarted { kind, job_id })
        .await;
    omr_domain::info!("worker", "Job picked up", &format!("{kind}:{job_id}"));

    match stage(request).await {
        Ok(result) => {
            publish_result(broker, kind, &ResultEnvelope::completed(job_id, result)).await?;
            omr_domain::info!("worker", "Job completed", &format!("{kind}:{job_id}"));
            Ok(())
        }
        Err(error) => {
            let envelope: ResultEnvelope<Res> = ResultEnvelope::failed(job_id, error.to_string());
            publish_result(broker, kind, &envelope).await?;
            omr_domain::error!(
                "worker",
                "Job failed",
                &format!("{kind}:{job_id}: {error}")
            );
            Err(error)
        }
    }
}

pub(crate) async fn check_cancelled(
    control: &Arc<dyn JobControlRepository>,
    kind: JobKind,
    job_id: i64,
) -> Result<()> {
    if control.is_cancelled(kind, job_id).await? {
        return Err(Error::Cancelled);
    }
    Ok(())
}

/// The worker process: one consumer per input queue plus the index-result
/// router, all running concurrently. Within each queue messages are
/// handled serially (prefetch 1); across queues work proceeds in parallel.
pub struct Worker {
    broker: Arc<dyn BrokerProvider>,
    queues: QueueNames,
    template_config: Arc<TemplateConfigHandler>,
    marking_config: Arc<MarkingConfigHandler>,
    marking_job: Arc<MarkingJobHandler>,
    index_router: Arc<IndexResultRouter>,
}

impl Worker {
    pub fn new(
        broker: Arc<dyn BrokerProvider>,
        queues: QueueNames,
        template_config: Arc<TemplateConfigHandler>,
        marking_config: Arc<MarkingConfigHandler>,
        marking_job: Arc<MarkingJobHandler>,
        index_router: Arc<IndexResultRouter>,
    ) -> Self {
        Self {
            broker,
            queues,
            template_config,
            marking_config,
            marking_job,
            index_router,
        }
    }

    /// Run all consumer loops until one of them stops.
    pub async fn run(&self) -> Result<()> {
        omr_domain::info!("worker", "Worker consumers starting");
        tokio::try_join!(
            self.broker.consume(
                &self.queues.template_config,
                Arc::clone(&self.template_config) as Arc<dyn MessageHandler>,
            ),
            self.broker.consume(
                &self.queues.marking_config,
                Arc::clone(&self.marking_config) as Arc<dyn MessageHandler>,
            ),
            self.broker.consume(
                &self.queues.marking_job,
                Arc::clone(&self.marking_job) as Arc<dyn MessageHandler>,
            ),
            self.broker.consume(
                &self.queues.index_task_results,
                Arc::clone(&self.index_router) as Arc<dyn MessageHandler>,
            ),
        )?;
        Ok(())
    }
}

/// The control-plane process: the result consumers for the three
/// repository-backed job kinds.
pub struct ControlPlane {
    broker: Arc<dyn BrokerProvider>,
    queues: QueueNames,
    template_config: Arc<dyn MessageHandler>,
    marking_config: Arc<dyn MessageHandler>,
    marking_job: Arc<dyn MessageHandler>,
}

impl ControlPlane {
    pub fn new(
        broker: Arc<dyn BrokerProvider>,
        queues: QueueNames,
        template_config: Arc<dyn MessageHandler>,
        marking_config: Arc<dyn MessageHandler>,
        marking_job: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            broker,
            queues,
            template_config,
            marking_config,
            marking_job,
        }
    }

    /// Run the three result-consumer loops until one of them stops.
    pub async fn run(&self) -> Result<()> {
        omr_domain::info!("control", "Result consumers starting");
        tokio::try_join!(
            self.broker.consume(
                &self.queues.template_config_results,
                Arc::clone(&self.template_config),
            ),
            self.broker.consume(
                &self.queues.marking_config_results,
                Arc::clone(&self.marking_config),
            ),
            self.broker
                .consume(&self.queues.marking_job_results, Arc::clone(&self.marking_job)),
        )?;
        Ok(())
    }
}
