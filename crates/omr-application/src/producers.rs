//! Control-plane producers: one per job kind.
//!
//! `submit` fetches the job with its owning template in one transaction,
//! flips it to `Queued`, builds the request envelope from the record, and
//! publishes with the mapped priority. A failed publish flips the record to
//! `Failed` and surfaces the error; no worker has seen the job yet, so
//! there is no double-work risk.

use std::sync::Arc;

use chrono::Utc;

use omr_domain::error::{Error, Result};
use omr_domain::events::DomainEvent;
use omr_domain::ports::{
    BrokerProvider, EventBusProvider, FileRepository, MarkingConfigJobRepository,
    MarkingJobRepository, TemplateConfigJobRepository,
};
use omr_domain::registry::{
    JobKind, MarkingConfigRequest, MarkingJobRequest, TemplateConfigRequest,
};
use omr_domain::value_objects::JobStatus;

async fn publish_queued<R>(
    broker: &Arc<dyn BrokerProvider>,
    events: &Arc<dyn EventBusProvider>,
    kind: JobKind,
    job_id: i64,
    request: &R,
    priority: u8,
) -> Result<()>
where
    R: serde::Serialize,
{
    let body = serde_json::to_vec(request)?;
    broker
        .publish(kind.request_routing_key(), body, priority)
        .await?;
    let _ = events
        .publish_event(DomainEvent::JobQueued { kind, job_id })
        .await;
    omr_domain::info!("producer", "Job submitted", &format!("{kind}:{job_id}"));
    Ok(())
}

/// Producer for template-configuration jobs.
pub struct TemplateConfigProducer {
    repo: Arc<dyn TemplateConfigJobRepository>,
    broker: Arc<dyn BrokerProvider>,
    events: Arc<dyn EventBusProvider>,
}

impl TemplateConfigProducer {
    pub fn new(
        repo: Arc<dyn TemplateConfigJobRepository>,
        broker: Arc<dyn BrokerProvider>,
        events: Arc<dyn EventBusProvider>,
    ) -> Self {
        Self {
            repo,
            broker,
            events,
        }
    }

    /// Submit the job to `template_config_queue`.
    pub async fn submit(&self, job_id: i64) -> Result<()> {
        let (job, template) = self
            .repo
            .get_with_template(job_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("TemplateConfigJob:{job_id}")))?;

        self.repo.mark_queued(job_id, Utc::now()).await?;

        let request = TemplateConfigRequest {
            id: job.id,
            name: job.name.clone(),
            config_type: job.config_type,
            template_path: job.template_path.clone(),
            clustering: job.clustering,
            save_intermediate_results: job.save_intermediate_results,
            owner: job.owner,
            template_id: template.id,
        };

        match publish_queued(
            &self.broker,
            &self.events,
            JobKind::TemplateConfig,
            job_id,
            &request,
            job.priority.broker_priority(),
        )
        .await
        {
            Ok(()) => Ok(()),
            Err(e) => self.fail(job_id, e).await,
        }
    }

    async fn fail(&self, job_id: i64, error: Error) -> Result<()> {
        self.repo.mark_failed(job_id, &error.to_string()).await?;
        let _ = self
            .events
            .publish_event(DomainEvent::JobFailed {
                kind: JobKind::TemplateConfig,
                job_id,
                error: error.to_string(),
            })
            .await;
        Err(error)
    }
}

/// Producer for marking-configuration jobs. Fails fast when the bound
/// template has not completed its configuration.
pub struct MarkingConfigProducer {
    repo: Arc<dyn MarkingConfigJobRepository>,
    broker: Arc<dyn BrokerProvider>,
    events: Arc<dyn EventBusProvider>,
}

impl MarkingConfigProducer {
    pub fn new(
        repo: Arc<dyn MarkingConfigJobRepository>,
        broker: Arc<dyn BrokerProvider>,
        events: Arc<dyn EventBusProvider>,
    ) -> Self {
        Self {
            repo,
            broker,
            events,
        }
    }

    /// Submit the job to `marking_config_queue`.
    pub async fn submit(&self, job_id: i64) -> Result<()> {
        let (job, template) = self
            .repo
            .get_with_template(job_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("MarkingConfigJob:{job_id}")))?;

        if template.status != JobStatus::Completed {
            let error = Error::validation(format!(
                "template {} is not configured (status: {})",
                template.id, template.status
            ));
            return self.fail(job_id, error).await;
        }

        self.repo.mark_queued(job_id, Utc::now()).await?;

        let request = MarkingConfigRequest {
            id: job.id,
            name: job.name.clone(),
            template_path: job.template_path.clone(),
            marking_scheme_path: job.marking_scheme_path.clone(),
            template_config_path: job.template_config_path.clone(),
            owner: job.owner,
            template_id: template.id,
        };

        match publish_queued(
            &self.broker,
            &self.events,
            JobKind::MarkingConfig,
            job_id,
            &request,
            job.priority.broker_priority(),
        )
        .await
        {
            Ok(()) => Ok(()),
            Err(e) => self.fail(job_id, e).await,
        }
    }

    async fn fail(&self, job_id: i64, error: Error) -> Result<()> {
        self.repo.mark_failed(job_id, &error.to_string()).await?;
        let _ = self
            .events
            .publish_event(DomainEvent::JobFailed {
                kind: JobKind::MarkingConfig,
                job_id,
                error: error.to_string(),
            })
            .await;
        Err(error)
    }
}

/// Producer for batch marking jobs. Resolves the warped-template and
/// config artifacts through the file records linked on the template.
pub struct MarkingJobProducer {
    repo: Arc<dyn MarkingJobRepository>,
    files: Arc<dyn FileRepository>,
    broker: Arc<dyn BrokerProvider>,
    events: Arc<dyn EventBusProvider>,
}

impl MarkingJobProducer {
    pub fn new(
        repo: Arc<dyn MarkingJobRepository>,
        files: Arc<dyn FileRepository>,
        broker: Arc<dyn BrokerProvider>,
        events: Arc<dyn EventBusProvider>,
    ) -> Self {
        Self {
            repo,
            files,
            broker,
            events,
        }
    }

    async fn artifact_path(&self, file_id: Option<i64>, what: &str) -> Result<String> {
        let id = file_id
            .ok_or_else(|| Error::validation(format!("template has no {what} artifact")))?;
        let record = self
            .files
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("FileOrFolder:{id}")))?;
        Ok(record.path)
    }

    /// Submit the job to `marking_job_queue`.
    pub async fn submit(&self, job_id: i64) -> Result<()> {
        let (job, template) = self
            .repo
            .get_with_template(job_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("MarkingJob:{job_id}")))?;

        if template.status != JobStatus::Completed {
            let error = Error::validation(format!(
                "template {} is not configured (status: {})",
                template.id, template.status
            ));
            return self.fail(job_id, error).await;
        }

        let template_path = match self
            .artifact_path(template.template_file_id, "warped template")
            .await
        {
            Ok(p) => p,
            Err(e) => return self.fail(job_id, e).await,
        };
        let template_config_path = match self
            .artifact_path(template.configuration_file_id, "configuration")
            .await
        {
            Ok(p) => p,
            Err(e) => return self.fail(job_id, e).await,
        };

        self.repo.mark_queued(job_id, Utc::now()).await?;

        let request = MarkingJobRequest {
            id: job.id,
            name: job.name.clone(),
            template_path,
            marking_scheme_path: job.marking_scheme_path.clone(),
            answer_sheets_folder_path: job.answer_sheets_folder_path.clone(),
            output_path: job.output_path.clone(),
            template_config_path,
            intermediate_results_path: job.intermediate_results_path.clone(),
            save_intermediate_results: job.save_intermediate_results,
        };

        match publish_queued(
            &self.broker,
            &self.events,
            JobKind::Marking,
            job_id,
            &request,
            job.priority.broker_priority(),
        )
        .await
        {
            Ok(()) => Ok(()),
            Err(e) => self.fail(job_id, e).await,
        }
    }

    async fn fail(&self, job_id: i64, error: Error) -> Result<()> {
        self.repo.mark_failed(job_id, &error.to_string()).await?;
        let _ = self
            .events
            .publish_event(DomainEvent::JobFailed {
                kind: JobKind::Marking,
                job_id,
                error: error.to_string(),
            })
            .await;
        Err(error)
    }
}
