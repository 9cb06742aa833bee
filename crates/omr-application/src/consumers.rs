//! Control-plane result consumers: one long-lived loop per result queue.
//!
//! Each handler parses the result envelope and applies it to the record
//! atomically. Orphan results (no record) and redeliveries (record already
//! terminal) ack without changes; handler errors nack without requeue and
//! leave the record `Processing` for an operator to resubmit.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use omr_domain::entities::{FileType, NewFileOrFolder};
use omr_domain::error::Result;
use omr_domain::events::DomainEvent;
use omr_domain::ports::{
    ArtifactStore, EventBusProvider, FileRepository, MarkingConfigApplied,
    MarkingConfigJobRepository, MarkingJobApplied, MarkingJobRepository, MessageHandler,
    ResultApplication, TemplateConfigApplied, TemplateConfigJobRepository,
};
use omr_domain::registry::{
    JobKind, MarkingConfigResult, MarkingJobResult, ResultEnvelope, TemplateConfigResult,
};
use omr_domain::value_objects::JobStatus;

fn log_application(kind: JobKind, job_id: i64, outcome: ResultApplication) {
    match outcome {
        ResultApplication::Applied => {
            omr_domain::info!("consumer", "Result applied", &format!("{kind}:{job_id}"));
        }
        ResultApplication::AlreadyTerminal => {
            omr_domain::debug!(
                "consumer",
                "Redelivered result for terminal job ignored",
                &format!("{kind}:{job_id}")
            );
        }
        ResultApplication::NotFound => {
            omr_domain::warn!("consumer", "Orphan result dropped", &format!("{kind}:{job_id}"));
        }
    }
}

async fn emit_terminal(
    events: &Arc<dyn EventBusProvider>,
    kind: JobKind,
    job_id: i64,
    outcome: ResultApplication,
    error: Option<&str>,
) {
    if outcome != ResultApplication::Applied {
        return;
    }
    let event = match error {
        None => DomainEvent::JobCompleted { kind, job_id },
        Some(e) => DomainEvent::JobFailed {
            kind,
            job_id,
            error: e.to_owned(),
        },
    };
    let _ = events.publish_event(event).await;
}

/// Consumer for `template_config_results`.
///
/// On success it also registers the two produced artifacts as file records
/// so the template can link them, then applies the template updates and
/// the terminal transition in one transaction.
pub struct TemplateConfigResultConsumer {
    repo: Arc<dyn TemplateConfigJobRepository>,
    files: Arc<dyn FileRepository>,
    store: Arc<dyn ArtifactStore>,
    events: Arc<dyn EventBusProvider>,
}

impl TemplateConfigResultConsumer {
    pub fn new(
        repo: Arc<dyn TemplateConfigJobRepository>,
        files: Arc<dyn FileRepository>,
        store: Arc<dyn ArtifactStore>,
        events: Arc<dyn EventBusProvider>,
    ) -> Self {
        Self {
            repo,
            files,
            store,
            events,
        }
    }

    async fn register_artifact(
        &self,
        path: &str,
        file_type: FileType,
        owner: i64,
    ) -> Result<i64> {
        let size = self.store.size(path).await.unwrap_or(0);
        let record = self
            .files
            .insert(NewFileOrFolder::derived_artifact(
                path,
                size as i64,
                file_type,
                owner,
            ))
            .await?;
        Ok(record.id)
    }
}

#[async_trait]
impl MessageHandler for TemplateConfigResultConsumer {
    async fn handle(&self, body: &[u8]) -> Result<()> {
        let envelope: ResultEnvelope<TemplateConfigResult> = serde_json::from_slice(body)?;
        let job_id = envelope.job_id;

        let outcome = match (envelope.is_completed(), envelope.result) {
            (true, Some(result)) => {
                // Owner for the artifact records comes from the job itself.
                let owner = match self.repo.get(job_id).await? {
                    Some(job) => job.owner,
                    None => {
                        log_application(JobKind::TemplateConfig, job_id, ResultApplication::NotFound);
                        return Ok(());
                    }
                };
                let configuration_file_id = self
                    .register_artifact(&result.template_config_path, FileType::Config, owner)
                    .await?;
                let template_file_id = self
                    .register_artifact(&result.output_image_path, FileType::Template, owner)
                    .await?;

                let applied = TemplateConfigApplied {
                    template_config_path: result.template_config_path,
                    output_image_path: result.output_image_path,
                    result_image_path: result.result_image_path,
                    num_questions: Some(result.bubble_config.metadata.num_questions),
                    options_per_question: Some(result.bubble_config.metadata.options_per_question),
                    image_dimensions: result.image_dimensions,
                    configuration_file_id: Some(configuration_file_id),
                    template_file_id: Some(template_file_id),
                    completed_at: Utc::now(),
                };
                let outcome = self.repo.apply_completed(job_id, &applied).await?;
                emit_terminal(&self.events, JobKind::TemplateConfig, job_id, outcome, None).await;
                outcome
            }
            _ => {
                let error = envelope
                    .error_message
                    .unwrap_or_else(|| "Unknown error".to_owned());
                let outcome = self.repo.apply_failed(job_id, &error, Utc::now()).await?;
                emit_terminal(
                    &self.events,
                    JobKind::TemplateConfig,
                    job_id,
                    outcome,
                    Some(&error),
                )
                .await;
                outcome
            }
        };

        log_application(JobKind::TemplateConfig, job_id, outcome);
        Ok(())
    }
}

/// Consumer for `marking_config_results`.
pub struct MarkingConfigResultConsumer {
    repo: Arc<dyn MarkingConfigJobRepository>,
    events: Arc<dyn EventBusProvider>,
}

impl MarkingConfigResultConsumer {
    pub fn new(
        repo: Arc<dyn MarkingConfigJobRepository>,
        events: Arc<dyn EventBusProvider>,
    ) -> Self {
        Self { repo, events }
    }
}

#[async_trait]
impl MessageHandler for MarkingConfigResultConsumer {
    async fn handle(&self, body: &[u8]) -> Result<()> {
        let envelope: ResultEnvelope<MarkingConfigResult> = serde_json::from_slice(body)?;
        let job_id = envelope.job_id;

        let outcome = match (envelope.is_completed(), envelope.result) {
            (true, Some(result)) => {
                let applied = MarkingConfigApplied {
                    marking_config_path: result.marking_config_path,
                    completed_at: Utc::now(),
                };
                let outcome = self.repo.apply_completed(job_id, &applied).await?;
                emit_terminal(&self.events, JobKind::MarkingConfig, job_id, outcome, None).await;
                outcome
            }
            _ => {
                let error = envelope
                    .error_message
                    .unwrap_or_else(|| "Unknown error".to_owned());
                let outcome = self.repo.apply_failed(job_id, &error, Utc::now()).await?;
                emit_terminal(
                    &self.events,
                    JobKind::MarkingConfig,
                    job_id,
                    outcome,
                    Some(&error),
                )
                .await;
                outcome
            }
        };

        log_application(JobKind::MarkingConfig, job_id, outcome);
        Ok(())
    }
}

/// Consumer for `marking_job_results`.
///
/// Applies the terminal aggregate rule: a finished batch completes when at
/// least half of the attempted sheets succeeded, otherwise it fails.
pub struct MarkingJobResultConsumer {
    repo: Arc<dyn MarkingJobRepository>,
    events: Arc<dyn EventBusProvider>,
}

impl MarkingJobResultConsumer {
    pub fn new(repo: Arc<dyn MarkingJobRepository>, events: Arc<dyn EventBusProvider>) -> Self {
        Self { repo, events }
    }

    fn final_status(result: &MarkingJobResult) -> JobStatus {
        let attempted = result.processed_answer_sheets + result.failed_answer_sheets;
        if attempted == 0 || result.processed_answer_sheets * 2 >= attempted {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        }
    }
}

#[async_trait]
impl MessageHandler for MarkingJobResultConsumer {
    async fn handle(&self, body: &[u8]) -> Result<()> {
        let envelope: ResultEnvelope<MarkingJobResult> = serde_json::from_slice(body)?;
        let job_id = envelope.job_id;

        let outcome = match (envelope.is_completed(), envelope.result) {
            (true, Some(result)) => {
                let final_status = Self::final_status(&result);
                let applied = MarkingJobApplied {
                    total_answer_sheets: result.total_answer_sheets,
                    processed_answer_sheets: result.processed_answer_sheets,
                    failed_answer_sheets: result.failed_answer_sheets,
                    results_summary: result.results_summary,
                    final_status,
                    completed_at: Utc::now(),
                };
                let outcome = self.repo.apply_completed(job_id, &applied).await?;
                let error = (final_status == JobStatus::Failed)
                    .then_some("success rate below 50%");
                emit_terminal(&self.events, JobKind::Marking, job_id, outcome, error).await;
                outcome
            }
            _ => {
                let error = envelope
                    .error_message
                    .unwrap_or_else(|| "Unknown error".to_owned());
                let outcome = self.repo.apply_failed(job_id, &error, Utc::now()).await?;
                emit_terminal(&self.events, JobKind::Marking, job_id, outcome, Some(&error)).await;
                outcome
            }
        };

        log_application(JobKind::Marking, job_id, outcome);
        Ok(())
    }
}
