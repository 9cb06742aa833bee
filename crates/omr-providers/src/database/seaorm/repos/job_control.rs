//! SeaORM-backed worker job-control slice.
//!
//! The worker only stamps `Processing` on first touch and polls the
//! cancellation flag; both dispatch over the job kind. Index tasks have no
//! record of their own, so they are a no-op here.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use omr_domain::error::Result;
use omr_domain::ports::{
    JobControlRepository, MarkingConfigJobRepository, MarkingJobRepository,
    TemplateConfigJobRepository,
};
use omr_domain::registry::JobKind;

/// Dispatches job-control calls to the per-kind repositories.
pub struct SeaOrmJobControlRepository {
    template_config: Arc<dyn TemplateConfigJobRepository>,
    marking_config: Arc<dyn MarkingConfigJobRepository>,
    marking: Arc<dyn MarkingJobRepository>,
}

impl SeaOrmJobControlRepository {
    pub fn new(
        template_config: Arc<dyn TemplateConfigJobRepository>,
        marking_config: Arc<dyn MarkingConfigJobRepository>,
        marking: Arc<dyn MarkingJobRepository>,
    ) -> Self {
        Self {
            template_config,
            marking_config,
            marking,
        }
    }
}

#[async_trait]
impl JobControlRepository for SeaOrmJobControlRepository {
    async fn mark_processing(&self, kind: JobKind, job_id: i64, at: DateTime<Utc>) -> Result<()> {
        match kind {
            JobKind::TemplateConfig => self.template_config.mark_processing(job_id, at).await,
            JobKind::MarkingConfig => self.marking_config.mark_processing(job_id, at).await,
            JobKind::Marking => self.marking.mark_processing(job_id, at).await,
            JobKind::IndexTask => Ok(()),
        }
    }

    async fn is_cancelled(&self, kind: JobKind, job_id: i64) -> Result<bool> {
        match kind {
            JobKind::TemplateConfig => self.template_config.is_cancelled(job_id).await,
            JobKind::MarkingConfig => self.marking_config.is_cancelled(job_id).await,
            JobKind::Marking => self.marking.is_cancelled(job_id).await,
            JobKind::IndexTask => Ok(false),
        }
    }
}
