//! SeaORM-based marking job repository.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};

use omr_domain::entities::{MarkingJob, Template};
use omr_domain::error::{Error, Result};
use omr_domain::ports::{
    MarkingJobApplied, MarkingJobRepository, NewMarkingJob, ResultApplication,
};
use omr_domain::value_objects::JobStatus;

use super::common::db_err;
use crate::database::seaorm::conversions::{marking_job_to_domain, template_to_domain};
use crate::database::seaorm::entities::{marking_job, template};

/// SeaORM implementation of [`MarkingJobRepository`].
pub struct SeaOrmMarkingJobRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmMarkingJobRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn set_status_fields(
        &self,
        id: i64,
        apply: impl FnOnce(&marking_job::Model, &mut marking_job::ActiveModel) + Send,
    ) -> Result<()> {
        let model = marking_job::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| db_err("find marking job", e))?
            .ok_or_else(|| Error::not_found(format!("MarkingJob:{id}")))?;
        let mut active: marking_job::ActiveModel = model.clone().into();
        apply(&model, &mut active);
        active.updated_at = Set(Utc::now());
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| db_err("update marking job", e))?;
        Ok(())
    }
}

#[async_trait]
impl MarkingJobRepository for SeaOrmMarkingJobRepository {
    async fn insert(&self, new: NewMarkingJob) -> Result<MarkingJob> {
        let now = Utc::now();
        let model = marking_job::ActiveModel {
            template_id: Set(new.template_id),
            name: Set(new.name),
            description: Set(new.description),
            status: Set(JobStatus::Pending.as_str().to_owned()),
            priority: Set(new.priority.as_str().to_owned()),
            marking_scheme_path: Set(new.marking_scheme_path),
            answer_sheets_folder_path: Set(new.answer_sheets_folder_path),
            output_path: Set(new.output_path),
            intermediate_results_path: Set(new.intermediate_results_path),
            save_intermediate_results: Set(new.save_intermediate_results),
            total_answer_sheets: Set(0),
            processed_answer_sheets: Set(0),
            failed_answer_sheets: Set(0),
            processing_started_at: Set(None),
            processing_completed_at: Set(None),
            error_message: Set(None),
            results_summary: Set(None),
            owner: Set(new.owner),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let inserted = model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| db_err("insert marking job", e))?;
        marking_job_to_domain(inserted)
    }

    async fn get(&self, id: i64) -> Result<Option<MarkingJob>> {
        let model = marking_job::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| db_err("get marking job", e))?;
        model.map(marking_job_to_domain).transpose()
    }

    async fn get_with_template(&self, id: i64) -> Result<Option<(MarkingJob, Template)>> {
        let found = marking_job::Entity::find_by_id(id)
            .find_also_related(template::Entity)
            .one(self.db.as_ref())
            .await
            .map_err(|e| db_err("get marking job with template", e))?;
        match found {
            Some((job, Some(tpl))) => {
                Ok(Some((marking_job_to_domain(job)?, template_to_domain(tpl)?)))
            }
            Some((job, None)) => Err(Error::not_found(format!(
                "Template:{} (owner of MarkingJob:{id})",
                job.template_id
            ))),
            None => Ok(None),
        }
    }

    async fn mark_queued(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        self.set_status_fields(id, |_, active| {
            active.status = Set(JobStatus::Queued.as_str().to_owned());
            active.processing_started_at = Set(Some(at));
        })
        .await
    }

    async fn mark_processing(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        self.set_status_fields(id, |model, active| {
            active.status = Set(JobStatus::Processing.as_str().to_owned());
            if model.processing_started_at.is_none() {
                active.processing_started_at = Set(Some(at));
            }
        })
        .await
    }

    async fn mark_failed(&self, id: i64, error: &str) -> Result<()> {
        let error = error.to_owned();
        self.set_status_fields(id, move |_, active| {
            active.status = Set(JobStatus::Failed.as_str().to_owned());
            active.error_message = Set(Some(error));
        })
        .await
    }

    async fn is_cancelled(&self, id: i64) -> Result<bool> {
        let model = marking_job::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| db_err("check cancellation", e))?;
        Ok(model.is_some_and(|m| m.status == JobStatus::Cancelled.as_str()))
    }

    async fn apply_completed(
        &self,
        id: i64,
        applied: &MarkingJobApplied,
    ) -> Result<ResultApplication> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| db_err("begin result transaction", e))?;

        let Some(model) = marking_job::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| db_err("find job for result", e))?
        else {
            txn.rollback()
                .await
                .map_err(|e| db_err("rollback result transaction", e))?;
            return Ok(ResultApplication::NotFound);
        };
        let status = JobStatus::from_str(&model.status)
            .map_err(|e| Error::database(format!("corrupt status column: {e}")))?;
        if status.is_terminal() {
            txn.rollback()
                .await
                .map_err(|e| db_err("rollback result transaction", e))?;
            return Ok(ResultApplication::AlreadyTerminal);
        }

        let mut active: marking_job::ActiveModel = model.into();
        active.status = Set(applied.final_status.as_str().to_owned());
        active.total_answer_sheets = Set(applied.total_answer_sheets as i32);
        active.processed_answer_sheets = Set(applied.processed_answer_sheets as i32);
        active.failed_answer_sheets = Set(applied.failed_answer_sheets as i32);
        active.results_summary = Set(Some(serde_json::to_value(&applied.results_summary)?));
        active.processing_completed_at = Set(Some(applied.completed_at));
        active.updated_at = Set(Utc::now());
        active
            .update(&txn)
            .await
            .map_err(|e| db_err("apply completed result", e))?;

        txn.commit()
            .await
            .map_err(|e| db_err("commit result transaction", e))?;
        Ok(ResultApplication::Applied)
    }

    async fn apply_failed(
        &self,
        id: i64,
        error: &str,
        at: DateTime<Utc>,
    ) -> Result<ResultApplication> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| db_err("begin result transaction", e))?;

        let Some(model) = marking_job::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| db_err("find job for result", e))?
        else {
            txn.rollback()
                .await
                .map_err(|e| db_err("rollback result transaction", e))?;
            return Ok(ResultApplication::NotFound);
        };
        let status = JobStatus::from_str(&model.status)
            .map_err(|e| Error::database(format!("corrupt status column: {e}")))?;
        if status.is_terminal() {
            txn.rollback()
                .await
                .map_err(|e| db_err("rollback result transaction", e))?;
            return Ok(ResultApplication::AlreadyTerminal);
        }

        let mut active: marking_job::ActiveModel = model.into();
        active.status = Set(JobStatus::Failed.as_str().to_owned());
        active.error_message = Set(Some(error.to_owned()));
        active.processing_completed_at = Set(Some(at));
        active.updated_at = Set(Utc::now());
        active
            .update(&txn)
            .await
            .map_err(|e| db_err("apply failed result", e))?;

        txn.commit()
            .await
            .map_err(|e| db_err("commit result transaction", e))?;
        Ok(ResultApplication::Applied)
    }
}
