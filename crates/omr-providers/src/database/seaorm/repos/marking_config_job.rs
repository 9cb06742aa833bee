//! SeaORM-based marking-configuration job repository.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};

use omr_domain::entities::{MarkingConfigJob, Template};
use omr_domain::error::{Error, Result};
use omr_domain::ports::{
    MarkingConfigApplied, MarkingConfigJobRepository, NewMarkingConfigJob, ResultApplication,
};
use omr_domain::value_objects::JobStatus;

use super::common::db_err;
use crate::database::seaorm::conversions::{marking_config_job_to_domain, template_to_domain};
use crate::database::seaorm::entities::{marking_config_job, template};

/// SeaORM implementation of [`MarkingConfigJobRepository`].
pub struct SeaOrmMarkingConfigJobRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmMarkingConfigJobRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn set_status_fields(
        &self,
        id: i64,
        apply: impl FnOnce(&marking_config_job::Model, &mut marking_config_job::ActiveModel)
        + Send,
    ) -> Result<()> {
        let model = marking_config_job::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| db_err("find marking config job", e))?
            .ok_or_else(|| Error::not_found(format!("MarkingConfigJob:{id}")))?;
        let mut active: marking_config_job::ActiveModel = model.clone().into();
        apply(&model, &mut active);
        active.updated_at = Set(Utc::now());
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| db_err("update marking config job", e))?;
        Ok(())
    }
}

#[async_trait]
impl MarkingConfigJobRepository for SeaOrmMarkingConfigJobRepository {
    async fn insert(&self, new: NewMarkingConfigJob) -> Result<MarkingConfigJob> {
        let now = Utc::now();
        let model = marking_config_job::ActiveModel {
            template_id: Set(new.template_id),
            name: Set(new.name),
            status: Set(JobStatus::Pending.as_str().to_owned()),
            priority: Set(new.priority.as_str().to_owned()),
            template_path: Set(new.template_path),
            marking_scheme_path: Set(new.marking_scheme_path),
            template_config_path: Set(new.template_config_path),
            marking_config_path: Set(None),
            processing_started_at: Set(None),
            processing_completed_at: Set(None),
            error_message: Set(None),
            owner: Set(new.owner),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let inserted = model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| db_err("insert marking config job", e))?;
        marking_config_job_to_domain(inserted)
    }

    async fn get(&self, id: i64) -> Result<Option<MarkingConfigJob>> {
        let model = marking_config_job::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| db_err("get marking config job", e))?;
        model.map(marking_config_job_to_domain).transpose()
    }

    async fn get_with_template(&self, id: i64) -> Result<Option<(MarkingConfigJob, Template)>> {
        let found = marking_config_job::Entity::find_by_id(id)
            .find_also_related(template::Entity)
            .one(self.db.as_ref())
            .await
            .map_err(|e| db_err("get marking config job with template", e))?;
        match found {
            Some((job, Some(tpl))) => Ok(Some((
                marking_config_job_to_domain(job)?,
                template_to_domain(tpl)?,
            ))),
            Some((job, None)) => Err(Error::not_found(format!(
                "Template:{} (owner of MarkingConfigJob:{id})",
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
        let model = marking_config_job::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| db_err("check cancellation", e))?;
        Ok(model.is_some_and(|m| m.status == JobStatus::Cancelled.as_str()))
    }

    async fn apply_completed(
        &self,
        id: i64,
        applied: &MarkingConfigApplied,
    ) -> Result<ResultApplication> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| db_err("begin result transaction", e))?;

        let Some(model) = marking_config_job::Entity::find_by_id(id)
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

        let mut active: marking_config_job::ActiveModel = model.into();
        active.status = Set(JobStatus::Completed.as_str().to_owned());
        active.marking_config_path = Set(Some(applied.marking_config_path.clone()));
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

        let Some(model) = marking_config_job::Entity::find_by_id(id)
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

        let mut active: marking_config_job::ActiveModel = model.into();
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
