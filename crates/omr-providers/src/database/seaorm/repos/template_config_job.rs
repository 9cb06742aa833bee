//! SeaORM-based template-configuration job repository.
//!
//! Result application runs in one transaction covering the job row and its
//! owning template: terminal checks, kind-specific updates, and the status
//! mirror commit together, so redelivered envelopes observe a terminal row
//! and change nothing.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};

use omr_domain::entities::{Template, TemplateConfigJob};
use omr_domain::error::{Error, Result};
use omr_domain::ports::{
    NewTemplateConfigJob, ResultApplication, TemplateConfigApplied, TemplateConfigJobRepository,
};
use omr_domain::value_objects::JobStatus;

use super::common::db_err;
use crate::database::seaorm::conversions::{template_config_job_to_domain, template_to_domain};
use crate::database::seaorm::entities::{template, template_config_job};

/// SeaORM implementation of [`TemplateConfigJobRepository`].
pub struct SeaOrmTemplateConfigJobRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmTemplateConfigJobRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn set_status_fields(
        &self,
        id: i64,
        apply: impl FnOnce(&template_config_job::Model, &mut template_config_job::ActiveModel)
        + Send,
    ) -> Result<()> {
        let model = template_config_job::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| db_err("find template config job", e))?
            .ok_or_else(|| Error::not_found(format!("TemplateConfigJob:{id}")))?;
        let mut active: template_config_job::ActiveModel = model.clone().into();
        apply(&model, &mut active);
        active.updated_at = Set(Utc::now());
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| db_err("update template config job", e))?;
        Ok(())
    }
}

#[async_trait]
impl TemplateConfigJobRepository for SeaOrmTemplateConfigJobRepository {
    async fn insert(&self, new: NewTemplateConfigJob) -> Result<TemplateConfigJob> {
        let now = Utc::now();
        let model = template_config_job::ActiveModel {
            template_id: Set(new.template_id),
            name: Set(new.name),
            description: Set(new.description),
            config_type: Set(new.config_type.as_str().to_owned()),
            status: Set(JobStatus::Pending.as_str().to_owned()),
            priority: Set(new.priority.as_str().to_owned()),
            template_path: Set(new.template_path),
            num_of_columns: Set(new.clustering.map(|c| c.num_of_columns as i32)),
            num_of_rows_per_column: Set(new.clustering.map(|c| c.num_of_rows_per_column as i32)),
            num_of_options_per_question: Set(new
                .clustering
                .map(|c| c.num_of_options_per_question as i32)),
            save_intermediate_results: Set(new.save_intermediate_results),
            template_config_path: Set(None),
            output_image_path: Set(None),
            result_image_path: Set(None),
            original_image_width: Set(None),
            original_image_height: Set(None),
            processed_image_width: Set(None),
            processed_image_height: Set(None),
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
            .map_err(|e| db_err("insert template config job", e))?;
        template_config_job_to_domain(inserted)
    }

    async fn get(&self, id: i64) -> Result<Option<TemplateConfigJob>> {
        let model = template_config_job::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| db_err("get template config job", e))?;
        model.map(template_config_job_to_domain).transpose()
    }

    async fn get_with_template(&self, id: i64) -> Result<Option<(TemplateConfigJob, Template)>> {
        let found = template_config_job::Entity::find_by_id(id)
            .find_also_related(template::Entity)
            .one(self.db.as_ref())
            .await
            .map_err(|e| db_err("get template config job with template", e))?;
        match found {
            Some((job, Some(tpl))) => Ok(Some((
                template_config_job_to_domain(job)?,
                template_to_domain(tpl)?,
            ))),
            Some((job, None)) => Err(Error::not_found(format!(
                "Template:{} (owner of TemplateConfigJob:{id})",
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
        let model = template_config_job::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| db_err("check cancellation", e))?;
        Ok(model.is_some_and(|m| m.status == JobStatus::Cancelled.as_str()))
    }

    async fn apply_completed(
        &self,
        id: i64,
        applied: &TemplateConfigApplied,
    ) -> Result<ResultApplication> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| db_err("begin result transaction", e))?;

        let Some(model) = template_config_job::Entity::find_by_id(id)
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

        let template_id = model.template_id;
        let mut active: template_config_job::ActiveModel = model.into();
        active.status = Set(JobStatus::Completed.as_str().to_owned());
        active.template_config_path = Set(Some(applied.template_config_path.clone()));
        active.output_image_path = Set(Some(applied.output_image_path.clone()));
        active.result_image_path = Set(applied.result_image_path.clone());
        if let Some(dims) = applied.image_dimensions {
            active.original_image_width = Set(Some(dims.original_width as i32));
            active.original_image_height = Set(Some(dims.original_height as i32));
            active.processed_image_width = Set(Some(dims.processed_width as i32));
            active.processed_image_height = Set(Some(dims.processed_height as i32));
        }
        active.processing_completed_at = Set(Some(applied.completed_at));
        active.updated_at = Set(Utc::now());
        active
            .update(&txn)
            .await
            .map_err(|e| db_err("apply completed result", e))?;

        // Mirror onto the owning template in the same transaction.
        let tpl = template::Entity::find_by_id(template_id)
            .one(&txn)
            .await
            .map_err(|e| db_err("find owning template", e))?
            .ok_or_else(|| Error::not_found(format!("Template:{template_id}")))?;
        let mut tpl_active: template::ActiveModel = tpl.into();
        tpl_active.status = Set(JobStatus::Completed.as_str().to_owned());
        tpl_active.configuration_file_id = Set(applied.configuration_file_id);
        tpl_active.template_file_id = Set(applied.template_file_id);
        if let Some(n) = applied.num_questions {
            tpl_active.num_questions = Set(n as i32);
        }
        if let Some(n) = applied.options_per_question {
            tpl_active.options_per_question = Set(n as i32);
        }
        tpl_active.updated_at = Set(Utc::now());
        tpl_active
            .update(&txn)
            .await
            .map_err(|e| db_err("mirror template status", e))?;

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

        let Some(model) = template_config_job::Entity::find_by_id(id)
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

        let template_id = model.template_id;
        let mut active: template_config_job::ActiveModel = model.into();
        active.status = Set(JobStatus::Failed.as_str().to_owned());
        active.error_message = Set(Some(error.to_owned()));
        active.processing_completed_at = Set(Some(at));
        active.updated_at = Set(Utc::now());
        active
            .update(&txn)
            .await
            .map_err(|e| db_err("apply failed result", e))?;

        if let Some(tpl) = template::Entity::find_by_id(template_id)
            .one(&txn)
            .await
            .map_err(|e| db_err("find owning template", e))?
        {
            let mut tpl_active: template::ActiveModel = tpl.into();
            tpl_active.status = Set(JobStatus::Failed.as_str().to_owned());
            tpl_active.updated_at = Set(Utc::now());
            tpl_active
                .update(&txn)
                .await
                .map_err(|e| db_err("mirror template status", e))?;
        }

        txn.commit()
            .await
            .map_err(|e| db_err("commit result transaction", e))?;
        Ok(ResultApplication::Applied)
    }
}
