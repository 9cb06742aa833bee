//! SeaORM-based template repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use omr_domain::entities::Template;
use omr_domain::error::{Error, Result};
use omr_domain::ports::{NewTemplate, TemplateRepository};
use omr_domain::value_objects::JobStatus;

use super::common::db_err;
use crate::database::seaorm::conversions::template_to_domain;
use crate::database::seaorm::entities::template;

/// SeaORM implementation of [`TemplateRepository`].
pub struct SeaOrmTemplateRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmTemplateRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TemplateRepository for SeaOrmTemplateRepository {
    async fn insert(&self, new: NewTemplate) -> Result<Template> {
        let now = Utc::now();
        let model = template::ActiveModel {
            name: Set(new.name),
            description: Set(new.description),
            config_type: Set(new.config_type.as_str().to_owned()),
            status: Set(JobStatus::Pending.as_str().to_owned()),
            num_questions: Set(0),
            options_per_question: Set(new.options_per_question),
            template_file_id: Set(None),
            configuration_file_id: Set(None),
            owner: Set(new.owner),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let inserted = model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| db_err("insert template", e))?;
        template_to_domain(inserted)
    }

    async fn get(&self, id: i64) -> Result<Option<Template>> {
        let model = template::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| db_err("get template", e))?;
        model.map(template_to_domain).transpose()
    }

    async fn list_by_owner(&self, owner: i64) -> Result<Vec<Template>> {
        let models = template::Entity::find()
            .filter(template::Column::Owner.eq(owner))
            .all(self.db.as_ref())
            .await
            .map_err(|e| db_err("list templates", e))?;
        models.into_iter().map(template_to_domain).collect()
    }

    async fn set_status(&self, id: i64, status: JobStatus) -> Result<()> {
        let model = template::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| db_err("find template for status update", e))?
            .ok_or_else(|| Error::not_found(format!("Template:{id}")))?;
        let mut active: template::ActiveModel = model.into();
        active.status = Set(status.as_str().to_owned());
        active.updated_at = Set(Utc::now());
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| db_err("update template status", e))?;
        Ok(())
    }
}
