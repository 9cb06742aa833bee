//! SeaORM-based artifact metadata repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use omr_domain::entities::{FileOrFolder, FileStatus, NewFileOrFolder};
use omr_domain::error::{Error, Result};
use omr_domain::ports::FileRepository;

use super::common::db_err;
use crate::database::seaorm::conversions::file_to_domain;
use crate::database::seaorm::entities::file_or_folder;

/// SeaORM implementation of [`FileRepository`].
pub struct SeaOrmFileRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmFileRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FileRepository for SeaOrmFileRepository {
    async fn insert(&self, new: NewFileOrFolder) -> Result<FileOrFolder> {
        let now = Utc::now();
        let model = file_or_folder::ActiveModel {
            name: Set(new.name),
            original_name: Set(new.original_name),
            path: Set(new.path),
            size: Set(new.size),
            extension: Set(new.extension),
            file_type: Set(new.file_type.as_str().to_owned()),
            status: Set(new.status.as_str().to_owned()),
            deletion_date: Set(new.deletion_date),
            owner: Set(new.owner),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let inserted = model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| db_err("insert file record", e))?;
        file_to_domain(inserted)
    }

    async fn get(&self, id: i64) -> Result<Option<FileOrFolder>> {
        let model = file_or_folder::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| db_err("get file record", e))?;
        model.map(file_to_domain).transpose()
    }

    async fn list_by_owner(&self, owner: i64) -> Result<Vec<FileOrFolder>> {
        let models = file_or_folder::Entity::find()
            .filter(file_or_folder::Column::Owner.eq(owner))
            .all(self.db.as_ref())
            .await
            .map_err(|e| db_err("list file records", e))?;
        models.into_iter().map(file_to_domain).collect()
    }

    async fn mark_deleted(&self, id: i64) -> Result<()> {
        let model = file_or_folder::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| db_err("find file record", e))?
            .ok_or_else(|| Error::not_found(format!("FileOrFolder:{id}")))?;
        let mut active: file_or_folder::ActiveModel = model.into();
        active.status = Set(FileStatus::Deleted.as_str().to_owned());
        active.updated_at = Set(Utc::now());
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| db_err("mark file deleted", e))?;
        Ok(())
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<FileOrFolder>> {
        let models = file_or_folder::Entity::find()
            .filter(file_or_folder::Column::DeletionDate.lt(now))
            .filter(file_or_folder::Column::Status.ne(FileStatus::Deleted.as_str()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| db_err("list expired file records", e))?;
        models.into_iter().map(file_to_domain).collect()
    }
}
