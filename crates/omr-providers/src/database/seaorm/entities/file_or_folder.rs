//! SeaORM entity for the `files_or_folders` table.
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "files_or_folders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub original_name: String,
    pub path: String,
    pub size: i64,
    pub extension: Option<String>,
    pub file_type: String,
    pub status: String,
    pub deletion_date: DateTimeUtc,
    pub owner: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
