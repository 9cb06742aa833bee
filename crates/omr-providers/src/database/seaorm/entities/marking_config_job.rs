//! SeaORM entity for the `marking_config_jobs` table.
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "marking_config_jobs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub template_id: i64,
    pub name: String,
    pub status: String,
    pub priority: String,
    pub template_path: String,
    pub marking_scheme_path: String,
    pub template_config_path: String,
    pub marking_config_path: Option<String>,
    pub processing_started_at: Option<DateTimeUtc>,
    pub processing_completed_at: Option<DateTimeUtc>,
    pub error_message: Option<String>,
    pub owner: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::template::Entity",
        from = "Column::TemplateId",
        to = "super::template::Column::Id"
    )]
    Template,
}

impl Related<super::template::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Template.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
