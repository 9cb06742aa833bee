//! SeaORM entity for the `templates` table.
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "templates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub config_type: String,
    pub status: String,
    pub num_questions: i32,
    pub options_per_question: i32,
    pub template_file_id: Option<i64>,
    pub configuration_file_id: Option<i64>,
    pub owner: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::template_config_job::Entity")]
    TemplateConfigJobs,
    #[sea_orm(has_many = "super::marking_job::Entity")]
    MarkingJobs,
}

impl Related<super::template_config_job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TemplateConfigJobs.def()
    }
}

impl Related<super::marking_job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MarkingJobs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
