//! SeaORM entity for the `template_config_jobs` table.
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "template_config_jobs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub template_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub config_type: String,
    pub status: String,
    pub priority: String,
    pub template_path: String,
    pub num_of_columns: Option<i32>,
    pub num_of_rows_per_column: Option<i32>,
    pub num_of_options_per_question: Option<i32>,
    pub save_intermediate_results: bool,
    pub template_config_path: Option<String>,
    pub output_image_path: Option<String>,
    pub result_image_path: Option<String>,
    pub original_image_width: Option<i32>,
    pub original_image_height: Option<i32>,
    pub processed_image_width: Option<i32>,
    pub processed_image_height: Option<i32>,
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
