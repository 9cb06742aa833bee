//! Schema creation from the entity definitions.

use sea_orm::sea_query::TableCreateStatement;
use sea_orm::{ConnectionTrait, DatabaseConnection, Schema};

use omr_domain::error::{Error, Result};

use super::entities::{
    file_or_folder, marking_config_job, marking_job, template, template_config_job,
};

/// Create every record table if it does not exist yet.
pub async fn create_schema(db: &DatabaseConnection) -> Result<()> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statements: Vec<TableCreateStatement> = vec![
        schema.create_table_from_entity(template::Entity),
        schema.create_table_from_entity(template_config_job::Entity),
        schema.create_table_from_entity(marking_config_job::Entity),
        schema.create_table_from_entity(marking_job::Entity),
        schema.create_table_from_entity(file_or_folder::Entity),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(backend.build(&*statement))
            .await
            .map_err(|e| Error::database_with_source("create table", e))?;
    }
    Ok(())
}
