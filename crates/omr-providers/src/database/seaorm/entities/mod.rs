//! SeaORM entities for the record tables.

pub mod file_or_folder;
pub mod marking_config_job;
pub mod marking_job;
pub mod template;
pub mod template_config_job;
