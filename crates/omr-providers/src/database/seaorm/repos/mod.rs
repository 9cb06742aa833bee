//! SeaORM implementations of the repository ports.

mod common;
mod file;
mod job_control;
mod marking_config_job;
mod marking_job;
mod template;
mod template_config_job;

pub use file::SeaOrmFileRepository;
pub use job_control::SeaOrmJobControlRepository;
pub use marking_config_job::SeaOrmMarkingConfigJobRepository;
pub use marking_job::SeaOrmMarkingJobRepository;
pub use template::SeaOrmTemplateRepository;
pub use template_config_job::SeaOrmTemplateConfigJobRepository;
