//! Persistent records and per-batch transients.

pub mod answer_sheet;
pub mod file;
pub mod jobs;
pub mod template;

pub use answer_sheet::{AnswerSheetResult, FlagReason};
pub use file::{FileOrFolder, FileStatus, FileType, NewFileOrFolder};
pub use jobs::{MarkingConfigJob, MarkingJob, TemplateConfigJob};
pub use template::{Template, TemplateConfigType};
