//! Job registry: the four job kinds, their queues, and message contracts.

pub mod jobs;
pub mod messages;

pub use jobs::JobKind;
pub use messages::{
    ImageDimensions, IndexFlag, IndexTaskRequest, IndexTaskResult, MarkingConfigRequest,
    MarkingConfigResult, MarkingJobRequest, MarkingJobResult, ResultEnvelope, ResultStatus,
    SheetSummary, TemplateConfigRequest, TemplateConfigResult,
};
