//! Ports: the trait seams between the domain and the outside world.
//!
//! Providers implement these; the application layer depends only on the
//! traits. Wiring happens once in the composition root.

pub mod events;
pub mod logging;
pub mod providers;
pub mod repositories;

pub use events::{DomainEventStream, EventBusProvider};
pub use logging::{LogLevel, LoggerPort};
pub use providers::broker::{BrokerProvider, MessageHandler};
pub use providers::ocr::{IndexReading, OcrProvider};
pub use providers::spreadsheet::ResultSheetWriter;
pub use providers::storage::{ArtifactStore, UploadMetadata};
pub use providers::vision::{
    BubbleClass, IndexSectionDetector, MarkingVision, TemplateConfigOutput, TemplateVision,
};
pub use repositories::{
    FileRepository, JobControlRepository, MarkingConfigApplied, MarkingConfigJobRepository,
    MarkingJobApplied, MarkingJobRepository, NewMarkingConfigJob, NewMarkingJob,
    NewTemplateConfigJob, NewTemplate, ResultApplication, TemplateConfigApplied,
    TemplateConfigJobRepository, TemplateRepository,
};
