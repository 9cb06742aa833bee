//! Repository ports.
//!
//! Narrow typed read/update interfaces per record kind, backed by any
//! relational store. Producers and consumers eagerly fetch the owning
//! aggregate inside one transaction; result application is atomic and
//! idempotent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    FileOrFolder, MarkingConfigJob, MarkingJob, NewFileOrFolder, Template, TemplateConfigJob,
};
use crate::entities::template::TemplateConfigType;
use crate::error::Result;
use crate::registry::messages::{ImageDimensions, SheetSummary};
use crate::registry::JobKind;
use crate::value_objects::{ClusteringParams, JobPriority, JobStatus};

/// Outcome of applying a result envelope to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultApplication {
    /// The record was updated and transitioned to a terminal state.
    Applied,
    /// The record was already terminal; nothing changed (redelivery).
    AlreadyTerminal,
    /// No record with that id exists (orphan result).
    NotFound,
}

// ============================================================================
// Insert payloads
// ============================================================================

/// Insert payload for a template record.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub description: Option<String>,
    pub config_type: TemplateConfigType,
    pub options_per_question: i32,
    pub owner: i64,
}

/// Insert payload for a template-configuration job.
#[derive(Debug, Clone)]
pub struct NewTemplateConfigJob {
    pub template_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub config_type: TemplateConfigType,
    pub priority: JobPriority,
    pub template_path: String,
    pub clustering: Option<ClusteringParams>,
    pub save_intermediate_results: bool,
    pub owner: i64,
}

/// Insert payload for a marking-configuration job.
#[derive(Debug, Clone)]
pub struct NewMarkingConfigJob {
    pub template_id: i64,
    pub name: String,
    pub priority: JobPriority,
    pub template_path: String,
    pub marking_scheme_path: String,
    pub template_config_path: String,
    pub owner: i64,
}

/// Insert payload for a marking job.
#[derive(Debug, Clone)]
pub struct NewMarkingJob {
    pub template_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub priority: JobPriority,
    pub marking_scheme_path: String,
    pub answer_sheets_folder_path: String,
    pub output_path: String,
    pub intermediate_results_path: Option<String>,
    pub save_intermediate_results: bool,
    pub owner: i64,
}

// ============================================================================
// Result-application payloads
// ============================================================================

/// Updates applied when a template-config result completes. The bound
/// template is updated in the same transaction: artifact links, question
/// metadata, and the mirrored `Completed` status.
#[derive(Debug, Clone)]
pub struct TemplateConfigApplied {
    pub template_config_path: String,
    pub output_image_path: String,
    pub result_image_path: Option<String>,
    pub num_questions: Option<u32>,
    pub options_per_question: Option<u32>,
    pub image_dimensions: Option<ImageDimensions>,
    /// Artifact record id of the configuration JSON.
    pub configuration_file_id: Option<i64>,
    /// Artifact record id of the warped template image.
    pub template_file_id: Option<i64>,
    pub completed_at: DateTime<Utc>,
}

/// Updates applied when a marking-config result completes.
#[derive(Debug, Clone)]
pub struct MarkingConfigApplied {
    pub marking_config_path: String,
    pub completed_at: DateTime<Utc>,
}

/// Updates applied when a marking-job result completes. `final_status`
/// carries the aggregate rule's verdict: `Completed` when at least half of
/// the attempted sheets succeeded, `Failed` otherwise.
#[derive(Debug, Clone)]
pub struct MarkingJobApplied {
    pub total_answer_sheets: u32,
    pub processed_answer_sheets: u32,
    pub failed_answer_sheets: u32,
    pub results_summary: Vec<SheetSummary>,
    pub final_status: JobStatus,
    pub completed_at: DateTime<Utc>,
}

// ============================================================================
// Repositories
// ============================================================================

/// CRUD over template records.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn insert(&self, template: NewTemplate) -> Result<Template>;
    async fn get(&self, id: i64) -> Result<Option<Template>>;
    async fn list_by_owner(&self, owner: i64) -> Result<Vec<Template>>;
    async fn set_status(&self, id: i64, status: JobStatus) -> Result<()>;
}

/// CRUD plus lifecycle operations over template-configuration jobs.
#[async_trait]
pub trait TemplateConfigJobRepository: Send + Sync {
    async fn insert(&self, job: NewTemplateConfigJob) -> Result<TemplateConfigJob>;
    async fn get(&self, id: i64) -> Result<Option<TemplateConfigJob>>;
    /// Fetch the job with its owning template eagerly, in one transaction.
    async fn get_with_template(&self, id: i64) -> Result<Option<(TemplateConfigJob, Template)>>;
    async fn mark_queued(&self, id: i64, at: DateTime<Utc>) -> Result<()>;
    async fn mark_processing(&self, id: i64, at: DateTime<Utc>) -> Result<()>;
    async fn mark_failed(&self, id: i64, error: &str) -> Result<()>;
    async fn is_cancelled(&self, id: i64) -> Result<bool>;
    /// Apply a `completed` envelope atomically; idempotent on redelivery.
    async fn apply_completed(
        &self,
        id: i64,
        applied: &TemplateConfigApplied,
    ) -> Result<ResultApplication>;
    /// Apply a `failed` envelope atomically; idempotent on redelivery.
    async fn apply_failed(
        &self,
        id: i64,
        error: &str,
        at: DateTime<Utc>,
    ) -> Result<ResultApplication>;
}

/// CRUD plus lifecycle operations over marking-configuration jobs.
#[async_trait]
pub trait MarkingConfigJobRepository: Send + Sync {
    async fn insert(&self, job: NewMarkingConfigJob) -> Result<MarkingConfigJob>;
    async fn get(&self, id: i64) -> Result<Option<MarkingConfigJob>>;
    async fn get_with_template(&self, id: i64) -> Result<Option<(MarkingConfigJob, Template)>>;
    async fn mark_queued(&self, id: i64, at: DateTime<Utc>) -> Result<()>;
    async fn mark_processing(&self, id: i64, at: DateTime<Utc>) -> Result<()>;
    async fn mark_failed(&self, id: i64, error: &str) -> Result<()>;
    async fn is_cancelled(&self, id: i64) -> Result<bool>;
    async fn apply_completed(
        &self,
        id: i64,
        applied: &MarkingConfigApplied,
    ) -> Result<ResultApplication>;
    async fn apply_failed(
        &self,
        id: i64,
        error: &str,
        at: DateTime<Utc>,
    ) -> Result<ResultApplication>;
}

/// CRUD plus lifecycle operations over marking jobs.
#[async_trait]
pub trait MarkingJobRepository: Send + Sync {
    async fn insert(&self, job: NewMarkingJob) -> Result<MarkingJob>;
    async fn get(&self, id: i64) -> Result<Option<MarkingJob>>;
    async fn get_with_template(&self, id: i64) -> Result<Option<(MarkingJob, Template)>>;
    async fn mark_queued(&self, id: i64, at: DateTime<Utc>) -> Result<()>;
    async fn mark_processing(&self, id: i64, at: DateTime<Utc>) -> Result<()>;
    async fn mark_failed(&self, id: i64, error: &str) -> Result<()>;
    async fn is_cancelled(&self, id: i64) -> Result<bool>;
    async fn apply_completed(
        &self,
        id: i64,
        applied: &MarkingJobApplied,
    ) -> Result<ResultApplication>;
    async fn apply_failed(
        &self,
        id: i64,
        error: &str,
        at: DateTime<Utc>,
    ) -> Result<ResultApplication>;
}

/// CRUD over artifact metadata records.
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn insert(&self, file: NewFileOrFolder) -> Result<FileOrFolder>;
    async fn get(&self, id: i64) -> Result<Option<FileOrFolder>>;
    async fn list_by_owner(&self, owner: i64) -> Result<Vec<FileOrFolder>>;
    async fn mark_deleted(&self, id: i64) -> Result<()>;
    /// Records whose `deletion_date` has passed, for the cleanup sweep.
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<FileOrFolder>>;
}

/// The narrow slice of the repository the worker process touches: the
/// `QUEUED → PROCESSING` stamp on first touch, and the cancellation flag
/// checked at stage boundaries.
#[async_trait]
pub trait JobControlRepository: Send + Sync {
    async fn mark_processing(&self, kind: JobKind, job_id: i64, at: DateTime<Utc>) -> Result<()>;
    async fn is_cancelled(&self, kind: JobKind, job_id: i64) -> Result<bool>;
}
