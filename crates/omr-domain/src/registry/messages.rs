//! Wire contracts: request payloads and the shared result envelope.
//!
//! Everything on the broker is UTF-8 JSON. Requests carry paths, never
//! bytes; workers read artifacts through the shared store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::template::TemplateConfigType;
use crate::value_objects::{ClusteringParams, TemplateConfig};

// ============================================================================
// Request payloads (control → worker)
// ============================================================================

/// Template-configuration request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfigRequest {
    pub id: i64,
    pub name: String,
    pub config_type: TemplateConfigType,
    pub template_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clustering: Option<ClusteringParams>,
    #[serde(default)]
    pub save_intermediate_results: bool,
    /// Owner id, used to build output artifact paths.
    pub owner: i64,
    /// Owning template id, used to build output artifact paths.
    pub template_id: i64,
}

/// Marking-configuration request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkingConfigRequest {
    pub id: i64,
    pub name: String,
    pub template_path: String,
    pub marking_scheme_path: String,
    pub template_config_path: String,
    pub owner: i64,
    pub template_id: i64,
}

/// Batch-marking request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkingJobRequest {
    pub id: i64,
    pub name: String,
    pub template_path: String,
    pub marking_scheme_path: String,
    pub answer_sheets_folder_path: String,
    pub output_path: String,
    pub template_config_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediate_results_path: Option<String>,
    #[serde(default)]
    pub save_intermediate_results: bool,
}

/// Index-recognition request, fanned out once per sheet by the marking
/// orchestrator. `task_id` is the owning marking job's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexTaskRequest {
    pub task_id: i64,
    pub sheet_id: u32,
    pub file_path: String,
}

// ============================================================================
// Result envelope (worker → control)
// ============================================================================

/// Terminal outcome carried by a result envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Completed,
    Failed,
}

/// The result envelope every kind publishes. Workers always emit one per
/// dequeued request, even on failure, so the control-plane loop closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope<T> {
    pub job_id: i64,
    pub status: ResultStatus,
    pub result: Option<T>,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ResultEnvelope<T> {
    /// A `completed` envelope wrapping a kind-specific payload.
    #[must_use]
    pub fn completed(job_id: i64, result: T) -> Self {
        Self {
            job_id,
            status: ResultStatus::Completed,
            result: Some(result),
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    /// A `failed` envelope carrying a short human-readable message.
    #[must_use]
    pub fn failed<S: Into<String>>(job_id: i64, error_message: S) -> Self {
        Self {
            job_id,
            status: ResultStatus::Failed,
            result: None,
            error_message: Some(error_message.into()),
            timestamp: Utc::now(),
        }
    }

    /// Returns `true` when the envelope reports success.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == ResultStatus::Completed
    }
}

// ============================================================================
// Kind-specific result payloads
// ============================================================================

/// Pixel dimensions before and after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub original_width: u32,
    pub original_height: u32,
    pub processed_width: u32,
    pub processed_height: u32,
}

/// Template-configuration result payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfigResult {
    pub template_config_path: String,
    pub output_image_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_image_path: Option<String>,
    pub bubble_config: TemplateConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_dimensions: Option<ImageDimensions>,
}

/// Marking-configuration result payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkingConfigResult {
    pub marking_config_path: String,
    pub marking_scheme_path: String,
}

/// One summarized spreadsheet row, embedded in the marking-job result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSummary {
    pub sheet_id: u32,
    pub path: String,
    pub score: u32,
    pub flag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_number: Option<String>,
}

/// Marking-job result payload with the batch progress counters.
///
/// `processed + failed = total` holds once the orchestrator finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkingJobResult {
    pub output_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediate_results_path: Option<String>,
    pub total_answer_sheets: u32,
    pub processed_answer_sheets: u32,
    pub failed_answer_sheets: u32,
    pub processing_started_at: DateTime<Utc>,
    pub processing_completed_at: DateTime<Utc>,
    pub results_summary: Vec<SheetSummary>,
}

/// Quality flag on a recognized index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexFlag {
    Ok,
    LowConfidence,
}

/// Index-recognition result payload. `task_id` routes the result back to
/// the orchestrator that fanned the request out; `sheet_id` addresses the
/// spreadsheet row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexTaskResult {
    pub task_id: i64,
    pub sheet_id: u32,
    pub index_number: Option<String>,
    pub confidence: f64,
    pub flag: IndexFlag,
}
