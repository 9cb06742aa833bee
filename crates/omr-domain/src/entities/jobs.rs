//! The three persistent job records.
//!
//! All three share the `PENDING → QUEUED → PROCESSING → terminal` lifecycle
//! in [`crate::value_objects::JobStatus`]; who performs each transition is
//! split between producers, workers, and result consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::template::TemplateConfigType;
use crate::value_objects::{ClusteringParams, JobPriority, JobStatus};

/// CV job that detects bubble coordinates on a blank template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfigJob {
    pub id: i64,
    pub template_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub config_type: TemplateConfigType,
    pub status: JobStatus,
    pub priority: JobPriority,
    /// Input template image, relative to the artifact store root.
    pub template_path: String,
    /// Clustering-mode detection parameters; `None` for grid mode.
    pub clustering: Option<ClusteringParams>,
    pub save_intermediate_results: bool,
    /// Output config JSON (set on completion).
    pub template_config_path: Option<String>,
    /// Warped/normalized template image (set on completion).
    pub output_image_path: Option<String>,
    /// Annotated debug image (set on completion when requested).
    pub result_image_path: Option<String>,
    pub original_image_width: Option<i32>,
    pub original_image_height: Option<i32>,
    pub processed_image_width: Option<i32>,
    pub processed_image_height: Option<i32>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub processing_completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub owner: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Converts a filled marking-scheme image plus a completed template config
/// into a cached list of marked-bubble coordinates.
///
/// Depends on `template.status = Completed`; the producer fails fast
/// otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkingConfigJob {
    pub id: i64,
    pub template_id: i64,
    pub name: String,
    pub status: JobStatus,
    pub priority: JobPriority,
    pub template_path: String,
    pub marking_scheme_path: String,
    pub template_config_path: String,
    /// Output marking config JSON (set on completion).
    pub marking_config_path: Option<String>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub processing_completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub owner: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Batch job: score every sheet in a folder against the marking scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkingJob {
    pub id: i64,
    pub template_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: JobStatus,
    pub priority: JobPriority,
    pub marking_scheme_path: String,
    pub answer_sheets_folder_path: String,
    pub output_path: String,
    pub intermediate_results_path: Option<String>,
    pub save_intermediate_results: bool,
    pub total_answer_sheets: i32,
    pub processed_answer_sheets: i32,
    pub failed_answer_sheets: i32,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub processing_completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    /// Per-sheet summary rows, as published in the result envelope.
    pub results_summary: Option<serde_json::Value>,
    pub owner: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MarkingJob {
    /// Success rate over processed sheets, in percent.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let attempted = self.processed_answer_sheets + self.failed_answer_sheets;
        if attempted == 0 {
            return 0.0;
        }
        f64::from(self.processed_answer_sheets) / f64::from(attempted) * 100.0
    }
}
