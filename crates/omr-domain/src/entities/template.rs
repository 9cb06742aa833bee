//! Template entity: a blank answer-sheet form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::JobStatus;

/// How bubble positions are discovered on the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateConfigType {
    GridBased,
    ClusteringBased,
}

impl TemplateConfigType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GridBased => "grid_based",
            Self::ClusteringBased => "clustering_based",
        }
    }
}

impl std::str::FromStr for TemplateConfigType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grid_based" => Ok(Self::GridBased),
            "clustering_based" => Ok(Self::ClusteringBased),
            _ => Err(format!("Unknown template config type: {s}")),
        }
    }
}

/// A blank answer-sheet form. Exactly one `TemplateConfigJob` drives its
/// lifecycle; `status` mirrors that job's terminal state, and
/// `configuration_file_id` is set iff the template reached `Completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub config_type: TemplateConfigType,
    pub status: JobStatus,
    pub num_questions: i32,
    pub options_per_question: i32,
    /// Artifact record of the warped template image.
    pub template_file_id: Option<i64>,
    /// Artifact record of the configuration JSON.
    pub configuration_file_id: Option<i64>,
    pub owner: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
