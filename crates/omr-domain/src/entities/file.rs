//! Artifact metadata records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::storage::DELETION_RETENTION_DAYS;

/// What an artifact is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Template,
    MarkingScheme,
    AnswerSheet,
    AnswerSheetsArchive,
    Config,
    Result,
    Other,
}

impl FileType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::MarkingScheme => "marking_scheme",
            Self::AnswerSheet => "answer_sheet",
            Self::AnswerSheetsArchive => "answer_sheets_archive",
            Self::Config => "config",
            Self::Result => "result",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "template" => Ok(Self::Template),
            "marking_scheme" => Ok(Self::MarkingScheme),
            "answer_sheet" => Ok(Self::AnswerSheet),
            "answer_sheets_archive" => Ok(Self::AnswerSheetsArchive),
            "config" => Ok(Self::Config),
            "result" => Ok(Self::Result),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown file type: {s}")),
        }
    }
}

/// Upload lifecycle of an artifact record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Pending,
    Uploading,
    Uploaded,
    Failed,
    Deleted,
}

impl FileStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Uploading => "uploading",
            Self::Uploaded => "uploaded",
            Self::Failed => "failed",
            Self::Deleted => "deleted",
        }
    }
}

impl std::str::FromStr for FileStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "uploading" => Ok(Self::Uploading),
            "uploaded" => Ok(Self::Uploaded),
            "failed" => Ok(Self::Failed),
            "deleted" => Ok(Self::Deleted),
            _ => Err(format!("Unknown file status: {s}")),
        }
    }
}

/// Metadata about a stored artifact. The bytes live in the artifact store;
/// `path` is relative to its root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOrFolder {
    pub id: i64,
    pub name: String,
    pub original_name: String,
    pub path: String,
    pub size: i64,
    pub extension: Option<String>,
    pub file_type: FileType,
    pub status: FileStatus,
    pub deletion_date: DateTime<Utc>,
    pub owner: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new artifact record.
#[derive(Debug, Clone)]
pub struct NewFileOrFolder {
    pub name: String,
    pub original_name: String,
    pub path: String,
    pub size: i64,
    pub extension: Option<String>,
    pub file_type: FileType,
    pub status: FileStatus,
    pub deletion_date: DateTime<Utc>,
    pub owner: i64,
}

impl NewFileOrFolder {
    /// Record for an artifact the pipeline itself produced (config JSON,
    /// warped image, result sheet). Retention follows the default window.
    #[must_use]
    pub fn derived_artifact(path: &str, size: i64, file_type: FileType, owner: i64) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_owned();
        let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_owned());
        Self {
            original_name: name.clone(),
            name,
            path: path.to_owned(),
            size,
            extension,
            file_type,
            status: FileStatus::Uploaded,
            deletion_date: Utc::now() + Duration::days(DELETION_RETENTION_DAYS),
            owner,
        }
    }
}
