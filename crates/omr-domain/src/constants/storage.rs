//! Artifact-store layout constants.

/// Days an uploaded artifact is retained before its default deletion date.
pub const DELETION_RETENTION_DAYS: i64 = 7;

/// Directory for raw template uploads, per user.
pub const UPLOADS_TEMPLATES_DIR: &str = "uploads/templates";
/// Directory for raw answer-sheet uploads, per user.
pub const UPLOADS_ANSWER_SHEETS_DIR: &str = "uploads/answer_sheets";
/// Directory for raw marking-scheme uploads, per user.
pub const UPLOADS_MARKING_SCHEMES_DIR: &str = "uploads/marking_schemes";
/// Directory for derived template artifacts (configs, warped images).
pub const TEMPLATES_DIR: &str = "templates";
/// Directory for result spreadsheets.
pub const RESULTS_DIR: &str = "results";
/// Directory for annotated intermediate template images.
pub const INTERMEDIATE_TEMPLATES_DIR: &str = "intermediate/templates";
/// Directory for annotated intermediate answer-sheet images.
pub const INTERMEDIATE_ANSWERS_DIR: &str = "intermediate/answers";
/// Directory chunked uploads are staged under.
pub const TEMP_UPLOADS_DIR: &str = "temp/uploads";

/// File name of the per-upload chunk bookkeeping document.
pub const UPLOAD_METADATA_FILE: &str = "metadata.json";
