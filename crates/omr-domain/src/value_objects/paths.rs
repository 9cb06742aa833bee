//! Artifact path construction.
//!
//! Paths embed a random uuid suffix so each artifact has exactly one
//! writer; layout mirrors the shared-volume convention documented in the
//! store.

use uuid::Uuid;

use crate::constants::storage::{
    INTERMEDIATE_ANSWERS_DIR, INTERMEDIATE_TEMPLATES_DIR, RESULTS_DIR, TEMP_UPLOADS_DIR,
    TEMPLATES_DIR,
};

fn uuid8() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_owned()
}

/// `uploads/<kind>/<user>/<name>_<uuid8>.<ext>`
#[must_use]
pub fn upload_path(dir: &str, owner: i64, stem: &str, extension: &str) -> String {
    format!("{dir}/{owner}/{stem}_{}.{extension}", uuid8())
}

/// `templates/<user>/<templateId>_<uuid8>_config.json`
#[must_use]
pub fn template_config_path(owner: i64, template_id: i64) -> String {
    format!("{TEMPLATES_DIR}/{owner}/{template_id}_{}_config.json", uuid8())
}

/// `templates/<user>/<templateId>_<uuid8>_template.jpg` (warped image)
#[must_use]
pub fn warped_template_path(owner: i64, template_id: i64) -> String {
    format!("{TEMPLATES_DIR}/{owner}/{template_id}_{}_template.jpg", uuid8())
}

/// `templates/<user>/<templateId>_<uuid8>_marking.json`
#[must_use]
pub fn marking_config_path(owner: i64, template_id: i64) -> String {
    format!("{TEMPLATES_DIR}/{owner}/{template_id}_{}_marking.json", uuid8())
}

/// `intermediate/templates/<user>/<templateId>_<uuid8>_result.jpg`
#[must_use]
pub fn template_result_image_path(owner: i64, template_id: i64) -> String {
    format!(
        "{INTERMEDIATE_TEMPLATES_DIR}/{owner}/{template_id}_{}_result.jpg",
        uuid8()
    )
}

/// `results/<user>/<markingJobId>_<uuid8>.xlsx`
#[must_use]
pub fn marking_result_path(owner: i64, marking_job_id: i64) -> String {
    format!("{RESULTS_DIR}/{owner}/{marking_job_id}_{}.xlsx", uuid8())
}

/// `intermediate/answers/<markingJobId>/<sheetId>.jpg`
#[must_use]
pub fn intermediate_sheet_path(marking_job_id: i64, sheet_id: u32) -> String {
    format!("{INTERMEDIATE_ANSWERS_DIR}/{marking_job_id}/{sheet_id}.jpg")
}

/// `temp/uploads/<uploadId>`
#[must_use]
pub fn upload_staging_dir(upload_id: &str) -> String {
    format!("{TEMP_UPLOADS_DIR}/{upload_id}")
}

/// `chunk_0000`, `chunk_0001`, …
#[must_use]
pub fn chunk_file_name(index: u32) -> String {
    format!("chunk_{index:04}")
}
