//! Unit tests for artifact path construction

use omr_domain::value_objects::paths;

#[test]
fn template_config_path_shape() {
    let path = paths::template_config_path(3, 17);
    assert!(path.starts_with("templates/3/17_"));
    assert!(path.ends_with("_config.json"));
}

#[test]
fn paths_embed_unique_suffixes() {
    let a = paths::warped_template_path(1, 1);
    let b = paths::warped_template_path(1, 1);
    assert_ne!(a, b);
}

#[test]
fn marking_result_path_shape() {
    let path = paths::marking_result_path(5, 40);
    assert!(path.starts_with("results/5/40_"));
    assert!(path.ends_with(".xlsx"));
}

#[test]
fn intermediate_sheet_path_is_deterministic() {
    assert_eq!(
        paths::intermediate_sheet_path(12, 4),
        "intermediate/answers/12/4.jpg"
    );
}

#[test]
fn chunk_names_are_zero_padded() {
    assert_eq!(paths::chunk_file_name(0), "chunk_0000");
    assert_eq!(paths::chunk_file_name(37), "chunk_0037");
    assert_eq!(paths::upload_staging_dir("ab12"), "temp/uploads/ab12");
}
