//! Unit tests for the marking configuration document

use omr_domain::value_objects::{BubbleMark, MarkingConfig};

#[test]
fn bubble_mark_serializes_as_tuple() {
    let mark = BubbleMark::new(true, 120, 340);
    assert_eq!(serde_json::to_string(&mark).unwrap(), "[1,120,340]");
}

#[test]
fn config_round_trip() {
    let config = MarkingConfig::new(vec![
        BubbleMark::new(true, 10, 20),
        BubbleMark::new(false, 30, 20),
    ]);
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.starts_with("{\"answers_with_coordinates\":[[1,10,20],[0,30,20]]"));

    let back: MarkingConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn marked_flags_preserve_order() {
    let config = MarkingConfig::new(vec![
        BubbleMark::new(false, 0, 0),
        BubbleMark::new(true, 1, 0),
        BubbleMark::new(false, 2, 0),
    ]);
    assert_eq!(config.marked_flags(), vec![false, true, false]);
}
