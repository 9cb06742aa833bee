//! Unit tests for the template configuration document

use std::collections::BTreeMap;

use omr_domain::value_objects::template_config::BubblePoint;
use omr_domain::value_objects::{
    ColumnStart, GridBubbleConfig, TemplateConfig, TemplateConfigMetadata,
};

fn grid_config() -> TemplateConfig {
    let mut columns = BTreeMap::new();
    columns.insert("1".to_owned(), ColumnStart { starting_x: 100, starting_y: 200 });
    columns.insert("2".to_owned(), ColumnStart { starting_x: 500, starting_y: 200 });
    TemplateConfig {
        metadata: TemplateConfigMetadata {
            num_questions: 4,
            column_row_distribution: vec![2, 2],
            options_per_question: 3,
            num_columns: 2,
        },
        bubble_configs: Some(GridBubbleConfig {
            x_offset: 40,
            y_offset: 50,
            columns,
        }),
        bubbles: None,
    }
}

#[test]
fn grid_coordinates_enumerate_column_row_option() {
    let coords = grid_config().bubble_coordinates().unwrap();
    assert_eq!(coords.len(), 12);

    // First question, column 1: three options along x.
    assert_eq!((coords[0].x, coords[0].y), (100.0, 200.0));
    assert_eq!((coords[1].x, coords[1].y), (140.0, 200.0));
    assert_eq!((coords[2].x, coords[2].y), (180.0, 200.0));
    // Second row of column 1 moves down by y_offset.
    assert_eq!((coords[3].x, coords[3].y), (100.0, 250.0));
    // Column 2 starts after column 1's rows.
    assert_eq!((coords[6].x, coords[6].y), (500.0, 200.0));
}

#[test]
fn clustering_coordinates_follow_numeric_key_order() {
    let mut rows = BTreeMap::new();
    // Keys "2" and "10" must sort numerically, not lexically.
    rows.insert(
        "10".to_owned(),
        vec![BubblePoint { x: 11, y: 110 }],
    );
    rows.insert("2".to_owned(), vec![BubblePoint { x: 12, y: 20 }]);
    let mut bubbles = BTreeMap::new();
    bubbles.insert("1".to_owned(), rows);

    let config = TemplateConfig {
        metadata: TemplateConfigMetadata {
            num_questions: 2,
            column_row_distribution: vec![2],
            options_per_question: 1,
            num_columns: 1,
        },
        bubble_configs: None,
        bubbles: Some(bubbles),
    };

    let coords = config.bubble_coordinates().unwrap();
    assert_eq!(coords.len(), 2);
    assert_eq!(coords[0].y, 20.0);
    assert_eq!(coords[1].y, 110.0);
}

#[test]
fn choice_distribution_is_uniform() {
    let config = grid_config();
    assert_eq!(config.choice_distribution(), vec![3, 3, 3, 3]);
    assert_eq!(config.expected_bubble_count(), 12);
}

#[test]
fn missing_layout_is_a_validation_error() {
    let config = TemplateConfig {
        metadata: TemplateConfigMetadata {
            num_questions: 0,
            column_row_distribution: vec![],
            options_per_question: 5,
            num_columns: 0,
        },
        bubble_configs: None,
        bubbles: None,
    };
    assert!(config.bubble_coordinates().is_err());
}

#[test]
fn grid_json_shape_matches_contract() {
    let json = serde_json::to_value(grid_config()).unwrap();
    assert_eq!(json["metadata"]["num_questions"], 4);
    assert_eq!(json["bubble_configs"]["x_offset"], 40);
    assert_eq!(json["bubble_configs"]["columns"]["1"]["starting_x"], 100);
    assert!(json.get("bubbles").is_none());
}
