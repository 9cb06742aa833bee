//! Template configuration document.
//!
//! This is the JSON written by the template-configuration worker and read
//! back by every marking stage. Grid-based templates carry offsets plus
//! per-column starting points; clustering-based templates carry every
//! bubble centre explicitly. Both carry the same metadata block.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value_objects::geometry::PointF;

/// Parameters for clustering-based bubble detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusteringParams {
    pub num_of_columns: u32,
    pub num_of_rows_per_column: u32,
    pub num_of_options_per_question: u32,
}

/// Summary block shared by both config shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfigMetadata {
    pub num_questions: u32,
    pub column_row_distribution: Vec<u32>,
    pub options_per_question: u32,
    pub num_columns: u32,
}

/// Starting point of a grid column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnStart {
    pub starting_x: i32,
    pub starting_y: i32,
}

/// Grid-based bubble layout: uniform offsets plus column origins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBubbleConfig {
    pub x_offset: i32,
    pub y_offset: i32,
    /// Column origins keyed by 1-based column number.
    pub columns: BTreeMap<String, ColumnStart>,
}

/// A single detected bubble centre (clustering shape).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BubblePoint {
    pub x: i32,
    pub y: i32,
}

/// Bubble centres keyed by 1-based column, then 1-based row.
pub type BubbleGrid = BTreeMap<String, BTreeMap<String, Vec<BubblePoint>>>;

/// The persisted template configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub metadata: TemplateConfigMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bubble_configs: Option<GridBubbleConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bubbles: Option<BubbleGrid>,
}

fn numeric_keys<'a, V>(map: &'a BTreeMap<String, V>) -> Vec<(u32, &'a V)> {
    let mut entries: Vec<(u32, &V)> = map
        .iter()
        .filter_map(|(k, v)| k.parse::<u32>().ok().map(|n| (n, v)))
        .collect();
    entries.sort_by_key(|(n, _)| *n);
    entries
}

impl TemplateConfig {
    /// Flatten the layout into bubble centres in question order: column by
    /// column, row by row, option by option. This is the coordinate list
    /// every scoring stage projects through a homography.
    pub fn bubble_coordinates(&self) -> Result<Vec<PointF>> {
        if let Some(grid) = &self.bubble_configs {
            let mut out = Vec::new();
            let options = self.metadata.options_per_question as i32;
            for (idx, (_, start)) in numeric_keys(&grid.columns).into_iter().enumerate() {
                let rows = self
                    .metadata
                    .column_row_distribution
                    .get(idx)
                    .copied()
                    .ok_or_else(|| {
                        Error::validation(format!("missing row distribution for column {}", idx + 1))
                    })?;
                for row in 0..rows as i32 {
                    for opt in 0..options {
                        out.push(PointF::new(
                            f64::from(start.starting_x + opt * grid.x_offset),
                            f64::from(start.starting_y + row * grid.y_offset),
                        ));
                    }
                }
            }
            return Ok(out);
        }
        if let Some(bubbles) = &self.bubbles {
            let mut out = Vec::new();
            for (_, rows) in numeric_keys(bubbles) {
                for (_, row) in numeric_keys(rows) {
                    for b in row {
                        out.push(PointF::new(f64::from(b.x), f64::from(b.y)));
                    }
                }
            }
            return Ok(out);
        }
        Err(Error::validation(
            "template config has neither bubble_configs nor bubbles",
        ))
    }

    /// Number of options for every question, in question order.
    #[must_use]
    pub fn choice_distribution(&self) -> Vec<u32> {
        let per_question = self.metadata.options_per_question;
        (0..self.metadata.num_questions)
            .map(|_| per_question)
            .collect()
    }

    /// Total bubble count implied by the metadata.
    #[must_use]
    pub fn expected_bubble_count(&self) -> u32 {
        self.metadata.num_questions * self.metadata.options_per_question
    }
}
