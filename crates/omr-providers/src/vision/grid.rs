//! Grid-based bubble detection on the warped template.
//!
//! Circles are swept from the top-left bubble: its row yields the x offset
//! and the column starting points (a gap wider than 1.6×offset starts a
//! new column), its column yields the y offset, and each column's bubble
//! band yields the row count.

use std::collections::BTreeMap;

use image::GrayImage;

use omr_domain::constants::vision::{
    BUBBLE_MIN_AREA, BUBBLE_MIN_CIRCULARITY, COLUMN_GAP_FACTOR, TEMPLATE_CANNY,
};
use omr_domain::error::{Error, Result};
use omr_domain::value_objects::{
    ColumnStart, GridBubbleConfig, PointF, TemplateConfig, TemplateConfigMetadata,
};

use super::contours::{ContourInfo, external_contours, trace_contours};
use super::image_ops::edge_map;

/// A detected bubble: centre plus fitted radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Circle {
    pub center: PointF,
    pub radius: f64,
}

/// Keep contours that look like bubbles (round enough, big enough).
pub(crate) fn detect_circles(contours: &[ContourInfo]) -> Vec<Circle> {
    external_contours(contours)
        .into_iter()
        .filter(|c| c.area >= BUBBLE_MIN_AREA && c.circularity() >= BUBBLE_MIN_CIRCULARITY)
        .map(|c| Circle {
            center: c.centroid,
            radius: c.radius(),
        })
        .collect()
}

/// The bubble closest to the image origin.
pub(crate) fn first_bubble(circles: &[Circle]) -> Option<Circle> {
    circles
        .iter()
        .copied()
        .min_by(|a, b| {
            (a.center.x + a.center.y)
                .partial_cmp(&(b.center.x + b.center.y))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Bubbles sharing the reference bubble's row (y within its radius),
/// sorted left to right.
pub(crate) fn row_of(circles: &[Circle], reference: Circle) -> Vec<Circle> {
    let mut row: Vec<Circle> = circles
        .iter()
        .copied()
        .filter(|c| (c.center.y - reference.center.y).abs() <= reference.radius)
        .collect();
    row.sort_by(|a, b| {
        a.center
            .x
            .partial_cmp(&b.center.x)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    row
}

/// Bubbles sharing the reference bubble's column (x within its radius),
/// sorted top to bottom.
pub(crate) fn column_of(circles: &[Circle], reference: Circle) -> Vec<Circle> {
    let mut column: Vec<Circle> = circles
        .iter()
        .copied()
        .filter(|c| (c.center.x - reference.center.x).abs() <= reference.radius)
        .collect();
    column.sort_by(|a, b| {
        a.center
            .y
            .partial_cmp(&b.center.y)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    column
}

/// Option spacing from the first row's leading run of bubbles. The
/// provisional spacing is the median consecutive gap (robust against the
/// wider inter-column gaps); the final value averages the run before the
/// first column break.
pub(crate) fn infer_x_offset(row: &[Circle]) -> Result<f64> {
    if row.len() < 2 {
        return Err(Error::validation(
            "first bubble row has fewer than 2 bubbles",
        ));
    }
    let mut gaps: Vec<f64> = row.windows(2).map(|w| w[1].center.x - w[0].center.x).collect();
    gaps.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let provisional = gaps[gaps.len() / 2];

    let mut run_end = row.len() - 1;
    for (i, w) in row.windows(2).enumerate() {
        if w[1].center.x - w[0].center.x > COLUMN_GAP_FACTOR * provisional {
            run_end = i;
            break;
        }
    }
    if run_end == 0 {
        return Ok(provisional);
    }
    Ok((row[run_end].center.x - row[0].center.x) / run_end as f64)
}

/// Vertical spacing from the first column.
pub(crate) fn infer_y_offset(column: &[Circle]) -> Result<f64> {
    if column.len() < 2 {
        return Err(Error::validation(
            "first bubble column has fewer than 2 bubbles",
        ));
    }
    Ok(
        (column[column.len() - 1].center.y - column[0].center.y)
            / (column.len() - 1) as f64,
    )
}

/// Column starting bubbles: the first bubble plus every bubble following
/// a gap wider than `COLUMN_GAP_FACTOR`×offset in the first row.
pub(crate) fn column_starts(row: &[Circle], x_offset: f64) -> Vec<Circle> {
    let mut starts = Vec::new();
    if let Some(first) = row.first() {
        starts.push(*first);
    }
    for w in row.windows(2) {
        if w[1].center.x - w[0].center.x > COLUMN_GAP_FACTOR * x_offset {
            starts.push(w[1]);
        }
    }
    starts
}

/// Full grid detection over a warped template image.
pub(crate) fn detect_grid_layout(warped: &GrayImage) -> Result<(TemplateConfig, Vec<Circle>)> {
    let edges = edge_map(warped, TEMPLATE_CANNY.0, TEMPLATE_CANNY.1);
    let contours = trace_contours(&edges);
    let circles = detect_circles(&contours);
    let first =
        first_bubble(&circles).ok_or_else(|| Error::validation("no bubbles detected"))?;

    let row = row_of(&circles, first);
    let column = column_of(&circles, first);
    let x_offset = infer_x_offset(&row)?;
    let y_offset = infer_y_offset(&column)?;

    let starts = column_starts(&row, x_offset);
    let mut columns = BTreeMap::new();
    let mut column_row_distribution = Vec::new();
    for (i, start) in starts.iter().enumerate() {
        columns.insert(
            (i + 1).to_string(),
            ColumnStart {
                starting_x: start.center.x.round() as i32,
                starting_y: start.center.y.round() as i32,
            },
        );
        column_row_distribution.push(column_of(&circles, *start).len() as u32);
    }
    // Options per question: bubbles in the first row belonging to each
    // column segment; take the leading segment's count.
    let mut segment_len = 0u32;
    for (i, c) in row.iter().enumerate() {
        if i > 0 && c.center.x - row[i - 1].center.x > COLUMN_GAP_FACTOR * x_offset {
            break;
        }
        segment_len += 1;
    }
    let options_per_question = segment_len.max(1);

    let metadata = TemplateConfigMetadata {
        num_questions: column_row_distribution.iter().sum(),
        column_row_distribution,
        options_per_question,
        num_columns: starts.len() as u32,
    };

    Ok((
        TemplateConfig {
            metadata,
            bubble_configs: Some(GridBubbleConfig {
                x_offset: x_offset.round() as i32,
                y_offset: y_offset.round() as i32,
                columns,
            }),
            bubbles: None,
        },
        circles,
    ))
}
