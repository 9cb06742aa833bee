//! Clustering-based bubble detection on the warped template.
//!
//! Used for forms without a regular grid: crop below the header rule,
//! filter circle-like contours, group them into columns and rows with 1-D
//! k-means, then repair each row against the reference x positions of the
//! complete rows (impute missing centres, prune extras).

use std::collections::BTreeMap;

use image::GrayImage;

use omr_domain::constants::vision::{
    CLUSTER_AREA_BAND, CLUSTER_ASPECT_RANGE, CLUSTER_CIRCULARITY_RANGE, HEADER_LINE_MIN_ASPECT,
    HEADER_LINE_MIN_THICKNESS, IMPUTE_TOLERANCE_PX, TEMPLATE_CANNY,
};
use omr_domain::error::{Error, Result};
use omr_domain::value_objects::template_config::BubblePoint;
use omr_domain::value_objects::{
    ClusteringParams, PointF, TemplateConfig, TemplateConfigMetadata,
};

use super::contours::{ContourInfo, approximate_polygon, external_contours, trace_contours};
use super::image_ops::edge_map;

// ============================================================================
// 1-D k-means
// ============================================================================

/// Deterministic 1-D k-means: centroids seed at the sorted values'
/// quantiles, then Lloyd iterations until stable (bounded).
pub(crate) fn kmeans_1d(values: &[f64], k: usize) -> Result<Vec<usize>> {
    if k == 0 || values.len() < k {
        return Err(Error::validation(format!(
            "cannot cluster {} points into {k} groups",
            values.len()
        )));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut centers: Vec<f64> = (0..k)
        .map(|i| sorted[(i * (sorted.len() - 1)) / (k - 1).max(1)])
        .collect();

    let mut labels = vec![0usize; values.len()];
    for _ in 0..50 {
        let mut changed = false;
        for (i, v) in values.iter().enumerate() {
            let nearest = centers
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    (v - *a)
                        .abs()
                        .partial_cmp(&(v - *b).abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(idx, _)| idx)
                .unwrap_or(0);
            if labels[i] != nearest {
                labels[i] = nearest;
                changed = true;
            }
        }
        let mut sums = vec![0.0f64; k];
        let mut counts = vec![0usize; k];
        for (i, v) in values.iter().enumerate() {
            sums[labels[i]] += v;
            counts[labels[i]] += 1;
        }
        for c in 0..k {
            if counts[c] > 0 {
                centers[c] = sums[c] / counts[c] as f64;
            }
        }
        if !changed {
            break;
        }
    }
    Ok(labels)
}

/// Group points into `k` clusters along the chosen axis, returning the
/// clusters ordered by their mean coordinate.
pub(crate) fn cluster_points(
    points: &[PointF],
    k: usize,
    by_y: bool,
) -> Result<Vec<Vec<PointF>>> {
    let values: Vec<f64> = points
        .iter()
        .map(|p| if by_y { p.y } else { p.x })
        .collect();
    let labels = kmeans_1d(&values, k)?;

    let mut clusters: Vec<Vec<PointF>> = vec![Vec::new(); k];
    for (point, label) in points.iter().zip(&labels) {
        clusters[*label].push(*point);
    }
    clusters.sort_by(|a, b| {
        let mean = |cluster: &[PointF]| {
            if cluster.is_empty() {
                return f64::MAX;
            }
            cluster
                .iter()
                .map(|p| if by_y { p.y } else { p.x })
                .sum::<f64>()
                / cluster.len() as f64
        };
        mean(a)
            .partial_cmp(&mean(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(clusters)
}

// ============================================================================
// Row repair
// ============================================================================

/// Mean x position per option slot over the rows that came out complete.
pub(crate) fn reference_positions(
    rows: &[Vec<PointF>],
    options_per_question: usize,
) -> Option<Vec<f64>> {
    let complete: Vec<&Vec<PointF>> = rows
        .iter()
        .filter(|row| row.len() == options_per_question)
        .collect();
    if complete.is_empty() {
        return None;
    }
    let mut reference = vec![0.0f64; options_per_question];
    for row in &complete {
        for (slot, p) in row.iter().enumerate() {
            reference[slot] += p.x;
        }
    }
    for slot in &mut reference {
        *slot /= complete.len() as f64;
    }
    Some(reference)
}

/// Repair one row against the reference x positions: impute a missing
/// bubble at the row's mean y, or keep only the nearest candidate per
/// slot when there are extras.
pub(crate) fn repair_row(row: &[PointF], reference: &[f64]) -> Vec<PointF> {
    if row.len() == reference.len() {
        return row.to_vec();
    }

    if row.len() < reference.len() {
        let mean_y = if row.is_empty() {
            0.0
        } else {
            row.iter().map(|p| p.y).sum::<f64>() / row.len() as f64
        };
        let mut repaired = row.to_vec();
        for ref_x in reference {
            let found = row
                .iter()
                .any(|p| (p.x - ref_x).abs() <= IMPUTE_TOLERANCE_PX);
            if !found {
                repaired.push(PointF::new(*ref_x, mean_y));
            }
        }
        repaired.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        return repaired;
    }

    let mut repaired = Vec::with_capacity(reference.len());
    for ref_x in reference {
        let best = row
            .iter()
            .filter(|p| (p.x - ref_x).abs() <= IMPUTE_TOLERANCE_PX)
            .min_by(|a, b| {
                (a.x - ref_x)
                    .abs()
                    .partial_cmp(&(b.x - ref_x).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        if let Some(best) = best {
            repaired.push(*best);
        }
    }
    repaired.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    repaired
}

// ============================================================================
// Detection pipeline
// ============================================================================

/// Topmost thick horizontal rule: the line separating the header from the
/// bubble grid. Returns the y just below it.
pub(crate) fn header_rule_bottom(contours: &[ContourInfo], image_width: f64) -> Option<u32> {
    let mut best: Option<f64> = None;
    for contour in contours {
        let b = &contour.bbox;
        if b.height >= f64::from(HEADER_LINE_MIN_THICKNESS)
            && b.width >= image_width / 2.0
            && b.aspect() > HEADER_LINE_MIN_ASPECT
        {
            let bottom = b.y + b.height;
            best = Some(best.map_or(bottom, |current: f64| current.min(bottom)));
        }
    }
    best.map(|b| b as u32 + 1)
}

/// Circle-like contour centres on the cropped grid area.
pub(crate) fn bubble_centers(contours: &[ContourInfo]) -> Vec<PointF> {
    let candidates: Vec<&ContourInfo> = external_contours(contours)
        .into_iter()
        .filter(|c| {
            let circularity = c.circularity();
            let aspect = c.bbox.aspect();
            circularity > CLUSTER_CIRCULARITY_RANGE.0
                && circularity < CLUSTER_CIRCULARITY_RANGE.1
                && aspect > CLUSTER_ASPECT_RANGE.0
                && aspect < CLUSTER_ASPECT_RANGE.1
        })
        // Rectangle-ish contours slip through the circularity band; the
        // four-vertex test removes them.
        .filter(|c| approximate_polygon(&c.points, 0.01 * c.perimeter).len() != 4)
        .collect();
    if candidates.is_empty() {
        return Vec::new();
    }

    let mean_area =
        candidates.iter().map(|c| c.area).sum::<f64>() / candidates.len() as f64;
    candidates
        .into_iter()
        .filter(|c| {
            c.area >= CLUSTER_AREA_BAND.0 * mean_area && c.area <= CLUSTER_AREA_BAND.1 * mean_area
        })
        .map(|c| c.centroid)
        .collect()
}

/// Full clustering detection over a warped template image.
pub(crate) fn detect_clustering_layout(
    warped: &GrayImage,
    params: &ClusteringParams,
) -> Result<(TemplateConfig, Vec<PointF>)> {
    let edges = edge_map(warped, TEMPLATE_CANNY.0, TEMPLATE_CANNY.1);
    let contours = trace_contours(&edges);

    // Crop below the header rule, when present.
    let crop_y = header_rule_bottom(&contours, f64::from(warped.width())).unwrap_or(0);
    let (contours, crop_offset) = if crop_y > 0 && crop_y < warped.height() {
        let cropped = image::imageops::crop_imm(
            warped,
            0,
            crop_y,
            warped.width(),
            warped.height() - crop_y,
        )
        .to_image();
        let edges = edge_map(&cropped, TEMPLATE_CANNY.0, TEMPLATE_CANNY.1);
        (trace_contours(&edges), f64::from(crop_y))
    } else {
        (contours, 0.0)
    };

    let centers = bubble_centers(&contours);
    let rows_per_column = params.num_of_rows_per_column as usize;
    let options = params.num_of_options_per_question as usize;
    let columns = cluster_points(&centers, params.num_of_columns as usize, false)?;

    let mut grid: BTreeMap<String, BTreeMap<String, Vec<BubblePoint>>> = BTreeMap::new();
    let mut all_points = Vec::new();

    for (col_idx, column) in columns.iter().enumerate() {
        let rows: Vec<Vec<PointF>> = if column.len() == rows_per_column * options {
            // Exact count: slice by y order.
            let mut sorted = column.clone();
            sorted.sort_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal));
            sorted
                .chunks(options)
                .map(|chunk| {
                    let mut row = chunk.to_vec();
                    row.sort_by(|a, b| {
                        a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal)
                    });
                    row
                })
                .collect()
        } else {
            let mut rows = cluster_points(column, rows_per_column, true)?;
            for row in &mut rows {
                row.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
            }
            let reference = reference_positions(&rows, options).ok_or_else(|| {
                Error::validation(format!("no complete reference row in column {}", col_idx + 1))
            })?;
            rows.iter().map(|row| repair_row(row, &reference)).collect()
        };

        let mut column_map = BTreeMap::new();
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != options {
                return Err(Error::validation(format!(
                    "column {} row {} has {} bubbles after repair (expected {options})",
                    col_idx + 1,
                    row_idx + 1,
                    row.len()
                )));
            }
            let points: Vec<BubblePoint> = row
                .iter()
                .map(|p| BubblePoint {
                    x: p.x.round() as i32,
                    y: (p.y + crop_offset).round() as i32,
                })
                .collect();
            all_points.extend(row.iter().map(|p| PointF::new(p.x, p.y + crop_offset)));
            column_map.insert((row_idx + 1).to_string(), points);
        }
        grid.insert((col_idx + 1).to_string(), column_map);
    }

    let metadata = TemplateConfigMetadata {
        num_questions: params.num_of_columns * params.num_of_rows_per_column,
        column_row_distribution: vec![params.num_of_rows_per_column; params.num_of_columns as usize],
        options_per_question: params.num_of_options_per_question,
        num_columns: params.num_of_columns,
    };

    Ok((
        TemplateConfig {
            metadata,
            bubble_configs: None,
            bubbles: Some(grid),
        },
        all_points,
    ))
}
