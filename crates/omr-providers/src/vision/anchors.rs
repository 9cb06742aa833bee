//! Calibration-rectangle detection, categorization, and the warp onto the
//! fixed template canvas.

use image::GrayImage;
use imageproc::geometric_transformations::{Interpolation, warp_into};

use omr_domain::constants::vision::{RECT_MIN_AREA, TARGET_HEIGHT, TARGET_WIDTH, TEMPLATE_CANNY};
use omr_domain::error::{Error, Result};
use omr_domain::value_objects::{Homography, PointF};

use super::contours::{ContourInfo, approximate_polygon, external_contours, trace_contours};
use super::geometry::{homography_from_points, order_corners, to_projection};
use super::image_ops::edge_map;

/// A detected calibration rectangle with its corners ordered TL, TR, BR, BL.
#[derive(Debug, Clone)]
pub(crate) struct DetectedRect {
    pub area: f64,
    pub center: PointF,
    pub corners: [PointF; 4],
    pub aspect: f64,
}

/// The four anchors of a form, one per corner.
#[derive(Debug, Clone)]
pub(crate) struct CornerAnchors {
    pub top_left: DetectedRect,
    pub top_right: DetectedRect,
    pub bottom_right: DetectedRect,
    pub bottom_left: DetectedRect,
}

impl CornerAnchors {
    /// The outermost corner of each anchor: the quadrilateral the warp
    /// maps onto the target canvas.
    pub fn outer_corners(&self) -> [PointF; 4] {
        [
            self.top_left.corners[0],
            self.top_right.corners[1],
            self.bottom_right.corners[2],
            self.bottom_left.corners[3],
        ]
    }
}

/// Find rectangle candidates: contours whose simplified polygon has four
/// vertices and whose area clears the anchor minimum. Sorted by area
/// descending.
pub(crate) fn detect_rectangles(contours: &[ContourInfo]) -> Vec<DetectedRect> {
    let mut rects = Vec::new();
    for contour in external_contours(contours) {
        if contour.area < RECT_MIN_AREA {
            continue;
        }
        let approx = approximate_polygon(&contour.points, 0.02 * contour.perimeter);
        if approx.len() != 4 {
            continue;
        }
        let Ok(corners) = order_corners(&approx) else {
            continue;
        };
        rects.push(DetectedRect {
            area: contour.area,
            center: contour.centroid,
            corners,
            aspect: contour.bbox.aspect(),
        });
    }
    rects.sort_by(|a, b| b.area.partial_cmp(&a.area).unwrap_or(std::cmp::Ordering::Equal));
    rects
}

fn assign_corners(rects: &[DetectedRect]) -> [Option<DetectedRect>; 4] {
    // TL/BR by coordinate-sum extremes, TR/BL by difference extremes over
    // rectangle centres.
    let mut assigned: [Option<DetectedRect>; 4] = [None, None, None, None];
    let keys: [(fn(&PointF) -> f64, bool); 4] = [
        (|p| p.x + p.y, false), // top_left
        (|p| p.y - p.x, false), // top_right
        (|p| p.x + p.y, true),  // bottom_right
        (|p| p.y - p.x, true),  // bottom_left
    ];
    for (slot, (key, want_max)) in keys.iter().enumerate() {
        let mut best: Option<&DetectedRect> = None;
        for rect in rects {
            let better = match best {
                None => true,
                Some(current) => {
                    if *want_max {
                        key(&rect.center) > key(&current.center)
                    } else {
                        key(&rect.center) < key(&current.center)
                    }
                }
            };
            if better {
                best = Some(rect);
            }
        }
        assigned[slot] = best.cloned();
    }
    assigned
}

/// Categorize anchors from the detected rectangles.
///
/// The four square anchors are the smaller rectangles; the big wide box
/// near the top is the index-number field. With only three anchors found,
/// the missing top-right is synthesized from the index box's top-right
/// corner; anything less is a validation failure.
pub(crate) fn categorize_anchors(
    rects: &[DetectedRect],
    image_height: f64,
) -> Result<CornerAnchors> {
    // Wide boxes can't be corner anchors; they are index-number fields or
    // headers.
    let squares: Vec<DetectedRect> = rects
        .iter()
        .filter(|r| r.aspect < 2.0 && r.aspect > 0.5)
        .cloned()
        .collect();

    if squares.len() >= 4 {
        let [tl, tr, br, bl] = assign_corners(&squares);
        if let (Some(tl), Some(tr), Some(br), Some(bl)) = (tl, tr, br, bl) {
            let distinct = {
                let centers = [&tl.center, &tr.center, &br.center, &bl.center];
                centers
                    .iter()
                    .enumerate()
                    .all(|(i, a)| centers.iter().skip(i + 1).all(|b| {
                        (a.x - b.x).abs() > 1.0 || (a.y - b.y).abs() > 1.0
                    }))
            };
            if distinct {
                return Ok(CornerAnchors {
                    top_left: tl,
                    top_right: tr,
                    bottom_right: br,
                    bottom_left: bl,
                });
            }
        }
    }

    if squares.len() == 3 {
        // Look for the index-number box: a wide rectangle in the top half.
        let index_box = rects
            .iter()
            .find(|r| r.aspect >= 2.0 && r.center.y < image_height / 2.0);
        if let Some(index_box) = index_box {
            let [tl, _, br, bl] = assign_corners(&squares);
            if let (Some(tl), Some(br), Some(bl)) = (tl, br, bl) {
                let synthesized = DetectedRect {
                    area: index_box.area,
                    center: PointF::new(index_box.corners[1].x, tl.center.y),
                    corners: [
                        index_box.corners[1],
                        index_box.corners[1],
                        index_box.corners[1],
                        index_box.corners[1],
                    ],
                    aspect: 1.0,
                };
                return Ok(CornerAnchors {
                    top_left: tl,
                    top_right: synthesized,
                    bottom_right: br,
                    bottom_left: bl,
                });
            }
        }
    }

    Err(Error::validation(format!(
        "Less than 4 calibration rectangles found ({} usable)",
        squares.len()
    )))
}

/// Detect anchors on a grayscale form.
pub(crate) fn find_anchors(gray: &GrayImage) -> Result<CornerAnchors> {
    let edges = edge_map(gray, TEMPLATE_CANNY.0, TEMPLATE_CANNY.1);
    let contours = trace_contours(&edges);
    let rects = detect_rectangles(&contours);
    categorize_anchors(&rects, f64::from(gray.height()))
}

/// Homography mapping the target canvas onto the source image given the
/// source's anchors.
pub(crate) fn canvas_to_image(anchors: &CornerAnchors, canvas: (u32, u32)) -> Option<Homography> {
    let (w, h) = (f64::from(canvas.0), f64::from(canvas.1));
    let canvas_corners = [
        PointF::new(0.0, 0.0),
        PointF::new(w, 0.0),
        PointF::new(w, h),
        PointF::new(0.0, h),
    ];
    homography_from_points(&canvas_corners, &anchors.outer_corners())
}

/// Warp a form onto the fixed template canvas using its anchors.
pub(crate) fn warp_to_canvas(gray: &GrayImage, anchors: &CornerAnchors) -> Result<GrayImage> {
    let source_corners = anchors.outer_corners();
    let target_corners = [
        PointF::new(0.0, 0.0),
        PointF::new(f64::from(TARGET_WIDTH), 0.0),
        PointF::new(f64::from(TARGET_WIDTH), f64::from(TARGET_HEIGHT)),
        PointF::new(0.0, f64::from(TARGET_HEIGHT)),
    ];
    let homography = homography_from_points(&source_corners, &target_corners)
        .ok_or_else(|| Error::vision("degenerate anchor geometry"))?;
    let projection = to_projection(&homography)
        .ok_or_else(|| Error::vision("anchor projection not invertible"))?;

    let mut warped = GrayImage::new(TARGET_WIDTH, TARGET_HEIGHT);
    warp_into(
        gray,
        &projection,
        Interpolation::Bilinear,
        image::Luma([255u8]),
        &mut warped,
    );
    Ok(warped)
}
