//! Contour analytics over `imageproc`'s border-following output.

use image::GrayImage;
use imageproc::contours::{BorderType, Contour, find_contours};

use omr_domain::value_objects::PointF;

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn aspect(&self) -> f64 {
        if self.height == 0.0 { 0.0 } else { self.width / self.height }
    }
}

/// A traced contour with its derived measurements.
#[derive(Debug, Clone)]
pub(crate) struct ContourInfo {
    pub points: Vec<PointF>,
    pub area: f64,
    pub perimeter: f64,
    pub bbox: BoundingBox,
    pub centroid: PointF,
    pub parent: Option<usize>,
    pub is_outer: bool,
}

impl ContourInfo {
    /// `4πA / P²`: 1.0 for a circle, ~0.785 for a square.
    pub fn circularity(&self) -> f64 {
        if self.perimeter == 0.0 {
            return 0.0;
        }
        4.0 * std::f64::consts::PI * self.area / (self.perimeter * self.perimeter)
    }

    /// Radius of the bounding-box-fitted circle.
    pub fn radius(&self) -> f64 {
        self.bbox.width.max(self.bbox.height) / 2.0
    }
}

/// Shoelace area of a closed polygon.
pub(crate) fn polygon_area(points: &[PointF]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut doubled = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        doubled += a.x * b.y - b.x * a.y;
    }
    doubled.abs() / 2.0
}

fn polygon_perimeter(points: &[PointF]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        total += ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
    }
    total
}

fn measure(points: Vec<PointF>, parent: Option<usize>, is_outer: bool) -> ContourInfo {
    let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
    let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
    let (mut sum_x, mut sum_y) = (0.0, 0.0);
    for p in &points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
        sum_x += p.x;
        sum_y += p.y;
    }
    let n = points.len().max(1) as f64;
    ContourInfo {
        area: polygon_area(&points),
        perimeter: polygon_perimeter(&points),
        bbox: BoundingBox {
            x: min_x,
            y: min_y,
            width: (max_x - min_x).max(0.0),
            height: (max_y - min_y).max(0.0),
        },
        centroid: PointF::new(sum_x / n, sum_y / n),
        parent,
        is_outer,
        points,
    }
}

/// Trace every contour in a binary image and measure it. Index positions
/// are stable, so `parent` links stay valid.
pub(crate) fn trace_contours(edges: &GrayImage) -> Vec<ContourInfo> {
    let raw: Vec<Contour<i32>> = find_contours(edges);
    raw.into_iter()
        .map(|c| {
            let points = c
                .points
                .iter()
                .map(|p| PointF::new(f64::from(p.x), f64::from(p.y)))
                .collect();
            measure(points, c.parent, c.border_type == BorderType::Outer)
        })
        .collect()
}

/// Only the outermost contours (no parent of the same polarity chain).
pub(crate) fn external_contours(contours: &[ContourInfo]) -> Vec<&ContourInfo> {
    contours
        .iter()
        .filter(|c| c.is_outer && c.parent.is_none())
        .collect()
}

/// Douglas-Peucker simplification of a closed contour; epsilon is a
/// fraction of the perimeter, matching the rectangle test the detection
/// stages apply.
pub(crate) fn approximate_polygon(points: &[PointF], epsilon: f64) -> Vec<PointF> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let curve: Vec<imageproc::point::Point<f64>> = points
        .iter()
        .map(|p| imageproc::point::Point::new(p.x, p.y))
        .collect();
    imageproc::geometry::approximate_polygon_dp(&curve, epsilon, true)
        .into_iter()
        .map(|p| PointF::new(p.x, p.y))
        .collect()
}
