//! Planar geometry shared by the vision ports.

use serde::{Deserialize, Serialize};

/// A point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for PointF {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A 3×3 projective transform in row-major order, mapping reference-image
/// coordinates to target-image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    m: [f64; 9],
}

impl Homography {
    /// Wrap a row-major 3×3 matrix.
    #[must_use]
    pub fn from_row_major(m: [f64; 9]) -> Self {
        Self { m }
    }

    /// The identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        }
    }

    #[must_use]
    pub fn as_row_major(&self) -> [f64; 9] {
        self.m
    }

    /// Apply the transform to a point (homogeneous divide included).
    ///
    /// Points whose projected `w` is ~0 map to the origin; callers sampling
    /// pixels bounds-check anyway.
    #[must_use]
    pub fn apply(&self, p: PointF) -> PointF {
        let m = &self.m;
        let w = m[6] * p.x + m[7] * p.y + m[8];
        if w.abs() < f64::EPSILON {
            return PointF::new(0.0, 0.0);
        }
        PointF::new(
            (m[0] * p.x + m[1] * p.y + m[2]) / w,
            (m[3] * p.x + m[4] * p.y + m[5]) / w,
        )
    }

    /// Apply the transform to a slice of points.
    #[must_use]
    pub fn apply_all(&self, points: &[PointF]) -> Vec<PointF> {
        points.iter().map(|p| self.apply(*p)).collect()
    }

    /// Returns `true` when the transform is within `epsilon` of the
    /// identity after normalizing the scale term.
    ///
    /// An essentially-identity alignment between two physically different
    /// scans means the estimator degenerated.
    #[must_use]
    pub fn is_near_identity(&self, epsilon: f64) -> bool {
        let w = self.m[8];
        if w.abs() < f64::EPSILON {
            return false;
        }
        let id = Homography::identity();
        self.m
            .iter()
            .zip(id.m.iter())
            .all(|(a, b)| (a / w - b).abs() <= epsilon)
    }
}
