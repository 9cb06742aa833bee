//! Projective geometry: corner ordering and the four-point homography
//! solve used for warping and sheet alignment.

use omr_domain::error::{Error, Result};
use omr_domain::value_objects::{Homography, PointF};

/// Order four corners TL, TR, BR, BL: the coordinate sum is smallest at
/// the top-left and largest at the bottom-right; the difference `y - x` is
/// smallest at the top-right and largest at the bottom-left.
pub(crate) fn order_corners(corners: &[PointF]) -> Result<[PointF; 4]> {
    if corners.len() != 4 {
        return Err(Error::vision(format!(
            "corner ordering needs 4 points, got {}",
            corners.len()
        )));
    }
    let by_key = |key: fn(&PointF) -> f64, max: bool| -> PointF {
        let mut best = corners[0];
        for p in &corners[1..] {
            let better = if max { key(p) > key(&best) } else { key(p) < key(&best) };
            if better {
                best = *p;
            }
        }
        best
    };
    let sum = |p: &PointF| p.x + p.y;
    let diff = |p: &PointF| p.y - p.x;
    Ok([
        by_key(sum, false),
        by_key(diff, false),
        by_key(sum, true),
        by_key(diff, true),
    ])
}

/// Solve the 8×8 linear system of the four-point perspective transform
/// mapping `src[i] → dst[i]`. `None` when the points are degenerate.
pub(crate) fn homography_from_points(src: &[PointF; 4], dst: &[PointF; 4]) -> Option<Homography> {
    let mut a = [[0.0f64; 9]; 8];
    for i in 0..4 {
        let (x, y) = (src[i].x, src[i].y);
        let (u, v) = (dst[i].x, dst[i].y);
        a[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y, u];
        a[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y, v];
    }

    // Gaussian elimination with partial pivoting on the augmented system.
    let mut h = [0.0f64; 8];
    for col in 0..8 {
        let pivot = (col..8).max_by(|&p, &q| {
            a[p][col]
                .abs()
                .partial_cmp(&a[q][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < 1e-10 {
            return None;
        }
        a.swap(col, pivot);
        let lead = a[col][col];
        for k in col..9 {
            a[col][k] /= lead;
        }
        for row in 0..8 {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..9 {
                a[row][k] -= factor * a[col][k];
            }
        }
    }
    for (i, value) in h.iter_mut().enumerate() {
        *value = a[i][8];
    }

    Some(Homography::from_row_major([
        h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0,
    ]))
}

/// Convert to the `imageproc` projection for warping. `None` when the
/// matrix is not invertible.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn to_projection(
    h: &Homography,
) -> Option<imageproc::geometric_transformations::Projection> {
    let m = h.as_row_major();
    let as_f32: [f32; 9] = [
        m[0] as f32,
        m[1] as f32,
        m[2] as f32,
        m[3] as f32,
        m[4] as f32,
        m[5] as f32,
        m[6] as f32,
        m[7] as f32,
        m[8] as f32,
    ];
    imageproc::geometric_transformations::Projection::from_matrix(as_f32)
}
