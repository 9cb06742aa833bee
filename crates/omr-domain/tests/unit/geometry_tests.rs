//! Unit tests for homography application

use omr_domain::value_objects::{Homography, PointF};

#[test]
fn identity_maps_points_to_themselves() {
    let h = Homography::identity();
    let p = h.apply(PointF::new(123.0, 456.0));
    assert_eq!((p.x, p.y), (123.0, 456.0));
}

#[test]
fn translation() {
    let h = Homography::from_row_major([1.0, 0.0, 10.0, 0.0, 1.0, -5.0, 0.0, 0.0, 1.0]);
    let p = h.apply(PointF::new(1.0, 2.0));
    assert_eq!((p.x, p.y), (11.0, -3.0));
}

#[test]
fn homogeneous_divide() {
    // Pure scaling of w by 2 must cancel out.
    let h = Homography::from_row_major([2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0]);
    let p = h.apply(PointF::new(7.0, 9.0));
    assert!((p.x - 7.0).abs() < 1e-9);
    assert!((p.y - 9.0).abs() < 1e-9);
}

#[test]
fn near_identity_detection() {
    assert!(Homography::identity().is_near_identity(1e-6));

    let scaled_identity =
        Homography::from_row_major([3.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 3.0]);
    assert!(scaled_identity.is_near_identity(1e-6));

    let shift = Homography::from_row_major([1.0, 0.0, 40.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    assert!(!shift.is_near_identity(1e-3));
}

#[test]
fn apply_all_preserves_order() {
    let h = Homography::from_row_major([1.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0]);
    let out = h.apply_all(&[PointF::new(0.0, 0.0), PointF::new(2.0, 2.0)]);
    assert_eq!(out.len(), 2);
    assert_eq!((out[0].x, out[0].y), (1.0, 1.0));
    assert_eq!((out[1].x, out[1].y), (3.0, 3.0));
}
