//! Handwritten-index box extraction.
//!
//! Resize to the operating frame, trace the full contour tree, descend
//! largest-outer → largest-child → largest-grandchild (falling back to the
//! best level found), fit a minimum-area rectangle, and warp it to an
//! axis-aligned crop for the recognizer.

use image::{DynamicImage, GrayImage};
use imageproc::geometric_transformations::{Interpolation, warp_into};
use imageproc::geometry::min_area_rect;
use imageproc::point::Point;

use omr_domain::constants::vision::{
    INDEX_CANNY, INDEX_MIN_AREA_FRACTION, INDEX_OPERATING_SIZE,
};
use omr_domain::error::{Error, Result};
use omr_domain::ports::IndexSectionDetector;
use omr_domain::value_objects::PointF;

use super::contours::{ContourInfo, trace_contours};
use super::geometry::{homography_from_points, order_corners, to_projection};
use super::image_ops::{decode_gray, encode_png};

/// Contour-hierarchy [`IndexSectionDetector`].
#[derive(Debug, Clone)]
pub struct ContourIndexSectionDetector {
    blur_spread: u32,
}

impl ContourIndexSectionDetector {
    #[must_use]
    pub fn new(blur_spread: u32) -> Self {
        // Kernel side must be odd.
        let blur_spread = if blur_spread % 2 == 1 {
            blur_spread
        } else {
            blur_spread + 1
        };
        Self { blur_spread }
    }

    fn largest(indices: impl Iterator<Item = usize>, contours: &[ContourInfo]) -> Option<usize> {
        indices.max_by(|&a, &b| {
            contours[a]
                .area
                .partial_cmp(&contours[b].area)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Descend the hierarchy; each level must clear the area floor, and a
    /// missing level falls back to the best contour found so far.
    fn target_contour<'a>(
        contours: &'a [ContourInfo],
        min_area: f64,
    ) -> Result<&'a ContourInfo> {
        let outer = Self::largest(
            (0..contours.len()).filter(|&i| contours[i].area >= min_area),
            contours,
        )
        .ok_or_else(|| Error::validation("no contour large enough for an index box"))?;

        let child = Self::largest(
            (0..contours.len())
                .filter(|&i| contours[i].parent == Some(outer) && contours[i].area >= min_area / 4.0),
            contours,
        );
        let Some(child) = child else {
            return Ok(&contours[outer]);
        };

        let grandchild = Self::largest(
            (0..contours.len())
                .filter(|&i| contours[i].parent == Some(child) && contours[i].area >= min_area / 16.0),
            contours,
        );
        Ok(&contours[grandchild.unwrap_or(child)])
    }
}

impl Default for ContourIndexSectionDetector {
    fn default() -> Self {
        Self::new(omr_domain::constants::vision::INDEX_BLUR_SPREAD)
    }
}

impl IndexSectionDetector for ContourIndexSectionDetector {
    fn extract_index_section(&self, image: &[u8]) -> Result<Vec<u8>> {
        let (width, height) = INDEX_OPERATING_SIZE;
        let resized: GrayImage = image::imageops::resize(
            &decode_gray(image)?,
            width,
            height,
            image::imageops::FilterType::Triangle,
        );

        let sigma = self.blur_spread as f32 / 2.0;
        let blurred = imageproc::filter::gaussian_blur_f32(&resized, sigma);
        let edges = imageproc::edges::canny(&blurred, INDEX_CANNY.0, INDEX_CANNY.1);
        let contours = trace_contours(&edges);

        let min_area = INDEX_MIN_AREA_FRACTION * f64::from(width) * f64::from(height);
        let target = Self::target_contour(&contours, min_area)?;

        let hull_points: Vec<Point<i32>> = target
            .points
            .iter()
            .map(|p| Point::new(p.x.round() as i32, p.y.round() as i32))
            .collect();
        let rect = min_area_rect(&hull_points);
        let corners: Vec<PointF> = rect
            .iter()
            .map(|p| PointF::new(f64::from(p.x), f64::from(p.y)))
            .collect();
        let ordered = order_corners(&corners)?;

        let crop_width = (ordered[2].x - ordered[3].x)
            .hypot(ordered[2].y - ordered[3].y)
            .max((ordered[1].x - ordered[0].x).hypot(ordered[1].y - ordered[0].y))
            .round()
            .max(1.0) as u32;
        let crop_height = (ordered[1].x - ordered[2].x)
            .hypot(ordered[1].y - ordered[2].y)
            .max((ordered[0].x - ordered[3].x).hypot(ordered[0].y - ordered[3].y))
            .round()
            .max(1.0) as u32;

        let destination = [
            PointF::new(0.0, 0.0),
            PointF::new(f64::from(crop_width) - 1.0, 0.0),
            PointF::new(f64::from(crop_width) - 1.0, f64::from(crop_height) - 1.0),
            PointF::new(0.0, f64::from(crop_height) - 1.0),
        ];
        let homography = homography_from_points(&ordered, &destination)
            .ok_or_else(|| Error::vision("degenerate index box geometry"))?;
        let projection = to_projection(&homography)
            .ok_or_else(|| Error::vision("index box projection not invertible"))?;

        let mut crop = GrayImage::new(crop_width, crop_height);
        warp_into(
            &resized,
            &projection,
            Interpolation::Bilinear,
            image::Luma([255u8]),
            &mut crop,
        );
        encode_png(DynamicImage::ImageLuma8(crop))
    }
}
