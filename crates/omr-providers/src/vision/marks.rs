//! Mark reading on scheme and answer-sheet images.
//!
//! Alignment projects through the four calibration rectangles: the
//! reference is always the warped template (anchors at the canvas
//! corners), so the homography maps canvas coordinates onto the target
//! scan. Images are contrast-enhanced on load; sampling counts ink
//! pixels in the binarized target around each projected bubble centre.

use image::{DynamicImage, Rgb};
use imageproc::drawing::draw_filled_circle_mut;

use omr_domain::constants::vision::{BINARY_THRESHOLD, MARK_NEIGHBOURHOOD, MARK_PIXEL_THRESHOLD};
use omr_domain::error::{Error, Result};
use omr_domain::ports::{BubbleClass, MarkingVision};
use omr_domain::value_objects::{BubbleMark, Homography, PointF};

use super::anchors::{canvas_to_image, find_anchors};
use super::image_ops::{decode_enhanced_gray, decode_rgb, encode_jpeg, ink_mask};

/// Anchor-based [`MarkingVision`].
#[derive(Debug, Default, Clone)]
pub struct AnchorMarkingVision;

impl AnchorMarkingVision {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Ink pixels in the square neighbourhood around a point.
pub(crate) fn lit_neighbourhood(mask: &image::GrayImage, center: PointF, half_width: i32) -> u32 {
    let (width, height) = (mask.width() as i32, mask.height() as i32);
    let (cx, cy) = (center.x.round() as i32, center.y.round() as i32);
    let mut lit = 0u32;
    for x in cx - half_width..cx + half_width {
        for y in cy - half_width..cy + half_width {
            if x < 0 || y < 0 || x >= width || y >= height {
                continue;
            }
            if mask.get_pixel(x as u32, y as u32).0[0] > 0 {
                lit += 1;
            }
        }
    }
    lit
}

fn class_color(class: BubbleClass) -> Rgb<u8> {
    match class {
        BubbleClass::Correct => Rgb([0, 200, 0]),
        BubbleClass::Incorrect => Rgb([220, 0, 0]),
        BubbleClass::MultiMarked => Rgb([0, 0, 220]),
        BubbleClass::Unmarked => Rgb([230, 200, 0]),
    }
}

impl MarkingVision for AnchorMarkingVision {
    fn estimate_homography(&self, reference: &[u8], target: &[u8]) -> Result<Option<Homography>> {
        let reference = decode_enhanced_gray(reference)?;
        let target = decode_enhanced_gray(target)?;
        let anchors = match find_anchors(&target) {
            Ok(anchors) => anchors,
            Err(Error::Validation { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(canvas_to_image(
            &anchors,
            (reference.width(), reference.height()),
        ))
    }

    fn read_marks(
        &self,
        image: &[u8],
        homography: &Homography,
        bubbles: &[PointF],
    ) -> Result<Vec<BubbleMark>> {
        let gray = decode_enhanced_gray(image)?;
        let mask = ink_mask(&gray, BINARY_THRESHOLD);
        Ok(bubbles
            .iter()
            .map(|bubble| {
                let projected = homography.apply(*bubble);
                let lit = lit_neighbourhood(&mask, projected, MARK_NEIGHBOURHOOD);
                BubbleMark::new(
                    lit > MARK_PIXEL_THRESHOLD,
                    projected.x.round() as i32,
                    projected.y.round() as i32,
                )
            })
            .collect())
    }

    fn annotate(
        &self,
        image: &[u8],
        marks: &[BubbleMark],
        classes: &[BubbleClass],
    ) -> Result<Vec<u8>> {
        if marks.len() != classes.len() {
            return Err(Error::invalid_argument(format!(
                "{} marks but {} classes",
                marks.len(),
                classes.len()
            )));
        }
        let mut canvas = decode_rgb(image)?;
        for (mark, class) in marks.iter().zip(classes) {
            draw_filled_circle_mut(&mut canvas, (mark.x(), mark.y()), 4, class_color(*class));
        }
        encode_jpeg(DynamicImage::ImageRgb8(canvas))
    }
}
