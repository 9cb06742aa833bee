//! Decode/encode and filtering helpers shared by the vision stages.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;

use omr_domain::constants::vision::CONTRAST_ENHANCEMENT;
use omr_domain::error::{Error, Result};

pub(crate) fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes)
        .map_err(|e| Error::vision(format!("could not decode image: {e}")))
}

pub(crate) fn decode_gray(bytes: &[u8]) -> Result<GrayImage> {
    Ok(decode(bytes)?.to_luma8())
}

/// Decode with the standard contrast boost applied. Every template,
/// scheme, and answer-sheet image is loaded this way before anchors or
/// ink are measured; the binarization thresholds are calibrated against
/// the boosted pixels.
pub(crate) fn decode_enhanced_gray(bytes: &[u8]) -> Result<GrayImage> {
    Ok(decode(bytes)?
        .adjust_contrast((CONTRAST_ENHANCEMENT - 1.0) * 100.0)
        .to_luma8())
}

pub(crate) fn decode_rgb(bytes: &[u8]) -> Result<RgbImage> {
    Ok(decode(bytes)?.to_rgb8())
}

pub(crate) fn encode_jpeg(image: DynamicImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|e| Error::vision(format!("could not encode jpeg: {e}")))?;
    Ok(out.into_inner())
}

pub(crate) fn encode_png(image: DynamicImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| Error::vision(format!("could not encode png: {e}")))?;
    Ok(out.into_inner())
}

/// Blur-then-Canny, the edge map every contour stage starts from.
pub(crate) fn edge_map(gray: &GrayImage, low: f32, high: f32) -> GrayImage {
    let blurred = gaussian_blur_f32(gray, 1.0);
    canny(&blurred, low, high)
}

/// Binarize so ink (dark pixels) becomes foreground, then open with a 5×5
/// square to drop speckle.
pub(crate) fn ink_mask(gray: &GrayImage, threshold: u8) -> GrayImage {
    let mut mask = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in gray.enumerate_pixels() {
        mask.put_pixel(
            x,
            y,
            image::Luma([if pixel.0[0] < threshold { 255 } else { 0 }]),
        );
    }
    imageproc::morphology::open(&mask, imageproc::distance_transform::Norm::LInf, 2)
}
