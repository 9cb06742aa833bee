//! Template configuration: anchors → warp → bubble detection.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};

use omr_domain::constants::vision::{TARGET_HEIGHT, TARGET_WIDTH};
use omr_domain::error::Result;
use omr_domain::ports::{TemplateConfigOutput, TemplateVision};
use omr_domain::registry::messages::ImageDimensions;
use omr_domain::value_objects::{ClusteringParams, PointF};

use super::anchors::{find_anchors, warp_to_canvas};
use super::clustering::detect_clustering_layout;
use super::grid::{Circle, detect_grid_layout};
use super::image_ops::{decode_enhanced_gray, encode_jpeg};

/// [`TemplateVision`] over the anchor-warp pipeline.
#[derive(Debug, Default, Clone)]
pub struct OmrTemplateVision;

impl OmrTemplateVision {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn warp(&self, image: &[u8]) -> Result<(image::GrayImage, ImageDimensions)> {
        let original = decode_enhanced_gray(image)?;
        let dimensions = ImageDimensions {
            original_width: original.width(),
            original_height: original.height(),
            processed_width: TARGET_WIDTH,
            processed_height: TARGET_HEIGHT,
        };
        let anchors = find_anchors(&original)?;
        let warped = warp_to_canvas(&original, &anchors)?;
        Ok((warped, dimensions))
    }

    fn annotate_circles(warped: &image::GrayImage, circles: &[Circle]) -> RgbImage {
        let mut canvas = DynamicImage::ImageLuma8(warped.clone()).to_rgb8();
        for circle in circles {
            draw_hollow_circle_mut(
                &mut canvas,
                (
                    circle.center.x.round() as i32,
                    circle.center.y.round() as i32,
                ),
                circle.radius.round() as i32,
                Rgb([0, 200, 0]),
            );
        }
        canvas
    }

    fn annotate_points(warped: &image::GrayImage, points: &[PointF]) -> RgbImage {
        let mut canvas = DynamicImage::ImageLuma8(warped.clone()).to_rgb8();
        for p in points {
            draw_filled_circle_mut(
                &mut canvas,
                (p.x.round() as i32, p.y.round() as i32),
                3,
                Rgb([0, 200, 0]),
            );
        }
        canvas
    }
}

impl TemplateVision for OmrTemplateVision {
    fn detect_grid(&self, image: &[u8], want_annotated: bool) -> Result<TemplateConfigOutput> {
        let (warped, dimensions) = self.warp(image)?;
        let (config, circles) = detect_grid_layout(&warped)?;
        let annotated_image = if want_annotated {
            Some(encode_jpeg(DynamicImage::ImageRgb8(Self::annotate_circles(
                &warped, &circles,
            )))?)
        } else {
            None
        };
        Ok(TemplateConfigOutput {
            config,
            warped_image: encode_jpeg(DynamicImage::ImageLuma8(warped))?,
            annotated_image,
            dimensions,
        })
    }

    fn detect_clustering(
        &self,
        image: &[u8],
        params: &ClusteringParams,
        want_annotated: bool,
    ) -> Result<TemplateConfigOutput> {
        let (warped, dimensions) = self.warp(image)?;
        let (config, points) = detect_clustering_layout(&warped, params)?;
        let annotated_image = if want_annotated {
            Some(encode_jpeg(DynamicImage::ImageRgb8(Self::annotate_points(
                &warped, &points,
            )))?)
        } else {
            None
        };
        Ok(TemplateConfigOutput {
            config,
            warped_image: encode_jpeg(DynamicImage::ImageLuma8(warped))?,
            annotated_image,
            dimensions,
        })
    }
}
