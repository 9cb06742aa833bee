//! Vision ports.
//!
//! The image-analysis stages are pure functions with typed inputs and
//! outputs: encoded image bytes in, domain geometry out. They are
//! synchronous and CPU-bound; callers run them under a blocking task so a
//! slow stage on one queue never starves the other consumers.

use crate::error::Result;
use crate::registry::messages::ImageDimensions;
use crate::value_objects::{BubbleMark, ClusteringParams, Homography, PointF, TemplateConfig};

/// Everything the template-configuration stage produces.
#[derive(Debug, Clone)]
pub struct TemplateConfigOutput {
    pub config: TemplateConfig,
    /// The warped (normalized) template image, JPEG-encoded.
    pub warped_image: Vec<u8>,
    /// Annotated debug image, when requested.
    pub annotated_image: Option<Vec<u8>>,
    pub dimensions: ImageDimensions,
}

/// Bubble detection on a blank template.
pub trait TemplateVision: Send + Sync {
    /// Grid-based detection: anchors → warp → circles → row/column sweep.
    fn detect_grid(&self, image: &[u8], want_annotated: bool) -> Result<TemplateConfigOutput>;

    /// Clustering-based detection: crop below the header rule → circles →
    /// k-means columns/rows → impute/prune per row.
    fn detect_clustering(
        &self,
        image: &[u8],
        params: &ClusteringParams,
        want_annotated: bool,
    ) -> Result<TemplateConfigOutput>;
}

/// Display class of a bubble on an annotated sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleClass {
    Correct,
    Incorrect,
    MultiMarked,
    Unmarked,
}

/// Mark reading on scheme and answer-sheet images.
pub trait MarkingVision: Send + Sync {
    /// Estimate the projective transform mapping reference-image
    /// coordinates to target-image coordinates. `None` means the target
    /// could not be aligned (too few anchors or a degenerate solve).
    fn estimate_homography(&self, reference: &[u8], target: &[u8]) -> Result<Option<Homography>>;

    /// Project each bubble centre through `homography` and sample the
    /// binarized target around it. Output order matches `bubbles`.
    fn read_marks(
        &self,
        image: &[u8],
        homography: &Homography,
        bubbles: &[PointF],
    ) -> Result<Vec<BubbleMark>>;

    /// Render the sheet with one colored dot per bubble
    /// (green/red/blue/yellow for correct/incorrect/multi/unmarked).
    /// `classes` runs parallel to `marks`. Returns JPEG bytes.
    fn annotate(
        &self,
        image: &[u8],
        marks: &[BubbleMark],
        classes: &[BubbleClass],
    ) -> Result<Vec<u8>>;
}

/// Locates and crops the handwritten-index box on an answer sheet.
pub trait IndexSectionDetector: Send + Sync {
    /// Returns the axis-aligned crop of the index-number region, encoded
    /// as PNG for the recognizer.
    fn extract_index_section(&self, image: &[u8]) -> Result<Vec<u8>>;
}
