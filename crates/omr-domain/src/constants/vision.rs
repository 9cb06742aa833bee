//! Tunables for the image-analysis stages.
//!
//! Values mirror the calibrated behaviour of the production forms; changing
//! them changes which contours are accepted as anchors or bubbles.

/// Width of the normalized (warped) template canvas.
pub const TARGET_WIDTH: u32 = 1200;
/// Height of the normalized (warped) template canvas.
pub const TARGET_HEIGHT: u32 = 1600;

/// Minimum contour area for a calibration rectangle.
pub const RECT_MIN_AREA: f64 = 400.0;
/// Minimum contour area for a grid-mode bubble.
pub const BUBBLE_MIN_AREA: f64 = 200.0;
/// Minimum circularity (`4*pi*area/perimeter^2`) for a grid-mode bubble.
pub const BUBBLE_MIN_CIRCULARITY: f64 = 0.85;

/// Circularity band accepted by the clustering-mode bubble filter.
pub const CLUSTER_CIRCULARITY_RANGE: (f64, f64) = (0.7, 1.2);
/// Aspect-ratio band accepted by the clustering-mode bubble filter.
pub const CLUSTER_ASPECT_RANGE: (f64, f64) = (0.8, 1.25);
/// Area band relative to the mean bubble area, `(lower, upper)` factors.
pub const CLUSTER_AREA_BAND: (f64, f64) = (0.5, 1.5);
/// Pixel tolerance when matching a bubble against a reference x position.
pub const IMPUTE_TOLERANCE_PX: f64 = 10.0;

/// A gap wider than this factor times `x_offset` starts a new column.
pub const COLUMN_GAP_FACTOR: f64 = 1.6;

/// Minimum thickness (px) of the header rule above the bubble grid.
pub const HEADER_LINE_MIN_THICKNESS: u32 = 3;
/// Minimum aspect ratio (w/h) of the header rule.
pub const HEADER_LINE_MIN_ASPECT: f64 = 3.0;

/// Gray threshold below which a pixel counts as ink.
pub const BINARY_THRESHOLD: u8 = 200;
/// Half-width of the square neighbourhood sampled around a bubble centre.
pub const MARK_NEIGHBOURHOOD: i32 = 5;
/// Lit-pixel count above which a bubble counts as marked.
pub const MARK_PIXEL_THRESHOLD: u32 = 15;

/// Canny thresholds for template/bubble detection.
pub const TEMPLATE_CANNY: (f32, f32) = (50.0, 150.0);
/// Canny thresholds for the index-section detector.
pub const INDEX_CANNY: (f32, f32) = (10.0, 50.0);

/// Operating size the index-section detector resizes to.
pub const INDEX_OPERATING_SIZE: (u32, u32) = (1000, 1500);
/// Default Gaussian blur spread (kernel side) for the index detector.
pub const INDEX_BLUR_SPREAD: u32 = 5;
/// Minimum contour area fraction (of the operating frame) for the index box.
pub const INDEX_MIN_AREA_FRACTION: f64 = 0.01;

/// OCR confidence below which an index reading is flagged.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Contrast enhancement applied when loading template/sheet images.
pub const CONTRAST_ENHANCEMENT: f32 = 1.5;
