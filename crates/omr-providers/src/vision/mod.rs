//! Vision providers: template configuration, mark reading, and the
//! index-section detector, built on `image` + `imageproc`.

mod anchors;
mod clustering;
mod contours;
mod geometry;
mod grid;
mod image_ops;
mod index_section;
mod marks;
mod template;

pub use index_section::ContourIndexSectionDetector;
pub use marks::AnchorMarkingVision;
pub use template::OmrTemplateVision;
