//! Handwritten-text recognition port.

use async_trait::async_trait;

use crate::error::Result;

/// A recognized student index with its confidence in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexReading {
    pub text: String,
    pub confidence: f64,
}

/// Black-box recognizer for the cropped index-number region.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Recognize the digits in an encoded image crop.
    async fn recognize_digits(&self, image: &[u8]) -> Result<IndexReading>;
}
