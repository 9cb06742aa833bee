//! Digit recognition via the system `tesseract` binary.
//!
//! The crop is staged to a temp file and read back through tesseract's TSV
//! output, which carries a per-word confidence. Confidence of the reading
//! is the mean word confidence scaled to `0.0..=1.0`.

use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use omr_domain::error::{Error, Result};
use omr_domain::ports::{IndexReading, OcrProvider};

/// Tunables for the tesseract invocation.
#[derive(Debug, Clone)]
pub struct TesseractSettings {
    /// Explicit binary path; when `None` the binary is located on `PATH`.
    pub binary: Option<PathBuf>,
    /// Page segmentation mode. 7 = treat the image as a single text line.
    pub page_segmentation_mode: u32,
    /// Characters the recognizer may emit.
    pub whitelist: String,
}

impl Default for TesseractSettings {
    fn default() -> Self {
        Self {
            binary: None,
            page_segmentation_mode: 7,
            whitelist: "0123456789".to_owned(),
        }
    }
}

/// [`OcrProvider`] backed by a tesseract subprocess.
pub struct TesseractOcr {
    binary: PathBuf,
    settings: TesseractSettings,
}

impl TesseractOcr {
    /// Locate the binary and build the recognizer. Fails when tesseract is
    /// not installed.
    pub fn new(settings: TesseractSettings) -> Result<Self> {
        let binary = match &settings.binary {
            Some(path) => path.clone(),
            None => which::which("tesseract").map_err(|e| {
                Error::ocr_with_source("tesseract binary not found on PATH", e)
            })?,
        };
        Ok(Self { binary, settings })
    }

    /// Parse tesseract TSV output: word rows carry `conf` in column 11 and
    /// `text` in column 12; non-word rows have `conf = -1`.
    fn parse_tsv(output: &str) -> IndexReading {
        let mut text = String::new();
        let mut confidences: Vec<f64> = Vec::new();
        for line in output.lines().skip(1) {
            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() < 12 {
                continue;
            }
            let Ok(confidence) = columns[10].parse::<f64>() else {
                continue;
            };
            if confidence < 0.0 {
                continue;
            }
            let word: String = columns[11].chars().filter(char::is_ascii_digit).collect();
            if word.is_empty() {
                continue;
            }
            text.push_str(&word);
            confidences.push(confidence / 100.0);
        }
        let confidence = if confidences.is_empty() {
            0.0
        } else {
            confidences.iter().sum::<f64>() / confidences.len() as f64
        };
        IndexReading { text, confidence }
    }
}

#[async_trait]
impl OcrProvider for TesseractOcr {
    async fn recognize_digits(&self, image: &[u8]) -> Result<IndexReading> {
        let mut staged = tempfile::Builder::new()
            .prefix("omr-index-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| Error::ocr_with_source("could not stage OCR input", e))?;
        staged
            .write_all(image)
            .map_err(|e| Error::ocr_with_source("could not stage OCR input", e))?;
        staged
            .flush()
            .map_err(|e| Error::ocr_with_source("could not stage OCR input", e))?;

        let output = Command::new(&self.binary)
            .arg(staged.path())
            .arg("stdout")
            .arg("--psm")
            .arg(self.settings.page_segmentation_mode.to_string())
            .arg("-c")
            .arg(format!(
                "tessedit_char_whitelist={}",
                self.settings.whitelist
            ))
            .arg("tsv")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::ocr_with_source("tesseract invocation failed", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Self::parse_tsv(&stdout))
    }
}
