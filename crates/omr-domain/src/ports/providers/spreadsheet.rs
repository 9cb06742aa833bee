//! Result spreadsheet port.

use crate::entities::AnswerSheetResult;
use crate::error::Result;

/// Renders a batch's rows into a workbook.
///
/// The orchestrator owns row order (sheet-file lexical order) and index
/// updates; rendering happens once, after fan-in, and the caller saves the
/// bytes to the artifact store — re-running a batch overwrites the output.
pub trait ResultSheetWriter: Send + Sync {
    /// Produce the encoded workbook (header row + one row per sheet).
    fn render(&self, sheet_name: &str, rows: &[AnswerSheetResult]) -> Result<Vec<u8>>;
}
