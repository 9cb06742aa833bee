//! xlsx rendering of a marking batch's rows.

use rust_xlsxwriter::{Workbook, XlsxError};

use omr_domain::entities::AnswerSheetResult;
use omr_domain::error::{Error, Result};
use omr_domain::ports::ResultSheetWriter;

const HEADER: [&str; 10] = [
    "Index No",
    "Correct",
    "Incorrect",
    "More than one marked",
    "Not marked",
    "Columnwise Total",
    "Score",
    "Flag",
    "Flag Reason",
    "Labeled Points",
];

fn join(values: &[u32]) -> String {
    values
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Worksheet names cap at 31 chars and reject a handful of characters.
fn sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => ' ',
            other => other,
        })
        .collect();
    cleaned.chars().take(31).collect()
}

/// Renders rows with `rust_xlsxwriter`. Row `i` of the batch lands at
/// worksheet row `i + 1` (row 0 is the header); the caller owns row order.
#[derive(Debug, Default, Clone)]
pub struct XlsxResultSheetWriter;

impl XlsxResultSheetWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn render_inner(name: &str, rows: &[AnswerSheetResult]) -> std::result::Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name(name))?;

        for (col, title) in HEADER.iter().enumerate() {
            worksheet.write_string(0, col as u16, *title)?;
        }

        for (i, row) in rows.iter().enumerate() {
            let r = i as u32 + 1;
            worksheet.write_string(r, 0, row.index_number.as_deref().unwrap_or(""))?;
            worksheet.write_string(r, 1, join(&row.correct))?;
            worksheet.write_string(r, 2, join(&row.incorrect))?;
            worksheet.write_string(r, 3, join(&row.multi_marked))?;
            worksheet.write_string(r, 4, join(&row.unmarked))?;
            worksheet.write_string(r, 5, join(&row.column_totals))?;
            worksheet.write_number(r, 6, f64::from(row.score))?;
            worksheet.write_boolean(r, 7, row.flag)?;
            worksheet.write_string(
                r,
                8,
                row.flag_reason.map(|reason| reason.as_str()).unwrap_or(""),
            )?;
            let labeled = serde_json::to_string(&row.labeled_points).unwrap_or_default();
            worksheet.write_string(r, 9, labeled)?;
        }

        workbook.save_to_buffer()
    }
}

impl ResultSheetWriter for XlsxResultSheetWriter {
    fn render(&self, name: &str, rows: &[AnswerSheetResult]) -> Result<Vec<u8>> {
        Self::render_inner(name, rows)
            .map_err(|e| Error::spreadsheet(format!("workbook rendering failed: {e}")))
    }
}
