//! Unit tests for the xlsx result writer

use omr_domain::entities::{AnswerSheetResult, FlagReason};
use omr_domain::ports::ResultSheetWriter;
use omr_domain::value_objects::BubbleMark;
use omr_providers::spreadsheet::XlsxResultSheetWriter;

fn row(sheet_id: u32) -> AnswerSheetResult {
    AnswerSheetResult {
        sheet_id,
        path: format!("sheets/{sheet_id}.jpg"),
        correct: vec![1, 3],
        incorrect: vec![2],
        multi_marked: vec![],
        unmarked: vec![],
        column_totals: vec![2],
        score: 2,
        flag: false,
        flag_reason: None,
        index_number: Some("190502".to_owned()),
        index_confidence: Some(0.93),
        labeled_points: vec![BubbleMark::new(true, 10, 20)],
    }
}

#[test]
fn renders_a_workbook() {
    let writer = XlsxResultSheetWriter::new();
    let bytes = writer.render("midterm", &[row(0), row(1)]).unwrap();
    // xlsx files are zip containers.
    assert!(bytes.len() > 4);
    assert_eq!(&bytes[..4], b"PK\x03\x04");
}

#[test]
fn empty_batch_still_renders_the_header() {
    let writer = XlsxResultSheetWriter::new();
    let bytes = writer.render("empty", &[]).unwrap();
    assert!(!bytes.is_empty());
}

#[test]
fn awkward_sheet_names_are_tolerated() {
    let writer = XlsxResultSheetWriter::new();
    let long_name = "a".repeat(60);
    assert!(writer.render(&long_name, &[row(0)]).is_ok());
    assert!(writer.render("exam [2026/08]: part *?", &[row(0)]).is_ok());
}

#[test]
fn flagged_rows_carry_the_reason() {
    let mut flagged = row(0);
    flagged.flag = true;
    flagged.flag_reason = Some(FlagReason::IndexTimeout);
    flagged.index_number = None;
    let writer = XlsxResultSheetWriter::new();
    assert!(writer.render("flags", &[flagged]).is_ok());
}
