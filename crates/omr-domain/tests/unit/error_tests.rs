//! Unit tests for domain error types

use omr_domain::error::Error;
use rstest::*;

#[rstest]
#[case::not_found(Error::not_found("MarkingJob:7"), "NotFound", "MarkingJob:7")]
#[case::validation(
    Error::validation("less than 4 rectangles"),
    "Validation",
    "less than 4 rectangles"
)]
#[case::broker(Error::broker("connection refused"), "Broker", "connection refused")]
#[case::storage(Error::storage("read failed"), "Storage", "read failed")]
#[case::database(Error::database("sql error"), "Database", "sql error")]
#[case::config(Error::config("missing key"), "Config", "missing key")]
#[case::vision(Error::vision("no contours"), "Vision", "no contours")]
#[case::ocr(Error::ocr("tesseract missing"), "Ocr", "tesseract missing")]
#[case::internal(Error::internal("poisoned lock"), "Internal", "poisoned lock")]
fn error_variants(
    #[case] error: Error,
    #[case] expected_variant: &str,
    #[case] expected_message: &str,
) {
    let debug_str = format!("{error:?}");
    assert!(
        debug_str.contains(expected_variant),
        "expected variant {expected_variant} in {debug_str}"
    );
    let display_str = format!("{error}");
    assert!(
        display_str.contains(expected_message),
        "expected message '{expected_message}' in '{display_str}'"
    );
}

#[test]
fn cancelled_displays_the_wire_string() {
    // The worker copies this Display form into the failed envelope.
    assert_eq!(format!("{}", Error::Cancelled), "cancelled");
    assert!(Error::Cancelled.is_cancelled());
    assert!(!Error::not_found("x").is_cancelled());
}

#[test]
fn io_errors_convert() {
    let io = std::io::Error::other("disk gone");
    let err: Error = io.into();
    assert!(matches!(err, Error::Io { .. }));
}
