//! Unit tests for the priority → broker-priority mapping

use std::str::FromStr;

use omr_domain::value_objects::JobPriority;
use rstest::*;

#[rstest]
#[case::urgent(JobPriority::Urgent, 9)]
#[case::high(JobPriority::High, 7)]
#[case::normal(JobPriority::Normal, 5)]
#[case::low(JobPriority::Low, 1)]
fn broker_priority_mapping(#[case] priority: JobPriority, #[case] expected: u8) {
    assert_eq!(priority.broker_priority(), expected);
}

#[test]
fn default_is_normal() {
    assert_eq!(JobPriority::default(), JobPriority::Normal);
}

#[test]
fn parses_case_insensitively() {
    assert_eq!(JobPriority::from_str("URGENT"), Ok(JobPriority::Urgent));
    assert_eq!(JobPriority::from_str("low"), Ok(JobPriority::Low));
    assert!(JobPriority::from_str("asap").is_err());
}

#[test]
fn serializes_lowercase() {
    let json = serde_json::to_string(&JobPriority::High).unwrap();
    assert_eq!(json, "\"high\"");
}
