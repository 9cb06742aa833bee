//! Unit tests for the pure scoring algorithm

use omr_application::scoring::{bubble_classes, score_sheet};
use omr_domain::entities::FlagReason;
use omr_domain::ports::BubbleClass;

// Three questions, two options each. Key: A, B, A.
const SCHEME: [bool; 6] = [true, false, false, true, true, false];

#[test]
fn all_correct() {
    let sheet = [true, false, false, true, true, false];
    let breakdown = score_sheet(&SCHEME, &sheet, &[2, 2, 2], &[3]).unwrap();
    assert_eq!(breakdown.correct, vec![1, 2, 3]);
    assert_eq!(breakdown.score, 3);
    assert_eq!(breakdown.column_totals, vec![3]);
    assert!(!breakdown.is_flagged());
}

#[test]
fn one_of_each_outcome() {
    // q1 correct, q2 multi-marked, q3 unmarked.
    let sheet = [true, false, true, true, false, false];
    let breakdown = score_sheet(&SCHEME, &sheet, &[2, 2, 2], &[3]).unwrap();
    assert_eq!(breakdown.correct, vec![1]);
    assert_eq!(breakdown.multi_marked, vec![2]);
    assert_eq!(breakdown.unmarked, vec![3]);
    assert!(breakdown.incorrect.is_empty());
    assert_eq!(breakdown.score, 1);
    // Multi-marked on q2 is observed before unmarked on q3.
    assert_eq!(breakdown.first_flag, Some(FlagReason::MoreThanOneMarked));
}

#[test]
fn wrong_single_choice_is_incorrect() {
    let sheet = [false, true, false, true, true, false];
    let breakdown = score_sheet(&SCHEME, &sheet, &[2, 2, 2], &[3]).unwrap();
    assert_eq!(breakdown.incorrect, vec![1]);
    assert_eq!(breakdown.score, 2);
    assert!(!breakdown.is_flagged());
}

#[test]
fn unmarked_before_multi_marked_wins_the_flag() {
    // q1 unmarked, q2 multi-marked.
    let sheet = [false, false, true, true, true, false];
    let breakdown = score_sheet(&SCHEME, &sheet, &[2, 2, 2], &[3]).unwrap();
    assert_eq!(breakdown.first_flag, Some(FlagReason::NotMarked));
}

#[test]
fn scoring_law_counts_sum_to_question_count() {
    // Every combination of two questions with three options.
    let scheme = [true, false, false, false, true, false];
    for mask in 0u32..64 {
        let sheet: Vec<bool> = (0..6).map(|i| mask & (1 << i) != 0).collect();
        let b = score_sheet(&scheme, &sheet, &[3, 3], &[2]).unwrap();
        let total =
            b.correct.len() + b.incorrect.len() + b.multi_marked.len() + b.unmarked.len();
        assert_eq!(total, 2, "mask {mask}");
    }
}

#[test]
fn column_totals_derive_from_row_distribution() {
    // Four questions in columns of [1, 3]; all correct.
    let scheme = [true, false, true, false, true, false, true, false];
    let breakdown = score_sheet(&scheme, &scheme, &[2, 2, 2, 2], &[1, 3]).unwrap();
    assert_eq!(breakdown.column_totals, vec![1, 3]);
}

#[test]
fn bubble_count_mismatch_is_rejected() {
    assert!(score_sheet(&[true], &[true, false], &[2], &[1]).is_err());
    assert!(score_sheet(&[true, false], &[true, false], &[3], &[1]).is_err());
}

#[test]
fn classes_expand_per_bubble() {
    let sheet = [true, false, true, true, false, false];
    let breakdown = score_sheet(&SCHEME, &sheet, &[2, 2, 2], &[3]).unwrap();
    let classes = bubble_classes(&breakdown, &[2, 2, 2]);
    assert_eq!(classes.len(), 6);
    assert_eq!(classes[0], BubbleClass::Correct);
    assert_eq!(classes[1], BubbleClass::Correct);
    assert_eq!(classes[2], BubbleClass::MultiMarked);
    assert_eq!(classes[4], BubbleClass::Unmarked);
}
