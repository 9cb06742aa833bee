//! Pure scoring of a sheet's bubble readings against the marking scheme.
//!
//! For each question exactly one of `{correct, incorrect, multi_marked,
//! unmarked}` increments, so the four counts always sum to the question
//! count. Column totals bin by the per-column row distribution.

use omr_domain::entities::FlagReason;
use omr_domain::error::{Error, Result};
use omr_domain::ports::BubbleClass;

/// Scoring outcome for one sheet. Question numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub correct: Vec<u32>,
    pub incorrect: Vec<u32>,
    pub multi_marked: Vec<u32>,
    pub unmarked: Vec<u32>,
    pub column_totals: Vec<u32>,
    pub score: u32,
    /// First multi-marked/unmarked condition observed, in question order.
    pub first_flag: Option<FlagReason>,
}

impl ScoreBreakdown {
    /// Returns `true` when any question was multi-marked or left blank.
    #[must_use]
    pub fn is_flagged(&self) -> bool {
        self.first_flag.is_some()
    }
}

fn column_of(question: usize, column_row_distribution: &[u32]) -> usize {
    let mut upper = 0usize;
    for (column, rows) in column_row_distribution.iter().enumerate() {
        upper += *rows as usize;
        if question < upper {
            return column;
        }
    }
    column_row_distribution.len().saturating_sub(1)
}

/// Score a sheet. `scheme` and `sheet` are marked flags in bubble order;
/// `choice_distribution` gives the option count per question.
pub fn score_sheet(
    scheme: &[bool],
    sheet: &[bool],
    choice_distribution: &[u32],
    column_row_distribution: &[u32],
) -> Result<ScoreBreakdown> {
    let expected: usize = choice_distribution.iter().map(|k| *k as usize).sum();
    if scheme.len() != expected || sheet.len() != expected {
        return Err(Error::invalid_argument(format!(
            "bubble count mismatch: scheme={}, sheet={}, expected={expected}",
            scheme.len(),
            sheet.len()
        )));
    }

    let columns = column_row_distribution.len().max(1);
    let mut breakdown = ScoreBreakdown {
        correct: Vec::new(),
        incorrect: Vec::new(),
        multi_marked: Vec::new(),
        unmarked: Vec::new(),
        column_totals: vec![0; columns],
        score: 0,
        first_flag: None,
    };

    let mut offset = 0usize;
    for (question, choices) in choice_distribution.iter().enumerate() {
        let choices = *choices as usize;
        let window = offset..offset + choices;
        let marked = sheet[window.clone()].iter().filter(|m| **m).count();
        let hit = scheme[window.clone()]
            .iter()
            .zip(&sheet[window])
            .any(|(key, ans)| *key && *ans);
        offset += choices;

        let number = question as u32 + 1;
        if hit && marked == 1 {
            breakdown.correct.push(number);
            breakdown.score += 1;
            breakdown.column_totals[column_of(question, column_row_distribution)] += 1;
        } else if marked > 1 {
            breakdown.multi_marked.push(number);
            if breakdown.first_flag.is_none() {
                breakdown.first_flag = Some(FlagReason::MoreThanOneMarked);
            }
        } else if marked == 0 {
            breakdown.unmarked.push(number);
            if breakdown.first_flag.is_none() {
                breakdown.first_flag = Some(FlagReason::NotMarked);
            }
        } else {
            breakdown.incorrect.push(number);
        }
    }

    Ok(breakdown)
}

/// Expand per-question outcomes to a per-bubble display class for the
/// annotated intermediate image. Output runs parallel to the bubble list.
#[must_use]
pub fn bubble_classes(breakdown: &ScoreBreakdown, choice_distribution: &[u32]) -> Vec<BubbleClass> {
    let mut classes = Vec::new();
    for (question, choices) in choice_distribution.iter().enumerate() {
        let number = question as u32 + 1;
        let class = if breakdown.correct.contains(&number) {
            BubbleClass::Correct
        } else if breakdown.multi_marked.contains(&number) {
            BubbleClass::MultiMarked
        } else if breakdown.unmarked.contains(&number) {
            BubbleClass::Unmarked
        } else {
            BubbleClass::Incorrect
        };
        classes.extend(std::iter::repeat_n(class, *choices as usize));
    }
    classes
}
