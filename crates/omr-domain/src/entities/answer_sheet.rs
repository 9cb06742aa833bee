//! Per-sheet scoring outcome (transient; only summarized rows persist).

use serde::{Deserialize, Serialize};

use crate::value_objects::BubbleMark;

/// Why a sheet row was flagged for manual review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagReason {
    /// Homography estimation failed; the sheet was not scored.
    AlignmentFailed,
    /// At least one question had more than one bubble marked.
    MoreThanOneMarked,
    /// At least one question had no bubble marked.
    NotMarked,
    /// No index result arrived before the fan-in deadline.
    IndexTimeout,
    /// The recognized index fell below the confidence threshold.
    LowIndexConfidence,
}

impl FlagReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlignmentFailed => "alignment_failed",
            Self::MoreThanOneMarked => "more_than_one_marked",
            Self::NotMarked => "not_marked",
            Self::IndexTimeout => "index_timeout",
            Self::LowIndexConfidence => "low_index_confidence",
        }
    }
}

impl std::fmt::Display for FlagReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring outcome for a single answer sheet within a batch.
///
/// Question numbers are 1-based. `index_number` arrives asynchronously via
/// the index-recognition fan-in and may stay `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSheetResult {
    pub sheet_id: u32,
    pub path: String,
    pub correct: Vec<u32>,
    pub incorrect: Vec<u32>,
    pub multi_marked: Vec<u32>,
    pub unmarked: Vec<u32>,
    pub column_totals: Vec<u32>,
    pub score: u32,
    pub flag: bool,
    pub flag_reason: Option<FlagReason>,
    pub index_number: Option<String>,
    pub index_confidence: Option<f64>,
    /// Projected bubble readings on this sheet, for the audit column.
    pub labeled_points: Vec<BubbleMark>,
}

impl AnswerSheetResult {
    /// An unscored row for a sheet whose alignment failed.
    #[must_use]
    pub fn alignment_failed(sheet_id: u32, path: &str, column_count: usize) -> Self {
        Self {
            sheet_id,
            path: path.to_owned(),
            correct: Vec::new(),
            incorrect: Vec::new(),
            multi_marked: Vec::new(),
            unmarked: Vec::new(),
            column_totals: vec![0; column_count],
            score: 0,
            flag: true,
            flag_reason: Some(FlagReason::AlignmentFailed),
            index_number: None,
            index_confidence: None,
            labeled_points: Vec::new(),
        }
    }

    /// Set the flag reason unless an earlier condition already claimed it.
    pub fn flag_if_unflagged(&mut self, reason: FlagReason) {
        self.flag = true;
        if self.flag_reason.is_none() {
            self.flag_reason = Some(reason);
        }
    }
}
