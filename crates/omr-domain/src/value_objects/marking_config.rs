//! Cached marking-scheme configuration.
//!
//! Produced once per marking scheme so repeated batches skip re-detecting
//! the key: an ordered list of `(marked, x, y)` per bubble, coordinates in
//! the scheme image's space.

use serde::{Deserialize, Serialize};

/// One bubble reading: `(marked ∈ {0,1}, x, y)`, serialized as a JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BubbleMark(pub u8, pub i32, pub i32);

impl BubbleMark {
    #[must_use]
    pub fn new(marked: bool, x: i32, y: i32) -> Self {
        Self(u8::from(marked), x, y)
    }

    #[must_use]
    pub fn is_marked(&self) -> bool {
        self.0 != 0
    }

    #[must_use]
    pub fn x(&self) -> i32 {
        self.1
    }

    #[must_use]
    pub fn y(&self) -> i32 {
        self.2
    }
}

/// The persisted marking configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkingConfig {
    pub answers_with_coordinates: Vec<BubbleMark>,
}

impl MarkingConfig {
    #[must_use]
    pub fn new(answers_with_coordinates: Vec<BubbleMark>) -> Self {
        Self {
            answers_with_coordinates,
        }
    }

    /// Just the marked flags, in bubble order.
    #[must_use]
    pub fn marked_flags(&self) -> Vec<bool> {
        self.answers_with_coordinates
            .iter()
            .map(BubbleMark::is_marked)
            .collect()
    }
}
