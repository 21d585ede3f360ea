//! Presentation state machine.
//!
//! Two steps, one direction: `Rating -> Review -> submitted`. The rating
//! step refuses to advance until a non-zero rating is recorded; the review
//! step always advances into submission. Display timing lives in the
//! scheduler; this module only tracks what is on screen.

use serde::{Deserialize, Serialize};

/// Smallest accepted rating.
pub const MIN_RATING: u8 = 1;

/// Largest accepted rating.
pub const MAX_RATING: u8 = 10;

/// Which step of the dialog is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Collecting the 1-10 rating
    Rating,
    /// Collecting the free-form review
    Review,
}

/// In-progress dialog state, reset on every show.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    /// Current step
    pub step: Step,
    /// Recorded rating; 0 means none yet
    pub rating: u8,
    /// Review text collected so far
    pub review: String,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            step: Step::Rating,
            rating: 0,
            review: String::new(),
        }
    }
}

impl Presentation {
    /// Fresh state at the rating step.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard all collected input and return to the rating step.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record a rating; out-of-range values are ignored.
    pub fn set_rating(&mut self, rating: u8) {
        if (MIN_RATING..=MAX_RATING).contains(&rating) {
            self.rating = rating;
        } else {
            log::debug!("Ignoring out-of-range rating {}", rating);
        }
    }

    /// Replace the review text.
    pub fn set_review(&mut self, review: impl Into<String>) {
        self.review = review.into();
    }

    /// Whether the advance control is enabled for the current step.
    ///
    /// A rating of 0 blocks advancement out of the rating step; the review
    /// step always advances.
    pub fn can_advance(&self) -> bool {
        match self.step {
            Step::Rating => self.rating != 0,
            Step::Review => true,
        }
    }
}

/// Snapshot of the visible dialog handed to a rendering surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupView {
    /// Title for the current step
    pub title: String,
    /// Placeholder for the review text area
    pub placeholder: String,
    /// Current step
    pub step: Step,
    /// Recorded rating
    pub rating: u8,
    /// Review text collected so far
    pub review: String,
}
