//! Reader ratings of books.

use crate::error::{CirculationError, Result};
use crate::id::{BookId, RatingId, ReaderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest accepted score.
pub const MIN_SCORE: i32 = 1;
/// Highest accepted score.
pub const MAX_SCORE: i32 = 5;

/// One reader's verdict on one book. At most one per (reader, book) pair;
/// the store enforces uniqueness, this type enforces the score range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Unique rating ID.
    pub id: RatingId,
    /// Rated book.
    pub book_id: BookId,
    /// Rating reader.
    pub reader_id: ReaderId,
    /// Score in `1..=5`.
    pub score: i32,
    /// Optional free-text review.
    pub review: Option<String>,
    /// When the rating was recorded.
    pub rated_at: DateTime<Utc>,
}

impl Rating {
    /// Builds a rating, validating the score.
    ///
    /// # Errors
    ///
    /// Returns [`CirculationError::InvalidRating`] when `score` falls
    /// outside `1..=5`.
    pub fn new(
        book_id: BookId,
        reader_id: ReaderId,
        score: i32,
        review: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(CirculationError::InvalidRating(score));
        }
        Ok(Self {
            id: RatingId::new(),
            book_id,
            reader_id,
            score,
            review,
            rated_at: now,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn accepts_boundary_scores() {
        let now = Utc::now();
        for score in [MIN_SCORE, MAX_SCORE] {
            assert!(Rating::new(BookId::new(), ReaderId::new(), score, None, now).is_ok());
        }
    }

    #[test]
    fn rejects_out_of_range_scores() {
        let now = Utc::now();
        for score in [0, 6, -1, 100] {
            let err = Rating::new(BookId::new(), ReaderId::new(), score, None, now).unwrap_err();
            assert_eq!(err, CirculationError::InvalidRating(score));
        }
    }
}
