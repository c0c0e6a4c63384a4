//! Error taxonomy for circulation operations.

use crate::id::{BookId, ReaderId, ReservationId};
use crate::reservation::ReservationState;
use thiserror::Error;

/// Result type alias for circulation operations.
pub type Result<T> = std::result::Result<T, CirculationError>;

/// All failure modes of the circulation system.
///
/// Precondition failures are expected outcomes returned to callers and are
/// never retried by the engine. `StoreUnavailable` and `Timeout` may be
/// retried by the caller's own policy (retries must be idempotency-aware).
/// `InventoryCorruption` is fatal: it signals a broken invariant and must be
/// surfaced, never silently repaired.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CirculationError {
    // ═══════════════════════════════════════════════════════════
    // Missing entities
    // ═══════════════════════════════════════════════════════════

    /// No book with this ID in the catalog.
    #[error("book not found: {0}")]
    BookNotFound(BookId),

    /// No reader with this ID is registered.
    #[error("reader not found: {0}")]
    ReaderNotFound(ReaderId),

    /// No reservation with this ID exists.
    #[error("reservation not found: {0}")]
    ReservationNotFound(ReservationId),

    /// The reader holds no library card at all.
    #[error("no library card issued for reader {0}")]
    CardNotFound(ReaderId),

    // ═══════════════════════════════════════════════════════════
    // Precondition failures
    // ═══════════════════════════════════════════════════════════

    /// Every copy of the book is currently on loan.
    #[error("no copies of book {0} available")]
    InventoryExhausted(BookId),

    /// The reader's card is expired or suspended.
    #[error("reader {0} has no active library card")]
    NoActiveLibraryCard(ReaderId),

    /// The reader is already at the configured concurrent-loan limit.
    #[error("reader {reader_id} already holds {limit} active loans")]
    LoanLimitExceeded {
        /// Reader at the limit.
        reader_id: ReaderId,
        /// The configured maximum.
        limit: u32,
    },

    /// The requested move is not in the legal-transition table.
    #[error("illegal reservation transition: {from} -> {to}")]
    InvalidStateTransition {
        /// State the reservation is currently in.
        from: ReservationState,
        /// State the caller tried to move it to.
        to: ReservationState,
    },

    /// The reader already holds an active loan of this title.
    #[error("reader {reader_id} already has an active reservation for book {book_id}")]
    AlreadyReserved {
        /// Reader holding the loan.
        reader_id: ReaderId,
        /// Book already on loan to them.
        book_id: BookId,
    },

    /// One card per reader; a second issue is rejected.
    #[error("reader {0} already holds a library card")]
    CardAlreadyIssued(ReaderId),

    /// Card numbers are unique across readers.
    #[error("card number {0:?} is already assigned")]
    CardNumberTaken(String),

    /// One rating per (reader, book) pair.
    #[error("reader {reader_id} has already rated book {book_id}")]
    AlreadyRated {
        /// Reader who rated.
        reader_id: ReaderId,
        /// Book already rated.
        book_id: BookId,
    },

    /// Rating score outside the accepted range.
    #[error("rating score {0} is outside 1..=5")]
    InvalidRating(i32),

    /// The book cannot be removed while copies are out on loan.
    #[error("book {0} still has active reservations")]
    BookHasActiveReservations(BookId),

    /// Adding this many copies would overflow the book's copy counters.
    #[error("copy count overflow for book {0}")]
    CopyCountOverflow(BookId),

    /// The reader is younger than the book's age limit.
    #[error("reader {reader_id} does not meet the age limit for book {book_id}")]
    AgeRestricted {
        /// Reader below the limit.
        reader_id: ReaderId,
        /// Age-limited book.
        book_id: BookId,
    },

    /// Ratings are open only to readers who have borrowed the book.
    #[error("reader {reader_id} has never borrowed book {book_id}")]
    NeverBorrowed {
        /// Reader who tried to rate.
        reader_id: ReaderId,
        /// Book they have not borrowed.
        book_id: BookId,
    },

    // ═══════════════════════════════════════════════════════════
    // System errors
    // ═══════════════════════════════════════════════════════════

    /// Inventory counts violate `0 <= available <= total`.
    #[error("inventory corrupted for book {book_id}: {available} available of {total} total")]
    InventoryCorruption {
        /// Book whose counts are broken.
        book_id: BookId,
        /// Observed available count.
        available: u32,
        /// Observed total count.
        total: u32,
    },

    /// The backing store failed (connection, transaction, query).
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The operation deadline elapsed; the unit of work rolled back.
    #[error("operation deadline exceeded")]
    Timeout,
}

impl CirculationError {
    /// Returns `true` for expected business outcomes that callers handle
    /// directly and must not retry.
    #[must_use]
    pub const fn is_precondition_failure(&self) -> bool {
        matches!(
            self,
            Self::InventoryExhausted(_)
                | Self::NoActiveLibraryCard(_)
                | Self::LoanLimitExceeded { .. }
                | Self::InvalidStateTransition { .. }
                | Self::AlreadyReserved { .. }
                | Self::CardAlreadyIssued(_)
                | Self::CardNumberTaken(_)
                | Self::AlreadyRated { .. }
                | Self::InvalidRating(_)
                | Self::BookHasActiveReservations(_)
                | Self::CopyCountOverflow(_)
                | Self::AgeRestricted { .. }
                | Self::NeverBorrowed { .. }
        )
    }

    /// Returns `true` for transient failures a caller may retry.
    ///
    /// Retrying is the caller's policy, not the engine's: a retried create
    /// must be guarded against double-creation by the caller.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Timeout)
    }

    /// Returns `true` for broken-invariant conditions that must be alerted.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InventoryCorruption { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn precondition_failures_are_not_retryable() {
        let err = CirculationError::InventoryExhausted(BookId::new());
        assert!(err.is_precondition_failure());
        assert!(!err.is_retryable());
        assert!(!err.is_fatal());
    }

    #[test]
    fn corruption_is_fatal_only() {
        let err = CirculationError::InventoryCorruption {
            book_id: BookId::new(),
            available: 5,
            total: 3,
        };
        assert!(err.is_fatal());
        assert!(!err.is_precondition_failure());
        assert!(!err.is_retryable());
    }

    #[test]
    fn transition_error_display_names_both_states() {
        let err = CirculationError::InvalidStateTransition {
            from: ReservationState::Closed,
            to: ReservationState::Extended,
        };
        let display = format!("{err}");
        assert!(display.contains("closed"));
        assert!(display.contains("extended"));
    }
}
