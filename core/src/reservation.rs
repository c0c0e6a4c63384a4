//! Reservation records and their lifecycle state machine.

use crate::error::{CirculationError, Result};
use crate::id::{BookId, ReaderId, ReservationId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a reservation.
///
/// The machine is closed: `Issued` is the only entry point, `Closed` and
/// `Expired` are terminal, and `Extended` may be entered at most once
/// because no transition leads back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationState {
    /// Loan is open, within its original period.
    Issued,
    /// Loan is open, on its single granted extension.
    Extended,
    /// Book returned; terminal.
    Closed,
    /// Loan period elapsed without return; terminal.
    Expired,
}

impl ReservationState {
    /// Whether the reservation still holds a copy.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Issued | Self::Extended)
    }

    /// Whether the reservation can never change state again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Expired)
    }

    /// The legal-transition table. Everything not listed is illegal.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Issued, Self::Extended)
                | (Self::Issued, Self::Closed)
                | (Self::Issued, Self::Expired)
                | (Self::Extended, Self::Closed)
                | (Self::Extended, Self::Expired)
        )
    }

    /// Stable lowercase name, used for persistence and display.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::Extended => "extended",
            Self::Closed => "closed",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for ReservationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReservationState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "issued" => Ok(Self::Issued),
            "extended" => Ok(Self::Extended),
            "closed" => Ok(Self::Closed),
            "expired" => Ok(Self::Expired),
            other => Err(format!("unknown reservation state: {other}")),
        }
    }
}

/// A single loan of one copy of a book to one reader.
///
/// State changes go through [`Reservation::extend`], [`Reservation::close`]
/// and [`Reservation::expire`], which consult the transition table and
/// return [`CirculationError::InvalidStateTransition`] for anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique reservation ID.
    pub id: ReservationId,
    /// The borrowed book.
    pub book_id: BookId,
    /// The borrowing reader.
    pub reader_id: ReaderId,
    /// When the loan was issued.
    pub issue_date: DateTime<Utc>,
    /// When the copy is due back. Extended exactly once at most.
    pub return_date: DateTime<Utc>,
    /// Current lifecycle state.
    pub state: ReservationState,
}

impl Reservation {
    /// Issues a new reservation due `loan_period` after `now`.
    #[must_use]
    pub fn issue(
        book_id: BookId,
        reader_id: ReaderId,
        now: DateTime<Utc>,
        loan_period: Duration,
    ) -> Self {
        Self {
            id: ReservationId::new(),
            book_id,
            reader_id,
            issue_date: now,
            return_date: now + loan_period,
            state: ReservationState::Issued,
        }
    }

    /// Whether the reservation is active and past due at `now`.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.state.is_active() && self.return_date < now
    }

    /// Grants the single allowed extension, pushing the due date out by
    /// `extension_period`.
    ///
    /// # Errors
    ///
    /// Returns [`CirculationError::InvalidStateTransition`] unless the
    /// reservation is currently `Issued`.
    pub fn extend(&mut self, extension_period: Duration) -> Result<()> {
        self.transition(ReservationState::Extended)?;
        self.return_date += extension_period;
        Ok(())
    }

    /// Records the return of the copy.
    ///
    /// # Errors
    ///
    /// Returns [`CirculationError::InvalidStateTransition`] if the
    /// reservation is already terminal.
    pub fn close(&mut self) -> Result<()> {
        self.transition(ReservationState::Closed)
    }

    /// Marks the loan expired. Only the expiration scanner calls this.
    ///
    /// # Errors
    ///
    /// Returns [`CirculationError::InvalidStateTransition`] if the
    /// reservation is already terminal.
    pub fn expire(&mut self) -> Result<()> {
        self.transition(ReservationState::Expired)
    }

    fn transition(&mut self, to: ReservationState) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(CirculationError::InvalidStateTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}
