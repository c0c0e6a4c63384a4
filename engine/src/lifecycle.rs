//! Reservation lifecycle operations: create, extend, close.

use crate::LendingEngine;
use circulation_core::{
    BookId, CirculationError, CirculationStore, CirculationTx, ReaderId, Reservation,
    ReservationId, Result,
};
use tracing::{info, instrument};

impl<S: CirculationStore> LendingEngine<S> {
    /// Issues a new reservation: one copy of `book_id` to `reader_id`.
    ///
    /// The reader row is read first and the book row second, always in that
    /// order, so concurrent units of work queue instead of deadlocking.
    /// The copy decrement and the reservation insert commit together or
    /// not at all.
    ///
    /// # Errors
    ///
    /// Any eligibility failure ([`CirculationError::NoActiveLibraryCard`],
    /// [`CirculationError::LoanLimitExceeded`],
    /// [`CirculationError::AlreadyReserved`],
    /// [`CirculationError::AgeRestricted`]),
    /// [`CirculationError::InventoryExhausted`] when no copy remains, or a
    /// store/timeout error.
    #[instrument(skip(self), fields(%reader_id, %book_id))]
    pub async fn create_reservation(
        &self,
        reader_id: ReaderId,
        book_id: BookId,
    ) -> Result<Reservation> {
        let now = self.now();
        self.with_deadline(async {
            let mut tx = self.store().begin().await?;

            self.check_eligibility(&mut tx, reader_id, now).await?;

            if tx
                .active_reservation_for_pair(reader_id, book_id)
                .await?
                .is_some()
            {
                return Err(CirculationError::AlreadyReserved { reader_id, book_id });
            }

            let reader = tx.reader_by_id(reader_id).await?;
            let mut book = tx.book_by_id(book_id).await?;
            if !reader.meets_age_limit(book.age_limit) {
                return Err(CirculationError::AgeRestricted { reader_id, book_id });
            }

            book.reserve_copy()?;
            tx.update_book(&book).await?;

            let reservation =
                Reservation::issue(book_id, reader_id, now, self.policy().loan_period());
            tx.insert_reservation(&reservation).await?;
            tx.commit().await?;

            info!(reservation_id = %reservation.id, due = %reservation.return_date, "reservation issued");
            metrics::counter!("circulation_reservations_issued_total").increment(1);
            Ok(reservation)
        })
        .await
    }

    /// Grants the reservation's single extension.
    ///
    /// # Errors
    ///
    /// [`CirculationError::ReservationNotFound`] for an unknown ID,
    /// [`CirculationError::InvalidStateTransition`] unless the reservation
    /// is currently issued, or a store/timeout error.
    #[instrument(skip(self), fields(%reservation_id))]
    pub async fn extend_reservation(&self, reservation_id: ReservationId) -> Result<Reservation> {
        self.with_deadline(async {
            let mut tx = self.store().begin().await?;

            let mut reservation = tx.reservation_by_id(reservation_id).await?;
            reservation.extend(self.policy().extension_period())?;
            tx.update_reservation(&reservation).await?;
            tx.commit().await?;

            info!(due = %reservation.return_date, "reservation extended");
            metrics::counter!("circulation_reservations_extended_total").increment(1);
            Ok(reservation)
        })
        .await
    }

    /// Records the return of the copy and closes the reservation.
    ///
    /// The state change and the copy increment commit together. Returning
    /// an expired loan is still a return: `Expired` is terminal, so the
    /// transition is rejected, and the copy was already released when the
    /// scanner expired it.
    ///
    /// # Errors
    ///
    /// [`CirculationError::ReservationNotFound`] for an unknown ID,
    /// [`CirculationError::InvalidStateTransition`] if the reservation is
    /// already terminal, or a store/timeout error.
    #[instrument(skip(self), fields(%reservation_id))]
    pub async fn close_reservation(&self, reservation_id: ReservationId) -> Result<Reservation> {
        self.with_deadline(async {
            let mut tx = self.store().begin().await?;

            let mut reservation = tx.reservation_by_id(reservation_id).await?;
            reservation.close()?;

            let mut book = tx.book_by_id(reservation.book_id).await?;
            book.release_copy()?;
            tx.update_book(&book).await?;
            tx.update_reservation(&reservation).await?;
            tx.commit().await?;

            info!(book_id = %reservation.book_id, "reservation closed");
            metrics::counter!("circulation_reservations_closed_total").increment(1);
            Ok(reservation)
        })
        .await
    }

    /// Fetches one reservation.
    ///
    /// # Errors
    ///
    /// [`CirculationError::ReservationNotFound`] for an unknown ID, or a
    /// store/timeout error.
    pub async fn reservation(&self, reservation_id: ReservationId) -> Result<Reservation> {
        self.with_deadline(async {
            let mut tx = self.store().begin().await?;
            let reservation = tx.reservation_by_id(reservation_id).await?;
            tx.rollback().await?;
            Ok(reservation)
        })
        .await
    }

    /// Lists a reader's reservations, newest first.
    ///
    /// # Errors
    ///
    /// [`CirculationError::ReaderNotFound`] for an unknown reader, or a
    /// store/timeout error.
    pub async fn reservations_for_reader(&self, reader_id: ReaderId) -> Result<Vec<Reservation>> {
        self.with_deadline(async {
            let mut tx = self.store().begin().await?;
            tx.reader_by_id(reader_id).await?;
            let rows = tx.reservations_for_reader(reader_id).await?;
            tx.rollback().await?;
            Ok(rows)
        })
        .await
    }
}
