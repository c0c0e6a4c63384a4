//! The expiration scanner.
//!
//! Walks active reservations whose due date has passed and expires them,
//! one unit of work per reservation, so a single bad row never blocks the
//! rest of the sweep. Re-running a sweep is harmless: each row is
//! re-checked inside its own transaction and skipped once terminal.

use crate::LendingEngine;
use chrono::{DateTime, Utc};
use circulation_core::{
    CirculationStore, CirculationTx, Clock, ReaderId, ReservationId, Result,
};
use std::collections::HashSet;
use tracing::{info, instrument, warn};

/// Outcome of one expiration sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpiredSummary {
    /// Overdue reservations the sweep saw.
    pub scanned: u32,
    /// Reservations moved to expired.
    pub expired: u32,
    /// Rows whose own unit of work failed; they are retried next sweep.
    pub failed: u32,
    /// Readers who had at least one reservation expire.
    pub affected_readers: HashSet<ReaderId>,
}

/// Expires overdue reservations on demand or on an interval.
pub struct ExpirationScanner<S: CirculationStore> {
    engine: LendingEngine<S>,
}

impl<S: CirculationStore> ExpirationScanner<S> {
    /// Builds a scanner over the engine's store, clock and policy.
    #[must_use]
    pub const fn new(engine: LendingEngine<S>) -> Self {
        Self { engine }
    }

    /// Sweeps at the engine clock's current instant.
    ///
    /// # Errors
    ///
    /// A store error while listing overdue rows. Per-row failures do not
    /// fail the sweep; they are counted in the summary.
    pub async fn scan_and_expire(&self) -> Result<ExpiredSummary> {
        let now = self.engine.clock().now();
        self.scan_and_expire_at(now).await
    }

    /// Sweeps at an explicit instant.
    ///
    /// # Errors
    ///
    /// A store error while listing overdue rows.
    #[instrument(skip(self), fields(%now))]
    pub async fn scan_and_expire_at(&self, now: DateTime<Utc>) -> Result<ExpiredSummary> {
        let overdue = {
            let mut tx = self.engine.store().begin().await?;
            let ids = tx.overdue_reservation_ids(now).await?;
            tx.rollback().await?;
            ids
        };

        let mut summary = ExpiredSummary {
            scanned: u32::try_from(overdue.len()).unwrap_or(u32::MAX),
            ..ExpiredSummary::default()
        };

        for id in overdue {
            match self.expire_one(id, now).await {
                Ok(Some(reader_id)) => {
                    summary.expired += 1;
                    summary.affected_readers.insert(reader_id);
                }
                // Already terminal: another sweep or a return got there first.
                Ok(None) => {}
                Err(error) => {
                    summary.failed += 1;
                    warn!(reservation_id = %id, %error, "failed to expire reservation");
                }
            }
        }

        info!(
            scanned = summary.scanned,
            expired = summary.expired,
            failed = summary.failed,
            "expiration sweep finished"
        );
        metrics::counter!("circulation_reservations_expired_total")
            .increment(u64::from(summary.expired));
        Ok(summary)
    }

    /// Expires one reservation in its own unit of work. Returns the
    /// affected reader, or `None` if the row was no longer active or no
    /// longer overdue when re-checked.
    async fn expire_one(
        &self,
        id: ReservationId,
        now: DateTime<Utc>,
    ) -> Result<Option<ReaderId>> {
        let mut tx = self.engine.store().begin().await?;

        let mut reservation = tx.reservation_by_id(id).await?;
        if !reservation.is_overdue(now) {
            tx.rollback().await?;
            return Ok(None);
        }

        reservation.expire()?;
        let mut book = tx.book_by_id(reservation.book_id).await?;
        book.release_copy()?;
        tx.update_book(&book).await?;
        tx.update_reservation(&reservation).await?;
        tx.commit().await?;

        Ok(Some(reservation.reader_id))
    }
}
