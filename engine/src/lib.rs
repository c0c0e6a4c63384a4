//! The lending engine.
//!
//! [`LendingEngine`] drives every circulation operation: catalog management,
//! reader registration and cards, the reservation lifecycle, ratings, and
//! (via [`ExpirationScanner`]) overdue expiry. Each operation opens one unit
//! of work on the backing [`CirculationStore`], applies its checks and
//! writes, and commits once; any failure or elapsed deadline rolls the whole
//! unit of work back.

mod catalog;
mod lifecycle;
mod membership;
mod ratings;
mod scanner;

pub use catalog::NewBook;
pub use scanner::{ExpirationScanner, ExpiredSummary};

use circulation_core::{
    CirculationError, CirculationStore, CirculationTx, Clock, LoanPolicy, ReaderId, Result,
    SystemClock,
};
use std::future::Future;
use std::sync::Arc;

/// Drives circulation operations against a [`CirculationStore`].
pub struct LendingEngine<S: CirculationStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    policy: LoanPolicy,
}

impl<S: CirculationStore> Clone for LendingEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            policy: self.policy.clone(),
        }
    }
}

impl<S: CirculationStore> LendingEngine<S> {
    /// Builds an engine on the system clock with the given policy.
    pub fn new(store: Arc<S>, policy: LoanPolicy) -> Self {
        Self::with_clock(store, policy, Arc::new(SystemClock))
    }

    /// Builds an engine on an explicit clock. Tests pass a fixed clock here.
    pub fn with_clock(store: Arc<S>, policy: LoanPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// The policy this engine applies.
    #[must_use]
    pub const fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    /// The store this engine runs against.
    #[must_use]
    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    pub(crate) fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    pub(crate) fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Runs `fut` under the policy deadline. On expiry the future is
    /// dropped, which rolls back its open unit of work, and the caller
    /// sees [`CirculationError::Timeout`].
    pub(crate) async fn with_deadline<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        tokio::time::timeout(self.policy.operation_deadline(), fut)
            .await
            .map_err(|_| CirculationError::Timeout)?
    }

    /// Verifies the reader exists, holds a valid card, and is under the
    /// loan limit. Shared by reservation creation paths.
    pub(crate) async fn check_eligibility(
        &self,
        tx: &mut S::Tx,
        reader_id: ReaderId,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<()> {
        tx.reader_by_id(reader_id).await?;

        // A reader with no card at all is treated the same as one whose
        // card has lapsed.
        let card = tx
            .card_for_reader(reader_id)
            .await?
            .ok_or(CirculationError::NoActiveLibraryCard(reader_id))?;
        if !card.is_valid_at(now) {
            return Err(CirculationError::NoActiveLibraryCard(reader_id));
        }

        let active = tx.active_reservation_count(reader_id).await?;
        if active >= self.policy.max_active_loans {
            return Err(CirculationError::LoanLimitExceeded {
                reader_id,
                limit: self.policy.max_active_loans,
            });
        }
        Ok(())
    }
}
