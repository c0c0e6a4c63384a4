//! Reader registration and library cards.

use crate::LendingEngine;
use circulation_core::{
    CirculationError, CirculationStore, CirculationTx, LibraryCard, Reader, ReaderId, Result,
};
use tracing::{info, instrument};

impl<S: CirculationStore> LendingEngine<S> {
    /// Registers a new reader. Registration alone does not authorize
    /// borrowing; a card is issued separately.
    ///
    /// # Errors
    ///
    /// A store/timeout error.
    #[instrument(skip(self, full_name, phone))]
    pub async fn register_reader(
        &self,
        full_name: String,
        phone: String,
        age: u32,
    ) -> Result<Reader> {
        self.with_deadline(async {
            let reader = Reader::register(full_name, phone, age);
            let mut tx = self.store().begin().await?;
            tx.insert_reader(&reader).await?;
            tx.commit().await?;

            info!(reader_id = %reader.id, "reader registered");
            metrics::counter!("circulation_readers_registered_total").increment(1);
            Ok(reader)
        })
        .await
    }

    /// Issues the reader's library card, valid for the policy's card
    /// validity period from now.
    ///
    /// # Errors
    ///
    /// [`CirculationError::ReaderNotFound`] for an unknown reader,
    /// [`CirculationError::CardAlreadyIssued`] when one exists, or a
    /// store/timeout error.
    #[instrument(skip(self, number), fields(%reader_id))]
    pub async fn issue_card(&self, reader_id: ReaderId, number: String) -> Result<LibraryCard> {
        let now = self.now();
        self.with_deadline(async {
            let mut tx = self.store().begin().await?;
            tx.reader_by_id(reader_id).await?;

            if tx.card_for_reader(reader_id).await?.is_some() {
                return Err(CirculationError::CardAlreadyIssued(reader_id));
            }

            let card =
                LibraryCard::issue(reader_id, number, now, self.policy().card_validity_months);
            tx.insert_card(&card).await?;
            tx.commit().await?;

            info!(card_id = %card.id, expires = %card.expires_at(), "card issued");
            Ok(card)
        })
        .await
    }

    /// Restarts the reader's card validity window from now and lifts any
    /// suspension.
    ///
    /// # Errors
    ///
    /// [`CirculationError::ReaderNotFound`] for an unknown reader,
    /// [`CirculationError::CardNotFound`] when no card was ever issued, or
    /// a store/timeout error.
    #[instrument(skip(self), fields(%reader_id))]
    pub async fn renew_card(&self, reader_id: ReaderId) -> Result<LibraryCard> {
        let now = self.now();
        self.with_deadline(async {
            let mut tx = self.store().begin().await?;
            tx.reader_by_id(reader_id).await?;

            let mut card = tx
                .card_for_reader(reader_id)
                .await?
                .ok_or(CirculationError::CardNotFound(reader_id))?;
            card.renew(now, self.policy().card_validity_months);
            tx.update_card(&card).await?;
            tx.commit().await?;

            info!(card_id = %card.id, expires = %card.expires_at(), "card renewed");
            Ok(card)
        })
        .await
    }

    /// Suspends the reader's card. A suspended card fails eligibility even
    /// inside its validity window.
    ///
    /// # Errors
    ///
    /// [`CirculationError::CardNotFound`] when no card was ever issued, or
    /// a store/timeout error.
    #[instrument(skip(self), fields(%reader_id))]
    pub async fn suspend_card(&self, reader_id: ReaderId) -> Result<LibraryCard> {
        self.with_deadline(async {
            let mut tx = self.store().begin().await?;
            let mut card = tx
                .card_for_reader(reader_id)
                .await?
                .ok_or(CirculationError::CardNotFound(reader_id))?;
            card.active = false;
            tx.update_card(&card).await?;
            tx.commit().await?;

            info!(card_id = %card.id, "card suspended");
            Ok(card)
        })
        .await
    }

    /// Fetches the reader's card.
    ///
    /// # Errors
    ///
    /// [`CirculationError::CardNotFound`] when no card was ever issued, or
    /// a store/timeout error.
    pub async fn card_for_reader(&self, reader_id: ReaderId) -> Result<LibraryCard> {
        self.with_deadline(async {
            let mut tx = self.store().begin().await?;
            let card = tx
                .card_for_reader(reader_id)
                .await?
                .ok_or(CirculationError::CardNotFound(reader_id))?;
            tx.rollback().await?;
            Ok(card)
        })
        .await
    }

    /// Fetches a reader.
    ///
    /// # Errors
    ///
    /// [`CirculationError::ReaderNotFound`] for an unknown reader, or a
    /// store/timeout error.
    pub async fn reader(&self, reader_id: ReaderId) -> Result<Reader> {
        self.with_deadline(async {
            let mut tx = self.store().begin().await?;
            let reader = tx.reader_by_id(reader_id).await?;
            tx.rollback().await?;
            Ok(reader)
        })
        .await
    }
}
