//! Reader ratings.

use crate::LendingEngine;
use circulation_core::{
    BookId, CirculationError, CirculationStore, CirculationTx, Rating, ReaderId, Result,
};
use tracing::{info, instrument};

impl<S: CirculationStore> LendingEngine<S> {
    /// Records the reader's rating of a book.
    ///
    /// Only readers who have held a reservation of the book (in any state)
    /// may rate it, and each pair rates once.
    ///
    /// # Errors
    ///
    /// [`CirculationError::InvalidRating`] for a score outside `1..=5`,
    /// [`CirculationError::NeverBorrowed`] without a prior reservation,
    /// [`CirculationError::AlreadyRated`] on a second attempt, or a
    /// store/timeout error.
    #[instrument(skip(self, review), fields(%reader_id, %book_id, score))]
    pub async fn rate_book(
        &self,
        reader_id: ReaderId,
        book_id: BookId,
        score: i32,
        review: Option<String>,
    ) -> Result<Rating> {
        let now = self.now();
        self.with_deadline(async {
            let rating = Rating::new(book_id, reader_id, score, review, now)?;

            let mut tx = self.store().begin().await?;
            tx.reader_by_id(reader_id).await?;
            tx.book_by_id(book_id).await?;

            if !tx.reservation_exists_for_pair(reader_id, book_id).await? {
                return Err(CirculationError::NeverBorrowed { reader_id, book_id });
            }
            if tx.rating_for_pair(reader_id, book_id).await?.is_some() {
                return Err(CirculationError::AlreadyRated { reader_id, book_id });
            }

            tx.insert_rating(&rating).await?;
            tx.commit().await?;

            info!(rating_id = %rating.id, "book rated");
            metrics::counter!("circulation_ratings_recorded_total").increment(1);
            Ok(rating)
        })
        .await
    }

    /// Lists a book's ratings, newest first.
    ///
    /// # Errors
    ///
    /// [`CirculationError::BookNotFound`] for an unknown book, or a
    /// store/timeout error.
    pub async fn ratings_for_book(&self, book_id: BookId) -> Result<Vec<Rating>> {
        self.with_deadline(async {
            let mut tx = self.store().begin().await?;
            tx.book_by_id(book_id).await?;
            let rows = tx.ratings_for_book(book_id).await?;
            tx.rollback().await?;
            Ok(rows)
        })
        .await
    }
}
