//! Catalog management.

use crate::LendingEngine;
use circulation_core::{
    Book, BookFilter, BookId, CirculationError, CirculationStore, CirculationTx, Rarity, Result,
};
use tracing::{info, instrument};

/// Everything needed to catalog a new title.
#[derive(Debug, Clone)]
pub struct NewBook {
    /// Title as catalogued.
    pub title: String,
    /// Author name.
    pub author: String,
    /// Publishing house.
    pub publisher: String,
    /// Year of publication.
    pub publishing_year: i32,
    /// Language of the edition.
    pub language: String,
    /// Genre label.
    pub genre: String,
    /// Minimum reader age.
    pub age_limit: u32,
    /// Scarcity class.
    pub rarity: Rarity,
    /// Copies the library owns. All start on the shelf.
    pub copies_total: u32,
}

impl<S: CirculationStore> LendingEngine<S> {
    /// Adds a title to the catalog with every copy available.
    ///
    /// # Errors
    ///
    /// A store/timeout error.
    #[instrument(skip(self, new), fields(title = %new.title))]
    pub async fn add_book(&self, new: NewBook) -> Result<Book> {
        self.with_deadline(async {
            let book = Book {
                id: BookId::new(),
                title: new.title,
                author: new.author,
                publisher: new.publisher,
                publishing_year: new.publishing_year,
                language: new.language,
                genre: new.genre,
                age_limit: new.age_limit,
                rarity: new.rarity,
                copies_total: new.copies_total,
                copies_available: new.copies_total,
            };
            let mut tx = self.store().begin().await?;
            tx.insert_book(&book).await?;
            tx.commit().await?;

            info!(book_id = %book.id, copies = book.copies_total, "book catalogued");
            metrics::counter!("circulation_books_catalogued_total").increment(1);
            Ok(book)
        })
        .await
    }

    /// Fetches one catalog entry.
    ///
    /// # Errors
    ///
    /// [`CirculationError::BookNotFound`] for an unknown ID, or a
    /// store/timeout error.
    pub async fn book(&self, book_id: BookId) -> Result<Book> {
        self.with_deadline(async {
            let mut tx = self.store().begin().await?;
            let book = tx.book_by_id(book_id).await?;
            tx.rollback().await?;
            Ok(book)
        })
        .await
    }

    /// Searches the catalog.
    ///
    /// # Errors
    ///
    /// A store/timeout error.
    pub async fn find_books(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        self.with_deadline(async {
            let mut tx = self.store().begin().await?;
            let books = tx.find_books(filter).await?;
            tx.rollback().await?;
            Ok(books)
        })
        .await
    }

    /// Adds `count` copies of an existing title to the shelf.
    ///
    /// # Errors
    ///
    /// [`CirculationError::BookNotFound`] for an unknown ID,
    /// [`CirculationError::CopyCountOverflow`] if the counters cannot hold
    /// `count` more copies, or a store/timeout error.
    #[instrument(skip(self), fields(%book_id, count))]
    pub async fn add_copies(&self, book_id: BookId, count: u32) -> Result<Book> {
        self.with_deadline(async {
            let mut tx = self.store().begin().await?;
            let mut book = tx.book_by_id(book_id).await?;
            book.copies_total = book
                .copies_total
                .checked_add(count)
                .ok_or(CirculationError::CopyCountOverflow(book_id))?;
            book.copies_available = book
                .copies_available
                .checked_add(count)
                .ok_or(CirculationError::CopyCountOverflow(book_id))?;
            tx.update_book(&book).await?;
            tx.commit().await?;

            info!(total = book.copies_total, "copies added");
            Ok(book)
        })
        .await
    }

    /// Removes a title from the catalog. Refused while any copy is out on
    /// loan.
    ///
    /// # Errors
    ///
    /// [`CirculationError::BookNotFound`] for an unknown ID,
    /// [`CirculationError::BookHasActiveReservations`] while copies are on
    /// loan, or a store/timeout error.
    #[instrument(skip(self), fields(%book_id))]
    pub async fn remove_book(&self, book_id: BookId) -> Result<()> {
        self.with_deadline(async {
            let mut tx = self.store().begin().await?;
            tx.book_by_id(book_id).await?;

            if tx.active_reservation_count_for_book(book_id).await? > 0 {
                return Err(CirculationError::BookHasActiveReservations(book_id));
            }
            tx.delete_book(book_id).await?;
            tx.commit().await?;

            info!("book removed from catalog");
            Ok(())
        })
        .await
    }
}
