//! Storage abstraction.
//!
//! All engine operations run inside a unit of work: [`CirculationStore::begin`]
//! opens a transaction, the engine reads and writes through it, and either
//! [`CirculationTx::commit`] publishes every change atomically or the
//! transaction rolls back and nothing is observable. Dropping an uncommitted
//! transaction rolls back.

use crate::book::{Book, BookFilter};
use crate::card::LibraryCard;
use crate::error::Result;
use crate::id::{BookId, ReaderId, ReservationId};
use crate::rating::Rating;
use crate::reader::Reader;
use crate::reservation::Reservation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A transactional circulation store.
#[async_trait]
pub trait CirculationStore: Send + Sync {
    /// The unit-of-work type this store produces.
    type Tx: CirculationTx;

    /// Opens a unit of work.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CirculationError::StoreUnavailable`] when a
    /// transaction cannot be opened.
    async fn begin(&self) -> Result<Self::Tx>;
}

/// One open unit of work against the circulation store.
///
/// Reads of a row intended for update take whatever lock the backend needs
/// so that concurrent units of work serialize on that row. Implementations
/// must never let two committed units of work both consume the last copy of
/// a book.
#[async_trait]
pub trait CirculationTx: Send {
    // ═══════════════════════════════════════════════════════════
    // Books
    // ═══════════════════════════════════════════════════════════

    /// Fetches a book, locking its row for update.
    async fn book_by_id(&mut self, id: BookId) -> Result<Book>;

    /// Lists books matching `filter`, applying its paging fields.
    async fn find_books(&mut self, filter: &BookFilter) -> Result<Vec<Book>>;

    /// Adds a catalog entry.
    async fn insert_book(&mut self, book: &Book) -> Result<()>;

    /// Rewrites a catalog entry, including its copy counts.
    async fn update_book(&mut self, book: &Book) -> Result<()>;

    /// Removes a catalog entry.
    async fn delete_book(&mut self, id: BookId) -> Result<()>;

    // ═══════════════════════════════════════════════════════════
    // Readers and cards
    // ═══════════════════════════════════════════════════════════

    /// Fetches a reader, locking their row for update.
    async fn reader_by_id(&mut self, id: ReaderId) -> Result<Reader>;

    /// Registers a reader.
    async fn insert_reader(&mut self, reader: &Reader) -> Result<()>;

    /// Fetches the reader's card, if one has been issued.
    async fn card_for_reader(&mut self, reader_id: ReaderId) -> Result<Option<LibraryCard>>;

    /// Issues a card.
    async fn insert_card(&mut self, card: &LibraryCard) -> Result<()>;

    /// Rewrites a card (renewal, suspension).
    async fn update_card(&mut self, card: &LibraryCard) -> Result<()>;

    // ═══════════════════════════════════════════════════════════
    // Reservations
    // ═══════════════════════════════════════════════════════════

    /// Fetches a reservation, locking its row for update.
    async fn reservation_by_id(&mut self, id: ReservationId) -> Result<Reservation>;

    /// The reader's active reservation of this book, if any.
    async fn active_reservation_for_pair(
        &mut self,
        reader_id: ReaderId,
        book_id: BookId,
    ) -> Result<Option<Reservation>>;

    /// How many active reservations the reader holds.
    async fn active_reservation_count(&mut self, reader_id: ReaderId) -> Result<u32>;

    /// How many active reservations exist for this book.
    async fn active_reservation_count_for_book(&mut self, book_id: BookId) -> Result<u32>;

    /// Records a new reservation.
    async fn insert_reservation(&mut self, reservation: &Reservation) -> Result<()>;

    /// Rewrites a reservation's state and dates.
    async fn update_reservation(&mut self, reservation: &Reservation) -> Result<()>;

    /// All of a reader's reservations, active and terminal, newest first.
    async fn reservations_for_reader(&mut self, reader_id: ReaderId) -> Result<Vec<Reservation>>;

    /// IDs of active reservations whose due date passed before `now`.
    async fn overdue_reservation_ids(&mut self, now: DateTime<Utc>) -> Result<Vec<ReservationId>>;

    /// Whether the reader has ever held a reservation of this book, in any
    /// state.
    async fn reservation_exists_for_pair(
        &mut self,
        reader_id: ReaderId,
        book_id: BookId,
    ) -> Result<bool>;

    // ═══════════════════════════════════════════════════════════
    // Ratings
    // ═══════════════════════════════════════════════════════════

    /// The reader's rating of this book, if recorded.
    async fn rating_for_pair(
        &mut self,
        reader_id: ReaderId,
        book_id: BookId,
    ) -> Result<Option<Rating>>;

    /// Records a rating.
    async fn insert_rating(&mut self, rating: &Rating) -> Result<()>;

    /// All ratings of a book, newest first.
    async fn ratings_for_book(&mut self, book_id: BookId) -> Result<Vec<Rating>>;

    // ═══════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════

    /// Publishes every change in this unit of work atomically.
    async fn commit(self) -> Result<()>;

    /// Discards every change in this unit of work.
    async fn rollback(self) -> Result<()>;
}
