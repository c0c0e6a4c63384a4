//! In-memory circulation store.
//!
//! Backs the engine in tests and demos. Transactions are serializable by
//! construction: [`MemoryStore::begin`] takes an exclusive lock on the whole
//! data set, every read and write inside the unit of work touches a private
//! working copy, and [`CirculationTx::commit`] swaps the working copy in
//! while still holding the lock. A dropped or rolled-back transaction leaves
//! the shared data untouched.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use circulation_core::{
    Book, BookFilter, BookId, CirculationError, CirculationStore, CirculationTx, LibraryCard,
    Rating, Reader, ReaderId, Reservation, ReservationId, Result,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Everything the store holds.
#[derive(Debug, Clone, Default)]
struct DataSet {
    books: HashMap<BookId, Book>,
    readers: HashMap<ReaderId, Reader>,
    cards: HashMap<ReaderId, LibraryCard>,
    reservations: HashMap<ReservationId, Reservation>,
    ratings: HashMap<(ReaderId, BookId), Rating>,
}

/// A fully in-memory [`CirculationStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<DataSet>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a book outside any transaction, for assertions.
    pub async fn book_snapshot(&self, id: BookId) -> Option<Book> {
        self.data.lock().await.books.get(&id).cloned()
    }

    /// Reads a reservation outside any transaction, for assertions.
    pub async fn reservation_snapshot(&self, id: ReservationId) -> Option<Reservation> {
        self.data.lock().await.reservations.get(&id).cloned()
    }
}

#[async_trait]
impl CirculationStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = Arc::clone(&self.data).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx { guard, working })
    }
}

/// One unit of work against a [`MemoryStore`].
///
/// Holds the store lock for its whole lifetime, so at most one transaction
/// is open at a time and committed units of work are strictly serialized.
pub struct MemoryTx {
    guard: OwnedMutexGuard<DataSet>,
    working: DataSet,
}

#[async_trait]
impl CirculationTx for MemoryTx {
    async fn book_by_id(&mut self, id: BookId) -> Result<Book> {
        self.working
            .books
            .get(&id)
            .cloned()
            .ok_or(CirculationError::BookNotFound(id))
    }

    async fn find_books(&mut self, filter: &BookFilter) -> Result<Vec<Book>> {
        let mut matched: Vec<Book> = self
            .working
            .books
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.title.cmp(&b.title));

        let offset = filter.offset.unwrap_or(0) as usize;
        let matched = matched.into_iter().skip(offset);
        Ok(match filter.limit {
            Some(limit) => matched.take(limit as usize).collect(),
            None => matched.collect(),
        })
    }

    async fn insert_book(&mut self, book: &Book) -> Result<()> {
        self.working.books.insert(book.id, book.clone());
        Ok(())
    }

    async fn update_book(&mut self, book: &Book) -> Result<()> {
        if !self.working.books.contains_key(&book.id) {
            return Err(CirculationError::BookNotFound(book.id));
        }
        self.working.books.insert(book.id, book.clone());
        Ok(())
    }

    async fn delete_book(&mut self, id: BookId) -> Result<()> {
        self.working
            .books
            .remove(&id)
            .ok_or(CirculationError::BookNotFound(id))?;
        // Historical reservations and ratings go with the title.
        self.working.reservations.retain(|_, r| r.book_id != id);
        self.working.ratings.retain(|(_, book_id), _| *book_id != id);
        Ok(())
    }

    async fn reader_by_id(&mut self, id: ReaderId) -> Result<Reader> {
        self.working
            .readers
            .get(&id)
            .cloned()
            .ok_or(CirculationError::ReaderNotFound(id))
    }

    async fn insert_reader(&mut self, reader: &Reader) -> Result<()> {
        self.working.readers.insert(reader.id, reader.clone());
        Ok(())
    }

    async fn card_for_reader(&mut self, reader_id: ReaderId) -> Result<Option<LibraryCard>> {
        Ok(self.working.cards.get(&reader_id).cloned())
    }

    async fn insert_card(&mut self, card: &LibraryCard) -> Result<()> {
        if self.working.cards.contains_key(&card.reader_id) {
            return Err(CirculationError::CardAlreadyIssued(card.reader_id));
        }
        if self
            .working
            .cards
            .values()
            .any(|existing| existing.number == card.number)
        {
            return Err(CirculationError::CardNumberTaken(card.number.clone()));
        }
        self.working.cards.insert(card.reader_id, card.clone());
        Ok(())
    }

    async fn update_card(&mut self, card: &LibraryCard) -> Result<()> {
        if !self.working.cards.contains_key(&card.reader_id) {
            return Err(CirculationError::CardNotFound(card.reader_id));
        }
        self.working.cards.insert(card.reader_id, card.clone());
        Ok(())
    }

    async fn reservation_by_id(&mut self, id: ReservationId) -> Result<Reservation> {
        self.working
            .reservations
            .get(&id)
            .cloned()
            .ok_or(CirculationError::ReservationNotFound(id))
    }

    async fn active_reservation_for_pair(
        &mut self,
        reader_id: ReaderId,
        book_id: BookId,
    ) -> Result<Option<Reservation>> {
        Ok(self
            .working
            .reservations
            .values()
            .find(|r| r.reader_id == reader_id && r.book_id == book_id && r.state.is_active())
            .cloned())
    }

    async fn active_reservation_count(&mut self, reader_id: ReaderId) -> Result<u32> {
        let count = self
            .working
            .reservations
            .values()
            .filter(|r| r.reader_id == reader_id && r.state.is_active())
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn active_reservation_count_for_book(&mut self, book_id: BookId) -> Result<u32> {
        let count = self
            .working
            .reservations
            .values()
            .filter(|r| r.book_id == book_id && r.state.is_active())
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> Result<()> {
        self.working
            .reservations
            .insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn update_reservation(&mut self, reservation: &Reservation) -> Result<()> {
        if !self.working.reservations.contains_key(&reservation.id) {
            return Err(CirculationError::ReservationNotFound(reservation.id));
        }
        self.working
            .reservations
            .insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn reservations_for_reader(&mut self, reader_id: ReaderId) -> Result<Vec<Reservation>> {
        let mut rows: Vec<Reservation> = self
            .working
            .reservations
            .values()
            .filter(|r| r.reader_id == reader_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.issue_date.cmp(&a.issue_date));
        Ok(rows)
    }

    async fn overdue_reservation_ids(&mut self, now: DateTime<Utc>) -> Result<Vec<ReservationId>> {
        let mut ids: Vec<(DateTime<Utc>, ReservationId)> = self
            .working
            .reservations
            .values()
            .filter(|r| r.is_overdue(now))
            .map(|r| (r.return_date, r.id))
            .collect();
        ids.sort_by_key(|(due, _)| *due);
        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    async fn reservation_exists_for_pair(
        &mut self,
        reader_id: ReaderId,
        book_id: BookId,
    ) -> Result<bool> {
        Ok(self
            .working
            .reservations
            .values()
            .any(|r| r.reader_id == reader_id && r.book_id == book_id))
    }

    async fn rating_for_pair(
        &mut self,
        reader_id: ReaderId,
        book_id: BookId,
    ) -> Result<Option<Rating>> {
        Ok(self.working.ratings.get(&(reader_id, book_id)).cloned())
    }

    async fn insert_rating(&mut self, rating: &Rating) -> Result<()> {
        self.working
            .ratings
            .insert((rating.reader_id, rating.book_id), rating.clone());
        Ok(())
    }

    async fn ratings_for_book(&mut self, book_id: BookId) -> Result<Vec<Rating>> {
        let mut rows: Vec<Rating> = self
            .working
            .ratings
            .values()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.rated_at.cmp(&a.rated_at));
        Ok(rows)
    }

    async fn commit(mut self) -> Result<()> {
        *self.guard = self.working;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        // Dropping the working copy and the lock is the rollback.
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use circulation_core::Rarity;

    fn sample_book() -> Book {
        Book {
            id: BookId::new(),
            title: "Dead Souls".to_string(),
            author: "Nikolai Gogol".to_string(),
            publisher: "Penguin".to_string(),
            publishing_year: 1842,
            language: "English".to_string(),
            genre: "Novel".to_string(),
            age_limit: 12,
            rarity: Rarity::Common,
            copies_total: 3,
            copies_available: 3,
        }
    }

    #[tokio::test]
    async fn committed_writes_are_visible_to_later_transactions() {
        let store = MemoryStore::new();
        let book = sample_book();

        let mut tx = store.begin().await.unwrap();
        tx.insert_book(&book).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let found = tx.book_by_id(book.id).await.unwrap();
        assert_eq!(found, book);
    }

    #[tokio::test]
    async fn rolled_back_writes_vanish() {
        let store = MemoryStore::new();
        let book = sample_book();

        let mut tx = store.begin().await.unwrap();
        tx.insert_book(&book).await.unwrap();
        tx.rollback().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(
            tx.book_by_id(book.id).await.unwrap_err(),
            CirculationError::BookNotFound(book.id)
        );
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = MemoryStore::new();
        let book = sample_book();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_book(&book).await.unwrap();
        }

        assert!(store.book_snapshot(book.id).await.is_none());
    }

    #[tokio::test]
    async fn find_books_applies_filter_and_paging() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        for (title, genre) in [
            ("Alpha", "Novel"),
            ("Beta", "Novel"),
            ("Gamma", "Poetry"),
        ] {
            let mut book = sample_book();
            book.id = BookId::new();
            book.title = title.to_string();
            book.genre = genre.to_string();
            tx.insert_book(&book).await.unwrap();
        }
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let novels = tx
            .find_books(&BookFilter {
                genre: Some("novel".to_string()),
                ..BookFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(novels.len(), 2);

        let paged = tx
            .find_books(&BookFilter {
                limit: Some(1),
                offset: Some(1),
                ..BookFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].title, "Beta");
    }
}
