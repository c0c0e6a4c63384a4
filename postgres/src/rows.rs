//! Row types decoded from the circulation tables.

use chrono::{DateTime, Utc};
use circulation_core::{
    Book, BookId, CardId, CirculationError, LibraryCard, Rarity, Rating, RatingId, Reader,
    ReaderId, ReaderRole, Reservation, ReservationId, ReservationState, Result,
};
use sqlx::FromRow;
use uuid::Uuid;

fn decode_err(context: &str, detail: impl std::fmt::Display) -> CirculationError {
    CirculationError::StoreUnavailable(format!("decode {context}: {detail}"))
}

#[derive(FromRow)]
pub(crate) struct BookRow {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub publishing_year: i32,
    pub language: String,
    pub genre: String,
    pub age_limit: i32,
    pub rarity: String,
    pub copies_total: i32,
    pub copies_available: i32,
}

impl BookRow {
    pub(crate) fn into_book(self) -> Result<Book> {
        let id = BookId::from_uuid(self.id);
        // The schema CHECK keeps counts non-negative; a violation here means
        // the row bypassed it.
        let copies_total = u32::try_from(self.copies_total).map_err(|_| {
            CirculationError::InventoryCorruption {
                book_id: id,
                available: 0,
                total: 0,
            }
        })?;
        let copies_available = u32::try_from(self.copies_available).map_err(|_| {
            CirculationError::InventoryCorruption {
                book_id: id,
                available: 0,
                total: copies_total,
            }
        })?;
        Ok(Book {
            id,
            title: self.title,
            author: self.author,
            publisher: self.publisher,
            publishing_year: self.publishing_year,
            language: self.language,
            genre: self.genre,
            age_limit: u32::try_from(self.age_limit)
                .map_err(|e| decode_err("age_limit", e))?,
            rarity: self
                .rarity
                .parse::<Rarity>()
                .map_err(|e| decode_err("rarity", e))?,
            copies_total,
            copies_available,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct ReaderRow {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub age: i32,
    pub role: String,
}

impl ReaderRow {
    pub(crate) fn into_reader(self) -> Result<Reader> {
        Ok(Reader {
            id: ReaderId::from_uuid(self.id),
            full_name: self.full_name,
            phone: self.phone,
            age: u32::try_from(self.age).map_err(|e| decode_err("age", e))?,
            role: self
                .role
                .parse::<ReaderRole>()
                .map_err(|e| decode_err("role", e))?,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct CardRow {
    pub id: Uuid,
    pub reader_id: Uuid,
    pub number: String,
    pub issue_date: DateTime<Utc>,
    pub validity_months: i32,
    pub active: bool,
}

impl CardRow {
    pub(crate) fn into_card(self) -> Result<LibraryCard> {
        Ok(LibraryCard {
            id: CardId::from_uuid(self.id),
            reader_id: ReaderId::from_uuid(self.reader_id),
            number: self.number,
            issue_date: self.issue_date,
            validity_months: u32::try_from(self.validity_months)
                .map_err(|e| decode_err("validity_months", e))?,
            active: self.active,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct ReservationRow {
    pub id: Uuid,
    pub book_id: Uuid,
    pub reader_id: Uuid,
    pub issue_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub state: String,
}

impl ReservationRow {
    pub(crate) fn into_reservation(self) -> Result<Reservation> {
        Ok(Reservation {
            id: ReservationId::from_uuid(self.id),
            book_id: BookId::from_uuid(self.book_id),
            reader_id: ReaderId::from_uuid(self.reader_id),
            issue_date: self.issue_date,
            return_date: self.return_date,
            state: self
                .state
                .parse::<ReservationState>()
                .map_err(|e| decode_err("state", e))?,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct RatingRow {
    pub id: Uuid,
    pub book_id: Uuid,
    pub reader_id: Uuid,
    pub score: i32,
    pub review: Option<String>,
    pub rated_at: DateTime<Utc>,
}

impl RatingRow {
    pub(crate) fn into_rating(self) -> Rating {
        Rating {
            id: RatingId::from_uuid(self.id),
            book_id: BookId::from_uuid(self.book_id),
            reader_id: ReaderId::from_uuid(self.reader_id),
            score: self.score,
            review: self.review,
            rated_at: self.rated_at,
        }
    }
}
