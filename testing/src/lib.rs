//! Test support: controllable clocks, entity builders and a pre-wired
//! in-memory library.
//!
//! Engine tests build a [`TestLibrary`], seed it with [`book`] and
//! [`reader`] builders, drive time with [`FixedClock::advance`], and assert
//! on engine results.

use chrono::{DateTime, Duration, TimeZone, Utc};
use circulation_core::{
    Book, BookId, Clock, LoanPolicy, Rarity, Reader, ReaderId, ReaderRole,
};
use circulation_engine::{ExpirationScanner, LendingEngine, NewBook};
use circulation_memory::MemoryStore;
use std::sync::{Arc, Mutex, PoisonError};

/// Installs a test-friendly tracing subscriber honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ═══════════════════════════════════════════════════════════
// Clock
// ═══════════════════════════════════════════════════════════

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Starts the clock at `at`.
    #[must_use]
    pub const fn new(at: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(at),
        }
    }

    /// Starts the clock at a fixed, readable instant.
    #[must_use]
    pub fn default_epoch() -> Self {
        Self::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).single().unwrap_or_default())
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }

    /// Jumps the clock to `at`.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ═══════════════════════════════════════════════════════════
// Builders
// ═══════════════════════════════════════════════════════════

/// Starts a catalog entry with sane defaults and one copy.
#[must_use]
pub fn book(title: &str) -> BookBuilder {
    BookBuilder {
        new: NewBook {
            title: title.to_string(),
            author: "Unknown Author".to_string(),
            publisher: "Test Press".to_string(),
            publishing_year: 2000,
            language: "English".to_string(),
            genre: "Fiction".to_string(),
            age_limit: 0,
            rarity: Rarity::Common,
            copies_total: 1,
        },
    }
}

/// Fluent builder for catalog entries.
#[derive(Debug, Clone)]
pub struct BookBuilder {
    new: NewBook,
}

impl BookBuilder {
    /// Sets the author.
    #[must_use]
    pub fn author(mut self, author: &str) -> Self {
        self.new.author = author.to_string();
        self
    }

    /// Sets the genre.
    #[must_use]
    pub fn genre(mut self, genre: &str) -> Self {
        self.new.genre = genre.to_string();
        self
    }

    /// Sets the minimum reader age.
    #[must_use]
    pub const fn age_limit(mut self, age_limit: u32) -> Self {
        self.new.age_limit = age_limit;
        self
    }

    /// Sets the scarcity class.
    #[must_use]
    pub const fn rarity(mut self, rarity: Rarity) -> Self {
        self.new.rarity = rarity;
        self
    }

    /// Sets the owned copy count.
    #[must_use]
    pub const fn copies(mut self, copies: u32) -> Self {
        self.new.copies_total = copies;
        self
    }

    /// The catalog request this builder describes.
    #[must_use]
    pub fn into_new_book(self) -> NewBook {
        self.new
    }
}

/// Starts a reader with sane defaults.
#[must_use]
pub fn reader(full_name: &str) -> ReaderBuilder {
    ReaderBuilder {
        full_name: full_name.to_string(),
        phone: "+1-555-0100".to_string(),
        age: 30,
    }
}

/// Fluent builder for readers.
#[derive(Debug, Clone)]
pub struct ReaderBuilder {
    full_name: String,
    phone: String,
    age: u32,
}

impl ReaderBuilder {
    /// Sets the reader's age.
    #[must_use]
    pub const fn age(mut self, age: u32) -> Self {
        self.age = age;
        self
    }

    /// Sets the contact phone.
    #[must_use]
    pub fn phone(mut self, phone: &str) -> Self {
        self.phone = phone.to_string();
        self
    }

    /// Builds the reader directly, without going through an engine.
    #[must_use]
    pub fn build(self) -> Reader {
        Reader {
            id: ReaderId::new(),
            full_name: self.full_name,
            phone: self.phone,
            age: self.age,
            role: ReaderRole::Reader,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Pre-wired library
// ═══════════════════════════════════════════════════════════

/// An in-memory library on a fixed clock, ready for engine tests.
pub struct TestLibrary {
    /// The backing store, exposed for direct snapshots.
    pub store: Arc<MemoryStore>,
    /// The clock every engine operation reads.
    pub clock: Arc<FixedClock>,
    /// The engine under test.
    pub engine: LendingEngine<MemoryStore>,
}

impl TestLibrary {
    /// Builds a library with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(LoanPolicy::default())
    }

    /// Builds a library with an explicit policy.
    #[must_use]
    pub fn with_policy(policy: LoanPolicy) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::default_epoch());
        let engine = LendingEngine::with_clock(
            Arc::clone(&store),
            policy,
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        Self {
            store,
            clock,
            engine,
        }
    }

    /// A scanner over this library's engine.
    #[must_use]
    pub fn scanner(&self) -> ExpirationScanner<MemoryStore> {
        ExpirationScanner::new(self.engine.clone())
    }

    /// Catalogs a book described by `builder`.
    ///
    /// # Panics
    ///
    /// Panics if the engine rejects the insert; seeding is test setup, so
    /// that is a test bug.
    #[allow(clippy::panic)] // Test setup can panic
    pub async fn seed_book(&self, builder: BookBuilder) -> Book {
        self.engine
            .add_book(builder.into_new_book())
            .await
            .unwrap_or_else(|e| panic!("seeding book failed: {e}"))
    }

    /// Registers a reader and issues their card, returning the reader ID.
    ///
    /// # Panics
    ///
    /// Panics if registration or card issue fails; that is a test bug.
    #[allow(clippy::panic)] // Test setup can panic
    pub async fn seed_member(&self, builder: ReaderBuilder) -> ReaderId {
        let registered = self
            .engine
            .register_reader(builder.full_name, builder.phone, builder.age)
            .await
            .unwrap_or_else(|e| panic!("seeding reader failed: {e}"));
        self.engine
            .issue_card(registered.id, format!("C-{}", registered.id))
            .await
            .unwrap_or_else(|e| panic!("seeding card failed: {e}"));
        registered.id
    }

    /// Current available count for a book, read outside any transaction.
    ///
    /// # Panics
    ///
    /// Panics if the book does not exist.
    #[allow(clippy::panic)] // Test setup can panic
    pub async fn available(&self, book_id: BookId) -> u32 {
        self.store
            .book_snapshot(book_id)
            .await
            .unwrap_or_else(|| panic!("no such book: {book_id}"))
            .copies_available
    }
}

impl Default for TestLibrary {
    fn default() -> Self {
        Self::new()
    }
}
