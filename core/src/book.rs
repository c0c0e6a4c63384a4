//! Catalog books and their copy inventory.

use crate::error::{CirculationError, Result};
use crate::id::BookId;
use serde::{Deserialize, Serialize};

/// How scarce a title is. Policy hooks (pricing, loan rules) key off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Ordinary circulating stock.
    Common,
    /// Limited print runs, out-of-print titles.
    Rare,
    /// Single-copy or archival items.
    Unique,
}

impl Rarity {
    /// Stable lowercase name, used for persistence.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Unique => "unique",
        }
    }
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Rarity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "common" => Ok(Self::Common),
            "rare" => Ok(Self::Rare),
            "unique" => Ok(Self::Unique),
            other => Err(format!("unknown rarity: {other}")),
        }
    }
}

/// A catalog entry plus its copy counts.
///
/// Inventory invariant: `0 <= copies_available <= copies_total` at every
/// observable point. [`Book::reserve_copy`] and [`Book::release_copy`] are
/// the only mutators and both refuse to break it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Unique book ID.
    pub id: BookId,
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
    /// Minimum reader age for this title.
    pub age_limit: u32,
    /// Scarcity class.
    pub rarity: Rarity,
    /// Copies the library owns.
    pub copies_total: u32,
    /// Copies currently on the shelf.
    pub copies_available: u32,
}

impl Book {
    /// Decrements the available count for a new loan.
    ///
    /// # Errors
    ///
    /// Returns [`CirculationError::InventoryExhausted`] when no copy is on
    /// the shelf, or [`CirculationError::InventoryCorruption`] if the counts
    /// are already inconsistent.
    pub fn reserve_copy(&mut self) -> Result<()> {
        self.check_consistency()?;
        if self.copies_available == 0 {
            return Err(CirculationError::InventoryExhausted(self.id));
        }
        self.copies_available -= 1;
        Ok(())
    }

    /// Returns a copy to the shelf after a close or expiry.
    ///
    /// # Errors
    ///
    /// Returns [`CirculationError::InventoryCorruption`] if incrementing
    /// would exceed `copies_total` or the counts are already inconsistent.
    pub fn release_copy(&mut self) -> Result<()> {
        self.check_consistency()?;
        if self.copies_available == self.copies_total {
            return Err(CirculationError::InventoryCorruption {
                book_id: self.id,
                available: self.copies_available + 1,
                total: self.copies_total,
            });
        }
        self.copies_available += 1;
        Ok(())
    }

    fn check_consistency(&self) -> Result<()> {
        if self.copies_available > self.copies_total {
            return Err(CirculationError::InventoryCorruption {
                book_id: self.id,
                available: self.copies_available,
                total: self.copies_total,
            });
        }
        Ok(())
    }
}

/// Optional catalog search criteria. All set fields must match; text fields
/// match case-insensitively on substring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookFilter {
    /// Substring of the title.
    pub title: Option<String>,
    /// Substring of the author name.
    pub author: Option<String>,
    /// Substring of the genre label.
    pub genre: Option<String>,
    /// Exact rarity class.
    pub rarity: Option<Rarity>,
    /// Exact publication year.
    pub publishing_year: Option<i32>,
    /// Maximum rows to return. `None` means unbounded.
    pub limit: Option<u32>,
    /// Rows to skip before the first returned one.
    pub offset: Option<u32>,
}

impl BookFilter {
    /// Whether `book` satisfies every set criterion. Paging fields are
    /// applied by the store, not here.
    #[must_use]
    pub fn matches(&self, book: &Book) -> bool {
        fn contains_ci(haystack: &str, needle: &str) -> bool {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }

        self.title
            .as_deref()
            .is_none_or(|t| contains_ci(&book.title, t))
            && self
                .author
                .as_deref()
                .is_none_or(|a| contains_ci(&book.author, a))
            && self
                .genre
                .as_deref()
                .is_none_or(|g| contains_ci(&book.genre, g))
            && self.rarity.is_none_or(|r| book.rarity == r)
            && self
                .publishing_year
                .is_none_or(|y| book.publishing_year == y)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    fn sample() -> Book {
        Book {
            id: BookId::new(),
            title: "The Master and Margarita".to_string(),
            author: "Mikhail Bulgakov".to_string(),
            publisher: "Vintage".to_string(),
            publishing_year: 1967,
            language: "English".to_string(),
            genre: "Novel".to_string(),
            age_limit: 16,
            rarity: Rarity::Common,
            copies_total: 2,
            copies_available: 2,
        }
    }

    #[test]
    fn reserve_decrements_until_exhausted() {
        let mut book = sample();
        book.reserve_copy().unwrap();
        book.reserve_copy().unwrap();
        assert_eq!(book.copies_available, 0);
        assert_eq!(
            book.reserve_copy().unwrap_err(),
            CirculationError::InventoryExhausted(book.id)
        );
    }

    #[test]
    fn release_refuses_to_exceed_total() {
        let mut book = sample();
        let err = book.release_copy().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn corrupted_counts_are_detected_not_repaired() {
        let mut book = sample();
        book.copies_available = 5;
        assert!(book.reserve_copy().unwrap_err().is_fatal());
        assert_eq!(book.copies_available, 5);
    }

    #[test]
    fn filter_matches_substring_case_insensitively() {
        let book = sample();
        let filter = BookFilter {
            title: Some("master".to_string()),
            author: Some("bulgakov".to_string()),
            ..BookFilter::default()
        };
        assert!(filter.matches(&book));

        let miss = BookFilter {
            genre: Some("poetry".to_string()),
            ..BookFilter::default()
        };
        assert!(!miss.matches(&book));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(BookFilter::default().matches(&sample()));
    }
}
