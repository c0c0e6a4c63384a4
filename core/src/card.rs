//! Library cards and their validity window.

use crate::id::{CardId, ReaderId};
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

/// A reader's library card. One per reader.
///
/// A card authorizes borrowing while it is active and within its validity
/// window, which runs `validity_months` from `issue_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryCard {
    /// Unique card ID.
    pub id: CardId,
    /// Owning reader.
    pub reader_id: ReaderId,
    /// Printed card number.
    pub number: String,
    /// When the card was issued or last renewed.
    pub issue_date: DateTime<Utc>,
    /// Months of validity from the issue date.
    pub validity_months: u32,
    /// Administrative switch; a suspended card fails validation even
    /// inside its window.
    pub active: bool,
}

impl LibraryCard {
    /// Issues a fresh card for `reader_id`.
    #[must_use]
    pub fn issue(
        reader_id: ReaderId,
        number: String,
        now: DateTime<Utc>,
        validity_months: u32,
    ) -> Self {
        Self {
            id: CardId::new(),
            reader_id,
            number,
            issue_date: now,
            validity_months,
            active: true,
        }
    }

    /// The instant the validity window ends.
    ///
    /// Calendar months, so a card issued Jan 31 for one month expires
    /// Feb 28 (or 29).
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issue_date
            .checked_add_months(Months::new(self.validity_months))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether the card authorizes borrowing at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.active && now < self.expires_at()
    }

    /// Restarts the validity window from `now`.
    pub fn renew(&mut self, now: DateTime<Utc>, validity_months: u32) {
        self.issue_date = now;
        self.validity_months = validity_months;
        self.active = true;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn card_is_valid_inside_window() {
        let now = Utc::now();
        let card = LibraryCard::issue(ReaderId::new(), "C-0001".to_string(), now, 12);
        assert!(card.is_valid_at(now));
        assert!(card.is_valid_at(now + Duration::days(300)));
        assert!(!card.is_valid_at(now + Duration::days(400)));
    }

    #[test]
    fn suspended_card_is_invalid_inside_window() {
        let now = Utc::now();
        let mut card = LibraryCard::issue(ReaderId::new(), "C-0002".to_string(), now, 12);
        card.active = false;
        assert!(!card.is_valid_at(now));
    }

    #[test]
    fn renew_restarts_the_window() {
        let now = Utc::now();
        let mut card = LibraryCard::issue(ReaderId::new(), "C-0003".to_string(), now, 1);
        let later = now + Duration::days(60);
        assert!(!card.is_valid_at(later));

        card.renew(later, 12);
        assert!(card.is_valid_at(later));
        assert_eq!(card.issue_date, later);
    }
}
