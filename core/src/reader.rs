//! Registered readers.

use crate::id::ReaderId;
use serde::{Deserialize, Serialize};

/// Access level of a reader account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderRole {
    /// Ordinary borrowing member.
    Reader,
    /// Staff account with catalog-management rights.
    Admin,
}

impl ReaderRole {
    /// Stable lowercase name, used for persistence.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reader => "reader",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for ReaderRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReaderRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "reader" => Ok(Self::Reader),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown reader role: {other}")),
        }
    }
}

/// A registered library member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reader {
    /// Unique reader ID.
    pub id: ReaderId,
    /// Full name.
    pub full_name: String,
    /// Contact phone number.
    pub phone: String,
    /// Age in years, checked against book age limits.
    pub age: u32,
    /// Access level.
    pub role: ReaderRole,
}

impl Reader {
    /// Registers a new member with the ordinary role.
    #[must_use]
    pub fn register(full_name: String, phone: String, age: u32) -> Self {
        Self {
            id: ReaderId::new(),
            full_name,
            phone,
            age,
            role: ReaderRole::Reader,
        }
    }

    /// Whether this reader meets a book's minimum age.
    #[must_use]
    pub const fn meets_age_limit(&self, age_limit: u32) -> bool {
        self.age >= age_limit
    }
}
