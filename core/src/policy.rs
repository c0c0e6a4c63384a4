//! Lending policy knobs.
//!
//! Loaded from environment variables with sensible defaults.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;

/// Borrowing rules applied by the lending engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanPolicy {
    /// Days a fresh loan runs before it is due.
    pub loan_period_days: u32,
    /// Days the single allowed extension adds to the due date.
    pub extension_period_days: u32,
    /// Maximum concurrently active loans per reader.
    pub max_active_loans: u32,
    /// Months a newly issued or renewed card stays valid.
    pub card_validity_months: u32,
    /// Deadline for a single engine operation, in milliseconds.
    pub operation_deadline_ms: u64,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            loan_period_days: 14,
            extension_period_days: 7,
            max_active_loans: 5,
            card_validity_months: 12,
            operation_deadline_ms: 5_000,
        }
    }
}

impl LoanPolicy {
    /// Loads the policy from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            loan_period_days: env_or("LOAN_PERIOD_DAYS", defaults.loan_period_days),
            extension_period_days: env_or("EXTENSION_PERIOD_DAYS", defaults.extension_period_days),
            max_active_loans: env_or("MAX_ACTIVE_LOANS", defaults.max_active_loans),
            card_validity_months: env_or("CARD_VALIDITY_MONTHS", defaults.card_validity_months),
            operation_deadline_ms: env_or("OPERATION_DEADLINE_MS", defaults.operation_deadline_ms),
        }
    }

    /// The loan period as a duration.
    #[must_use]
    pub fn loan_period(&self) -> Duration {
        Duration::days(i64::from(self.loan_period_days))
    }

    /// The extension period as a duration.
    #[must_use]
    pub fn extension_period(&self) -> Duration {
        Duration::days(i64::from(self.extension_period_days))
    }

    /// The per-operation deadline as a std duration, for timeouts.
    #[must_use]
    pub const fn operation_deadline(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.operation_deadline_ms)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
