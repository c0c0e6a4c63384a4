//! # Circulation Core
//!
//! Domain types and store abstraction for a library circulation system.
//!
//! This crate defines everything the lending engine reasons about:
//!
//! - **Entities**: [`Book`], [`Reader`], [`LibraryCard`], [`Reservation`], [`Rating`]
//! - **State machine**: [`ReservationState`] as a closed enum with an explicit
//!   legal-transition table; invalid states cannot be constructed
//! - **Errors**: [`CirculationError`], the full failure taxonomy
//! - **Policy**: [`LoanPolicy`] with loan period, extension period, loan limit
//! - **Store abstraction**: [`CirculationStore`] / [`CirculationTx`], the
//!   unit-of-work capability every engine operation runs inside
//!
//! ## Consistency contract
//!
//! The two pieces of mutable shared state are `Book::copies_available` and
//! `Reservation::state`. Every mutation of either happens inside a
//! [`CirculationTx`] that also validates the precondition it depends on
//! (inventory availability, transition legality). Implementations of the
//! store traits must make each transaction atomic and isolated; the engine
//! never does read-then-compute-then-write across transaction boundaries.

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub mod book;
pub mod card;
pub mod clock;
pub mod error;
pub mod id;
pub mod policy;
pub mod rating;
pub mod reader;
pub mod reservation;
pub mod store;

pub use book::{Book, BookFilter, Rarity};
pub use card::LibraryCard;
pub use clock::{Clock, SystemClock};
pub use error::{CirculationError, Result};
pub use id::{BookId, CardId, RatingId, ReaderId, ReservationId};
pub use policy::LoanPolicy;
pub use rating::Rating;
pub use reader::{Reader, ReaderRole};
pub use reservation::{Reservation, ReservationState};
pub use store::{CirculationStore, CirculationTx};
