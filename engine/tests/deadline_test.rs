//! Operation deadline behavior against a store that stalls.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use async_trait::async_trait;
use circulation_core::{CirculationError, CirculationStore, LoanPolicy, Result};
use circulation_engine::LendingEngine;
use circulation_memory::MemoryStore;
use circulation_testing::{book, reader, TestLibrary};
use std::sync::Arc;
use std::time::Duration;

/// Wraps the in-memory store with a `begin` that takes far longer than any
/// operation is allowed to run.
struct StalledStore {
    inner: Arc<MemoryStore>,
    stall: Duration,
}

#[async_trait]
impl CirculationStore for StalledStore {
    type Tx = <MemoryStore as CirculationStore>::Tx;

    async fn begin(&self) -> Result<Self::Tx> {
        tokio::time::sleep(self.stall).await;
        self.inner.begin().await
    }
}

#[tokio::test]
async fn elapsed_deadline_times_out_and_leaves_no_trace() {
    let library = TestLibrary::new();
    let entry = library.seed_book(book("Slow Reads").copies(2)).await;
    let member = library.seed_member(reader("Patient Reader")).await;

    let policy = LoanPolicy {
        operation_deadline_ms: 50,
        ..LoanPolicy::default()
    };
    let stalled = Arc::new(StalledStore {
        inner: Arc::clone(&library.store),
        stall: Duration::from_secs(30),
    });
    let slow_engine = LendingEngine::new(stalled, policy);

    let err = slow_engine
        .create_reservation(member, entry.id)
        .await
        .unwrap_err();
    assert_eq!(err, CirculationError::Timeout);
    assert!(err.is_retryable());

    // The unit of work never opened, let alone committed.
    assert_eq!(library.available(entry.id).await, 2);
    let loans = library
        .engine
        .reservations_for_reader(member)
        .await
        .unwrap();
    assert!(loans.is_empty());

    // The same store behind an unhurried engine still works.
    let reservation = library
        .engine
        .create_reservation(member, entry.id)
        .await
        .unwrap();
    assert_eq!(reservation.reader_id, member);
    assert_eq!(library.available(entry.id).await, 1);
}
