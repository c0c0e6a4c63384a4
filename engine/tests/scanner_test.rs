//! Expiration sweep behavior.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use chrono::Duration;
use circulation_core::{CirculationError, ReservationState};
use circulation_testing::{book, reader, TestLibrary};

#[tokio::test]
async fn overdue_loans_expire_and_release_inventory() {
    let library = TestLibrary::new();
    let entry = library.seed_book(book("Overdue Title")).await;
    let member = library.seed_member(reader("Slow Reader")).await;

    let held = library
        .engine
        .create_reservation(member, entry.id)
        .await
        .unwrap();
    assert_eq!(library.available(entry.id).await, 0);

    // Day 15 of a 14-day loan.
    library.clock.advance(Duration::days(15));
    let summary = library.scanner().scan_and_expire().await.unwrap();

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.expired, 1);
    assert_eq!(summary.failed, 0);
    assert!(summary.affected_readers.contains(&member));

    let expired = library.store.reservation_snapshot(held.id).await.unwrap();
    assert_eq!(expired.state, ReservationState::Expired);
    assert_eq!(library.available(entry.id).await, 1);
}

#[tokio::test]
async fn sweep_is_idempotent() {
    let library = TestLibrary::new();
    let entry = library.seed_book(book("Once Expired")).await;
    let member = library.seed_member(reader("Forgetful Reader")).await;
    library
        .engine
        .create_reservation(member, entry.id)
        .await
        .unwrap();

    library.clock.advance(Duration::days(20));
    let first = library.scanner().scan_and_expire().await.unwrap();
    assert_eq!(first.expired, 1);

    let second = library.scanner().scan_and_expire().await.unwrap();
    assert_eq!(second.scanned, 0);
    assert_eq!(second.expired, 0);
    assert_eq!(library.available(entry.id).await, 1);
}

#[tokio::test]
async fn extension_defers_expiry() {
    let library = TestLibrary::new();
    let entry = library.seed_book(book("Extended Title")).await;
    let member = library.seed_member(reader("Careful Reader")).await;

    let held = library
        .engine
        .create_reservation(member, entry.id)
        .await
        .unwrap();
    library.engine.extend_reservation(held.id).await.unwrap();

    // Day 20: the extended loan runs to day 21, so nothing is overdue yet.
    library.clock.advance(Duration::days(20));
    let early = library.scanner().scan_and_expire().await.unwrap();
    assert_eq!(early.expired, 0);

    // Day 22: one day past the extended due date.
    library.clock.advance(Duration::days(2));
    let due = library.scanner().scan_and_expire().await.unwrap();
    assert_eq!(due.expired, 1);
    assert_eq!(
        library
            .store
            .reservation_snapshot(held.id)
            .await
            .unwrap()
            .state,
        ReservationState::Expired
    );
    assert_eq!(library.available(entry.id).await, 1);
}

#[tokio::test]
async fn a_return_before_the_sweep_wins() {
    let library = TestLibrary::new();
    let entry = library.seed_book(book("Late Return")).await;
    let member = library.seed_member(reader("Just-in-time Reader")).await;

    let held = library
        .engine
        .create_reservation(member, entry.id)
        .await
        .unwrap();
    library.clock.advance(Duration::days(30));

    // The reader returns the overdue book before the scanner runs.
    library.engine.close_reservation(held.id).await.unwrap();

    let summary = library.scanner().scan_and_expire().await.unwrap();
    assert_eq!(summary.expired, 0);
    assert_eq!(
        library
            .store
            .reservation_snapshot(held.id)
            .await
            .unwrap()
            .state,
        ReservationState::Closed
    );
    // Released exactly once, by the return.
    assert_eq!(library.available(entry.id).await, 1);
}

#[tokio::test]
async fn expired_loans_cannot_be_closed_or_extended() {
    let library = TestLibrary::new();
    let entry = library.seed_book(book("Long Gone")).await;
    let member = library.seed_member(reader("Vanished Reader")).await;

    let held = library
        .engine
        .create_reservation(member, entry.id)
        .await
        .unwrap();
    library.clock.advance(Duration::days(30));
    library.scanner().scan_and_expire().await.unwrap();

    let err = library
        .engine
        .close_reservation(held.id)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CirculationError::InvalidStateTransition {
            from: ReservationState::Expired,
            to: ReservationState::Closed,
        }
    );
    assert!(library.engine.extend_reservation(held.id).await.is_err());
    // Inventory was reconciled by the sweep and stays put.
    assert_eq!(library.available(entry.id).await, 1);
}

#[tokio::test]
async fn sweep_covers_many_readers_in_one_pass() {
    let library = TestLibrary::new();
    let entry = library.seed_book(book("Popular Overdue").copies(3)).await;
    let mut members = Vec::new();
    for name in ["One", "Two", "Three"] {
        let member = library.seed_member(reader(name)).await;
        library
            .engine
            .create_reservation(member, entry.id)
            .await
            .unwrap();
        members.push(member);
    }

    library.clock.advance(Duration::days(15));
    let summary = library.scanner().scan_and_expire().await.unwrap();
    assert_eq!(summary.expired, 3);
    assert_eq!(summary.affected_readers.len(), 3);
    for member in members {
        assert!(summary.affected_readers.contains(&member));
    }
    assert_eq!(library.available(entry.id).await, 3);
}
