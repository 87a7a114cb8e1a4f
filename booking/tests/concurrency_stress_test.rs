//! Concurrency stress tests for last-seat scenarios.
//!
//! These tests verify that under heavy concurrent load the engine never oversells an
//! item and never hands one seat to two active bookings.
//!
//! Run with: `cargo test --test concurrency_stress_test -- --nocapture`

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use wayfare_booking::{BookingEngine, EngineConfig, ReservationRequest};
use wayfare_core::BookingError;
use wayfare_core::types::{Booking, InventoryItem, NewInventoryItem, UserId};
use wayfare_testing::fixtures::{bus_details, flight_details};
use wayfare_testing::{InMemoryBookingStore, test_clock};

fn engine(store: &InMemoryBookingStore) -> BookingEngine {
    BookingEngine::new(
        Arc::new(store.clone()),
        Arc::new(test_clock()),
        &EngineConfig::default(),
    )
}

async fn bus(engine: &BookingEngine, capacity: u32) -> InventoryItem {
    engine
        .create_item(NewInventoryItem {
            details: bus_details("Delhi", "Jaipur"),
            capacity,
        })
        .await
        .expect("create bus")
}

/// Launches one single-passenger reservation per user and collects the results.
async fn race(
    engine: &BookingEngine,
    requests: Vec<ReservationRequest>,
) -> Vec<Result<Booking, BookingError>> {
    let handles: Vec<_> = requests
        .into_iter()
        .map(|request| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.reserve(request).await })
        })
        .collect();

    join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("Task panicked"))
        .collect()
}

/// Test: 100 concurrent reservation attempts for 1 seat.
///
/// Verifies that:
/// - Exactly 1 reservation succeeds
/// - Exactly 99 reservations fail with `SoldOut`
/// - Capacity ends at zero and exactly one booking exists
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_last_seat_concurrency_100_requests() {
    println!("🧪 Concurrency Stress Test: 100 concurrent requests for 1 seat");

    let store = InMemoryBookingStore::new();
    let engine = engine(&store);
    let bus = bus(&engine, 1).await;

    println!("  🚀 Launching 100 concurrent reservation attempts...");
    let requests = (1..=100)
        .map(|user| ReservationRequest::new(UserId::new(user), bus.key()).passengers(["Solo"]))
        .collect();
    let results = race(&engine, requests).await;

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let sold_out = results
        .iter()
        .filter(|r| matches!(r, Err(BookingError::SoldOut { .. })))
        .count();

    println!("  📊 Results: {successes} succeeded, {sold_out} sold out");

    assert_eq!(successes, 1, "Expected exactly 1 reservation to succeed");
    assert_eq!(sold_out, 99, "Expected exactly 99 sold-out rejections");
    assert_eq!(store.available_capacity(bus.key()).await, Some(0));
    assert_eq!(store.all_bookings().await.len(), 1);

    println!("  ✅ Exactly 1 winner for the last seat");
}

/// Test: 50 concurrent two-passenger requests against capacity 7.
///
/// Only three parties of two fit; the seventh unit must stay unsold because no
/// request can be partially satisfied.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_group_requests_never_split_capacity() {
    let store = InMemoryBookingStore::new();
    let engine = engine(&store);
    let bus = bus(&engine, 7).await;

    let requests = (1..=50)
        .map(|user| {
            ReservationRequest::new(UserId::new(user), bus.key()).passengers(["Adult", "Child"])
        })
        .collect();
    let results = race(&engine, requests).await;

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 3);
    assert_eq!(store.available_capacity(bus.key()).await, Some(1));
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, BookingError::SoldOut { requested: 2, .. }))
    );
}

/// Test: everyone asks for the same seat.
///
/// Capacity is large enough for all of them, so all bookings succeed, but the seat
/// may be allocated to exactly one.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_same_seat_is_allocated_once() {
    let store = InMemoryBookingStore::new();
    let engine = engine(&store);
    let flight = engine
        .create_item(NewInventoryItem {
            details: flight_details("DEL", "BOM"),
            capacity: 30,
        })
        .await
        .unwrap();
    let vehicle = flight.key().vehicle().unwrap();
    let seats = engine.seed_vehicle_seats(vehicle).await.unwrap();
    let window = seats[0].id;

    let requests = (1..=20)
        .map(|user| ReservationRequest::new(UserId::new(user), flight.key()).seats([window]))
        .collect();
    let results = race(&engine, requests).await;

    let bookings: Vec<Booking> = results.into_iter().map(Result::unwrap).collect();
    let holders: Vec<&Booking> = bookings
        .iter()
        .filter(|b| b.seat_labels == vec!["1A".to_string()])
        .collect();
    assert_eq!(holders.len(), 1);
    assert_eq!(
        bookings.iter().filter(|b| b.seat_labels.is_empty()).count(),
        19
    );

    let map = engine.list_seats(vehicle).await.unwrap();
    assert_eq!(map.booked, 1);
    assert_eq!(map.seats[0].booking_id, Some(holders[0].id));
    assert_eq!(store.available_capacity(flight.key()).await, Some(10));
}

/// Test: concurrent cancels of one booking release its capacity exactly once.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_cancels_release_once() {
    let store = InMemoryBookingStore::new();
    let engine = engine(&store);
    let bus = bus(&engine, 4).await;
    let owner = UserId::new(7);

    let booking = engine
        .reserve(ReservationRequest::new(owner, bus.key()).passengers(["A", "B", "C"]))
        .await
        .unwrap();
    assert_eq!(store.available_capacity(bus.key()).await, Some(1));
    let booking_id = booking.id;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.cancel(booking_id, owner).await })
        })
        .collect();
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("Task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, BookingError::InvalidState { .. }))
    );
    assert_eq!(store.available_capacity(bus.key()).await, Some(4));
}

/// Test: concurrent confirms of different bookings issue distinct codes.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_confirms_issue_unique_codes() {
    let store = InMemoryBookingStore::new();
    let engine = engine(&store);
    let bus = bus(&engine, 40).await;

    let requests = (1..=40)
        .map(|user| ReservationRequest::new(UserId::new(user), bus.key()))
        .collect();
    let bookings: Vec<Booking> = race(&engine, requests)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let handles: Vec<_> = bookings
        .into_iter()
        .map(|booking| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.confirm(booking.id, booking.user_id).await })
        })
        .collect();
    let codes: HashSet<String> = join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("Task panicked").unwrap().code.unwrap().to_string())
        .collect();

    assert_eq!(codes.len(), 40);
}
