//! Property tests: capacity is conserved across any reserve/confirm/cancel sequence.
//!
//! For every generated sequence the item's available capacity must equal its initial
//! capacity minus the units held by active (pending or confirmed) bookings, and no seat
//! may belong to a cancelled booking or to two bookings.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)] // Test code can use unwrap/expect

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use wayfare_booking::{BookingEngine, EngineConfig, ReservationRequest};
use wayfare_core::BookingError;
use wayfare_core::types::{BookingId, InventoryItem, NewInventoryItem, UserId};
use wayfare_testing::fixtures::{bus_details, room_details};
use wayfare_testing::properties::{LedgerOp, ledger_ops};
use wayfare_testing::{InMemoryBookingStore, test_clock};

const OWNER: UserId = UserId::new(1);

async fn run_ops(
    store: &InMemoryBookingStore,
    engine: &BookingEngine,
    item: &InventoryItem,
    ops: Vec<LedgerOp>,
    with_seats: bool,
) {
    let seats = match item.key().vehicle() {
        Some(vehicle) if with_seats => engine.seed_vehicle_seats(vehicle).await.unwrap(),
        _ => Vec::new(),
    };
    let mut created: Vec<BookingId> = Vec::new();

    for (step, op) in ops.into_iter().enumerate() {
        match op {
            LedgerOp::Reserve { guests } => {
                let names: Vec<String> = (1..=guests).map(|n| format!("Guest {n}")).collect();
                let mut request = ReservationRequest::new(OWNER, item.key()).passengers(names);
                if item.key().vehicle().is_some() && !seats.is_empty() {
                    // Ask for a sliding window of seats so requests overlap
                    let start = step % seats.len();
                    request = request.seats(
                        seats.iter().cycle().skip(start).take(3).map(|seat| seat.id),
                    );
                } else if item.key().vehicle().is_none() {
                    let check_in = chrono::NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
                    request = request.stay(check_in, check_in + chrono::Duration::days(2));
                }
                match engine.reserve(request).await {
                    Ok(booking) => created.push(booking.id),
                    Err(BookingError::SoldOut { .. }) => {}
                    Err(other) => panic!("unexpected reservation error: {other}"),
                }
            }
            LedgerOp::Cancel { nth } if !created.is_empty() => {
                let id = created[nth % created.len()];
                match engine.cancel(id, OWNER).await {
                    Ok(_) | Err(BookingError::InvalidState { .. }) => {}
                    Err(other) => panic!("unexpected cancellation error: {other}"),
                }
            }
            LedgerOp::Confirm { nth } if !created.is_empty() => {
                let id = created[nth % created.len()];
                match engine.confirm(id, OWNER).await {
                    Ok(_) | Err(BookingError::InvalidState { .. }) => {}
                    Err(other) => panic!("unexpected confirmation error: {other}"),
                }
            }
            LedgerOp::Cancel { .. } | LedgerOp::Confirm { .. } => {}
        }
    }

    let bookings = store.all_bookings().await;
    let held: u32 = bookings
        .iter()
        .filter(|b| b.status.is_active())
        .map(wayfare_core::types::Booking::reserved_units)
        .sum();
    let available = store.available_capacity(item.key()).await.unwrap();
    assert_eq!(available, item.initial_capacity - held);

    if let Some(vehicle) = item.key().vehicle() {
        let map = engine.list_seats(vehicle).await.unwrap();
        let active: HashSet<BookingId> = bookings
            .iter()
            .filter(|b| b.status.is_active())
            .map(|b| b.id)
            .collect();
        for seat in &map.seats {
            assert_eq!(seat.is_booked, seat.booking_id.is_some());
            if let Some(owner) = seat.booking_id {
                assert!(active.contains(&owner), "seat {} held by inactive booking", seat.label);
            }
        }
        let allocated: usize = bookings
            .iter()
            .filter(|b| b.status.is_active())
            .map(|b| b.seat_labels.len())
            .sum();
        assert_eq!(allocated, map.booked);
    }
}

fn check(
    details: wayfare_core::types::ItemDetails,
    capacity: u32,
    ops: Vec<LedgerOp>,
    with_seats: bool,
) {
    tokio_test::block_on(async {
        let store = InMemoryBookingStore::new();
        let engine = BookingEngine::new(
            Arc::new(store.clone()),
            Arc::new(test_clock()),
            &EngineConfig::default(),
        );
        let item = engine
            .create_item(NewInventoryItem { details, capacity })
            .await
            .unwrap();
        run_ops(&store, &engine, &item, ops, with_seats).await;
    });
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn bus_capacity_is_conserved(capacity in 1u32..12, ops in ledger_ops(4, 40)) {
        check(bus_details("Delhi", "Jaipur"), capacity, ops, false);
    }

    #[test]
    fn bus_seats_follow_active_bookings(capacity in 4u32..16, ops in ledger_ops(3, 30)) {
        check(bus_details("Delhi", "Jaipur"), capacity, ops, true);
    }

    #[test]
    fn room_capacity_is_conserved(capacity in 1u32..5, ops in ledger_ops(4, 30)) {
        check(room_details("Udaipur"), capacity, ops, false);
    }
}
