//! Given-When-Then tests of every booking lifecycle transition, starting from bookings
//! the engine actually reserved.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use chrono::NaiveDate;
use std::sync::Arc;
use wayfare_booking::{BookingEngine, EngineConfig, ReservationRequest};
use wayfare_core::lifecycle::{BookingCommand, BookingEvent};
use wayfare_core::types::{
    Booking, BookingStatus, ItemDetails, NewInventoryItem, ReservationCode, UserId,
};
use wayfare_testing::fixtures::{bus_details, room_details};
use wayfare_testing::{InMemoryBookingStore, LifecycleTest, test_clock};

const OWNER: UserId = UserId::new(10);
const STRANGER: UserId = UserId::new(11);

async fn reserve(
    details: ItemDetails,
    request: impl FnOnce(ReservationRequest) -> ReservationRequest,
) -> Booking {
    let engine = BookingEngine::new(
        Arc::new(InMemoryBookingStore::new()),
        Arc::new(test_clock()),
        &EngineConfig::default(),
    );
    let item = engine
        .create_item(NewInventoryItem {
            details,
            capacity: 5,
        })
        .await
        .expect("create item");
    engine
        .reserve(request(ReservationRequest::new(OWNER, item.key())))
        .await
        .expect("reserve")
}

async fn pending_bus_booking() -> Booking {
    reserve(bus_details("Pune", "Goa"), |r| r.passengers(["Asha", "Ravi", "Meera"])).await
}

fn code() -> ReservationCode {
    ReservationCode::parse("PNR4U2GO").unwrap()
}

#[tokio::test]
async fn test_pending_booking_is_confirmed_with_the_issued_code() {
    let booking = pending_bus_booking().await;
    let id = booking.id;

    LifecycleTest::new()
        .given_booking(booking)
        .when_command(BookingCommand::Confirm {
            caller: OWNER,
            code: code(),
        })
        .then_booking(|booking| {
            assert_eq!(booking.status, BookingStatus::Confirmed);
            assert_eq!(booking.code, Some(code()));
        })
        .then_event(move |event| {
            assert!(matches!(
                event,
                BookingEvent::Confirmed { booking_id, code: issued, .. }
                    if *booking_id == id && *issued == code()
            ));
        })
        .run();
}

#[tokio::test]
async fn test_pending_booking_cancel_returns_every_unit() {
    let booking = pending_bus_booking().await;

    LifecycleTest::new()
        .given_booking(booking)
        .when_command(BookingCommand::Cancel { caller: OWNER })
        .then_booking(|booking| {
            assert_eq!(booking.status, BookingStatus::Cancelled);
            assert!(booking.code.is_none());
        })
        .then_event(|event| {
            assert!(matches!(
                event,
                BookingEvent::Cancelled {
                    units: 3,
                    previous_status: BookingStatus::Pending,
                    ..
                }
            ));
        })
        .run();
}

#[tokio::test]
async fn test_room_cancel_returns_one_unit_whatever_the_guest_count() {
    let check_in = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
    let check_out = NaiveDate::from_ymd_opt(2026, 2, 13).unwrap();
    let booking = reserve(room_details("Udaipur"), |r| {
        r.passengers(["Kabir", "Ira"]).stay(check_in, check_out)
    })
    .await;

    LifecycleTest::new()
        .given_booking(booking)
        .when_command(BookingCommand::Cancel { caller: OWNER })
        .then_event(|event| {
            assert!(matches!(event, BookingEvent::Cancelled { units: 1, .. }));
        })
        .run();
}

#[tokio::test]
async fn test_cancelled_booking_accepts_no_further_commands() {
    let mut booking = pending_bus_booking().await;
    booking.status = BookingStatus::Cancelled;

    for command in [
        BookingCommand::Confirm {
            caller: OWNER,
            code: code(),
        },
        BookingCommand::Cancel { caller: OWNER },
    ] {
        LifecycleTest::new()
            .given_booking(booking.clone())
            .when_command(command)
            .then_error(|error| assert_eq!(error.code(), "INVALID_STATE"))
            .then_booking(|booking| {
                assert_eq!(booking.status, BookingStatus::Cancelled);
                assert!(booking.code.is_none());
            })
            .run();
    }
}

#[tokio::test]
async fn test_stranger_can_neither_confirm_nor_cancel() {
    let booking = pending_bus_booking().await;

    for command in [
        BookingCommand::Confirm {
            caller: STRANGER,
            code: code(),
        },
        BookingCommand::Cancel { caller: STRANGER },
    ] {
        LifecycleTest::new()
            .given_booking(booking.clone())
            .when_command(command)
            .then_error(|error| assert_eq!(error.code(), "UNAUTHORIZED"))
            .then_booking(|booking| assert_eq!(booking.status, BookingStatus::Pending))
            .run();
    }
}
