//! # Wayfare Testing
//!
//! Testing utilities for the Wayfare booking engine.
//!
//! This crate provides:
//! - [`InMemoryBookingStore`]: a transactional in-memory store with rollback on drop
//! - [`FixedClock`] and [`test_clock`]: deterministic time
//! - [`LifecycleTest`]: Given-When-Then assertions over the booking lifecycle
//! - Fixtures and proptest strategies for inventory and bookings
//!
//! ## Example
//!
//! ```ignore
//! use wayfare_testing::{InMemoryBookingStore, test_clock};
//!
//! #[tokio::test]
//! async fn reserve_flow() {
//!     let store = Arc::new(InMemoryBookingStore::new());
//!     let engine = BookingEngine::new(store, Arc::new(test_clock()), &EngineConfig::default());
//!     // ...
//! }
//! ```

use chrono::{DateTime, Utc};
use wayfare_core::environment::Clock;

pub mod lifecycle_test;
pub mod memory_store;

/// Mock implementations of Environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use chrono::TimeZone;
    use std::sync::Mutex;

    /// The instant every default test clock starts at: 2026-01-01 00:00:00 UTC
    #[must_use]
    pub fn test_time() -> DateTime<Utc> {
        Utc.timestamp_opt(1_767_225_600, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Clock for deterministic tests
    ///
    /// Returns the same time until moved with [`FixedClock::advance`].
    ///
    /// # Example
    ///
    /// ```
    /// use wayfare_testing::mocks::FixedClock;
    /// use wayfare_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug)]
    pub struct FixedClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(time),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: chrono::Duration) {
            if let Ok(mut time) = self.time.lock() {
                *time += by;
            }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time.lock().map_or_else(|poisoned| *poisoned.into_inner(), |time| *time)
        }
    }

    /// Create a default fixed clock for tests (2026-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(test_time())
    }
}

/// Inventory and booking fixtures.
pub mod fixtures {
    use crate::mocks::test_time;
    use chrono::Duration;
    use std::collections::BTreeMap;
    use wayfare_core::types::{
        Booking, BookingId, BookingStatus, FareClass, ItemDetails, ItemKey, Money, Route,
        Schedule, UserId,
    };

    fn schedule(hours: i64) -> Schedule {
        let departure = test_time() + Duration::days(30) + Duration::hours(6);
        Schedule::new(departure, departure + Duration::hours(hours))
    }

    /// A flight departing 30 days after the test time, 4 500.00 per seat
    #[must_use]
    pub fn flight_details(origin: &str, destination: &str) -> ItemDetails {
        ItemDetails::Flight {
            flight_number: "6E-302".to_string(),
            airline: "IndiGo".to_string(),
            route: Route::new(origin, destination),
            schedule: schedule(2),
            price: Money::from_minor(450_000),
        }
    }

    /// A bus departing 30 days after the test time, 800.00 per seat
    #[must_use]
    pub fn bus_details(origin: &str, destination: &str) -> ItemDetails {
        ItemDetails::Bus {
            operator: "VRL Travels".to_string(),
            bus_type: "Sleeper".to_string(),
            route: Route::new(origin, destination),
            schedule: schedule(10),
            price: Money::from_minor(80_000),
        }
    }

    /// A train with SL (450.00) and 3A (1 250.00) fares
    #[must_use]
    pub fn train_details(origin: &str, destination: &str) -> ItemDetails {
        let fares: BTreeMap<FareClass, Money> = [
            (FareClass::new("SL"), Money::from_minor(45_000)),
            (FareClass::new("3A"), Money::from_minor(125_000)),
        ]
        .into_iter()
        .collect();
        ItemDetails::Train {
            train_number: "12952".to_string(),
            name: "Mumbai Rajdhani".to_string(),
            route: Route::new(origin, destination),
            schedule: schedule(16),
            fares,
        }
    }

    /// A deluxe room in a 5-star hotel at 5 000.00 per night
    #[must_use]
    pub fn room_details(city: &str) -> ItemDetails {
        rated_room_details("Taj Palace", city, 5)
    }

    /// A deluxe room at 5 000.00 per night in `hotel_name`, rated `stars`
    #[must_use]
    pub fn rated_room_details(hotel_name: &str, city: &str, stars: u8) -> ItemDetails {
        ItemDetails::Room {
            hotel_name: hotel_name.to_string(),
            city: city.to_string(),
            room_type: "Deluxe".to_string(),
            star_rating: stars,
            description: format!("{hotel_name}, {city}"),
            nightly_rate: Money::from_minor(500_000),
        }
    }

    /// A pending booking for `guests` named passengers, priced at zero
    #[must_use]
    pub fn pending_booking(id: BookingId, user: UserId, item: ItemKey, guests: u32) -> Booking {
        Booking {
            id,
            user_id: user,
            item,
            passenger_names: (1..=guests).map(|n| format!("Passenger {n}")).collect(),
            guest_count: guests,
            fare_class: None,
            stay: None,
            status: BookingStatus::Pending,
            total_price: Money::ZERO,
            code: None,
            seat_labels: Vec::new(),
            created_at: test_time(),
        }
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// One step of a randomized reserve/cancel sequence.
    #[derive(Clone, Debug)]
    pub enum LedgerOp {
        /// Reserve for `guests` travellers
        Reserve {
            /// Number of travellers
            guests: u32,
        },
        /// Cancel the `nth` booking created so far (modulo the count)
        Cancel {
            /// Index into the created bookings
            nth: usize,
        },
        /// Confirm the `nth` booking created so far (modulo the count)
        Confirm {
            /// Index into the created bookings
            nth: usize,
        },
    }

    /// Strategy producing sequences of up to `max_len` ledger operations
    pub fn ledger_ops(max_guests: u32, max_len: usize) -> impl Strategy<Value = Vec<LedgerOp>> {
        let op = prop_oneof![
            3 => (1..=max_guests).prop_map(|guests| LedgerOp::Reserve { guests }),
            2 => any::<usize>().prop_map(|nth| LedgerOp::Cancel { nth }),
            1 => any::<usize>().prop_map(|nth| LedgerOp::Confirm { nth }),
        ];
        prop::collection::vec(op, 1..=max_len)
    }
}

// Re-export commonly used items
pub use lifecycle_test::LifecycleTest;
pub use memory_store::{InMemoryBookingStore, InMemoryTransaction};
pub use mocks::{FixedClock, test_clock};
