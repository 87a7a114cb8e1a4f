//! Sample inventory for demos and local development.
//!
//! Every transport route departs once a day for `days` days starting at `start`; hotel
//! rooms are created once. Fares vary by up to ±10% per departure and vehicle sizes are
//! drawn per departure, so the fare calendar has something to show.

use crate::engine::BookingEngine;
use chrono::{Duration, NaiveDate, NaiveTime};
use rand::Rng;
use std::collections::BTreeMap;
use wayfare_core::error::Result;
use wayfare_core::types::{FareClass, ItemDetails, Money, NewInventoryItem, Route, Schedule};

/// (number, airline, origin, destination, departure hour, duration minutes, base fare)
const FLIGHTS: &[(&str, &str, &str, &str, u32, i64, u64)] = &[
    ("AI-101", "Air India", "DEL", "BOM", 6, 135, 4500),
    ("6E-302", "IndiGo", "DEL", "BOM", 9, 130, 3800),
    ("UK-833", "Vistara", "BOM", "DEL", 14, 140, 5800),
    ("SG-155", "SpiceJet", "DEL", "BLR", 7, 150, 5200),
    ("UK-410", "Vistara", "BLR", "HYD", 6, 70, 2900),
];

/// (number, name, origin, destination, departure hour, departure minute, duration hours, fares)
const TRAINS: &[(&str, &str, &str, &str, u32, u32, i64, &[(&str, u64)])] = &[
    (
        "12952",
        "Mumbai Rajdhani",
        "New Delhi",
        "Mumbai Central",
        16,
        30,
        16,
        &[("SL", 450), ("3A", 1250), ("2A", 1850), ("1A", 3100)],
    ),
    (
        "12301",
        "Howrah Rajdhani",
        "New Delhi",
        "Howrah",
        17,
        0,
        17,
        &[("3A", 1400), ("2A", 2100), ("1A", 3500)],
    ),
    (
        "12002",
        "Bhopal Shatabdi",
        "New Delhi",
        "Bhopal",
        6,
        15,
        8,
        &[("CC", 980), ("EC", 1850)],
    ),
];

/// (operator, origin, destination, departure hour, duration hours, bus type, fare)
const BUSES: &[(&str, &str, &str, u32, i64, &str, u64)] = &[
    ("RedBus Travels", "Delhi", "Jaipur", 22, 6, "Sleeper", 850),
    ("VRL Travels", "Bangalore", "Goa", 21, 10, "Semi-Sleeper", 1200),
    ("KSRTC", "Bangalore", "Chennai", 23, 6, "Seater", 650),
    ("MSRTC Shivneri", "Mumbai", "Pune", 7, 4, "Seater", 450),
];

/// (room type, nightly rate, rooms)
type RoomType = (&'static str, u64, u32);

/// (hotel, city, stars, description, room types)
const HOTELS: &[(&str, &str, u8, &str, &[RoomType])] = &[
    (
        "The Grand Palace",
        "Mumbai",
        5,
        "A luxurious 5-star hotel overlooking the Arabian Sea.",
        &[("Standard", 5500, 15), ("Suite", 15000, 4)],
    ),
    (
        "Hotel Sunrise",
        "Delhi",
        4,
        "Premium business hotel in the heart of Delhi.",
        &[("Deluxe", 5800, 12)],
    ),
    (
        "The Ashoka",
        "Delhi",
        5,
        "Iconic 5-star hotel with lush gardens and heritage.",
        &[("Standard", 6000, 12), ("Presidential Suite", 22000, 2)],
    ),
    (
        "Heritage Inn",
        "Jaipur",
        3,
        "Charming heritage property with Rajasthani decor.",
        &[("Standard", 1800, 22)],
    ),
    (
        "Coastal Breeze",
        "Goa",
        4,
        "Beachfront resort with infinity pool and spa.",
        &[("Beach Villa", 12000, 3)],
    ),
];

/// What [`seed`] created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Flights created
    pub flights: usize,
    /// Trains created
    pub trains: usize,
    /// Buses created
    pub buses: usize,
    /// Hotel room types created
    pub rooms: usize,
    /// Seats generated across all vehicles
    pub seats: usize,
}

fn rupees(amount: u64) -> Money {
    Money::from_minor(amount * 100)
}

fn vary<R: Rng + ?Sized>(rng: &mut R, base: u64) -> Money {
    let factor: f64 = rng.gen_range(0.9..=1.1);
    // Fares are whole rupees well below 2^52
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let amount = (base as f64 * factor).round() as u64;
    rupees(amount)
}

fn schedule(day: NaiveDate, hour: u32, minute: u32, duration: Duration) -> Schedule {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    let departure = day.and_time(time).and_utc();
    Schedule::new(departure, departure + duration)
}

/// The items [`seed`] would create, without touching a store.
pub fn plan<R: Rng + ?Sized>(rng: &mut R, start: NaiveDate, days: u32) -> Vec<NewInventoryItem> {
    let mut items = Vec::new();

    let dates = (0..days)
        .filter_map(|offset| start.checked_add_signed(Duration::days(offset.into())));
    for day in dates {
        for &(number, airline, origin, destination, hour, minutes, fare) in FLIGHTS {
            items.push(NewInventoryItem {
                details: ItemDetails::Flight {
                    flight_number: number.to_string(),
                    airline: airline.to_string(),
                    route: Route::new(origin, destination),
                    schedule: schedule(day, hour, 0, Duration::minutes(minutes)),
                    price: vary(rng, fare),
                },
                capacity: rng.gen_range(20..=60),
            });
        }

        for &(number, name, origin, destination, hour, minute, hours, fares) in TRAINS {
            let fares: BTreeMap<FareClass, Money> = fares
                .iter()
                .map(|&(class, fare)| (FareClass::new(class), vary(rng, fare)))
                .collect();
            items.push(NewInventoryItem {
                details: ItemDetails::Train {
                    train_number: number.to_string(),
                    name: name.to_string(),
                    route: Route::new(origin, destination),
                    schedule: schedule(day, hour, minute, Duration::hours(hours)),
                    fares,
                },
                capacity: rng.gen_range(80..=200),
            });
        }

        for &(operator, origin, destination, hour, hours, bus_type, fare) in BUSES {
            items.push(NewInventoryItem {
                details: ItemDetails::Bus {
                    operator: operator.to_string(),
                    bus_type: bus_type.to_string(),
                    route: Route::new(origin, destination),
                    schedule: schedule(day, hour, 0, Duration::hours(hours)),
                    price: vary(rng, fare),
                },
                capacity: rng.gen_range(20..=45),
            });
        }
    }

    for &(hotel, city, stars, description, room_types) in HOTELS {
        for &(room_type, rate, rooms) in room_types {
            items.push(NewInventoryItem {
                details: ItemDetails::Room {
                    hotel_name: hotel.to_string(),
                    city: city.to_string(),
                    room_type: room_type.to_string(),
                    star_rating: stars,
                    description: description.to_string(),
                    nightly_rate: rupees(rate),
                },
                capacity: rooms,
            });
        }
    }

    items
}

/// Creates the sample inventory and a seat map for every vehicle.
///
/// # Errors
///
/// Whatever [`BookingEngine::create_item`] or [`BookingEngine::seed_vehicle_seats`]
/// returns; items created before the failure stay.
pub async fn seed(engine: &BookingEngine, start: NaiveDate, days: u32) -> Result<SeedSummary> {
    let items = plan(&mut rand::thread_rng(), start, days);
    let mut summary = SeedSummary::default();

    for new_item in items {
        let item = engine.create_item(new_item).await?;
        match item.details {
            ItemDetails::Flight { .. } => summary.flights += 1,
            ItemDetails::Train { .. } => summary.trains += 1,
            ItemDetails::Bus { .. } => summary.buses += 1,
            ItemDetails::Room { .. } => summary.rooms += 1,
        }
        if let Some(vehicle) = item.key().vehicle() {
            summary.seats += engine.seed_vehicle_seats(vehicle).await?.len();
        }
    }

    tracing::info!(?summary, days, "Sample inventory seeded");
    Ok(summary)
}
