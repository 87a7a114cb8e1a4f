//! Seat map layouts used when seeding vehicles.
//!
//! | Vehicle | Layout | Labels | Class | Minimum rows |
//! |---|---|---|---|---|
//! | Flight | 3+3 | `12A` … `12F` | economy | 4 |
//! | Bus | 2+2 | `7A` … `7D` | standard | 5 |
//! | Train | 8-berth compartments | `LB-3A`, `UB-3B`, `SU-3` | sleeper | 5 |
//!
//! A train compartment has a lower, middle and upper berth on each side (suffixed `A`
//! and `B` to keep labels unique within the coach) plus a side lower and side upper.
//! Generation stops as soon as `seat_count` seats exist, so the last row may be partial.

use wayfare_core::types::{SeatSpec, VehicleType};

const FLIGHT_COLUMNS: [&str; 6] = ["A", "B", "C", "D", "E", "F"];
const BUS_COLUMNS: [&str; 4] = ["A", "B", "C", "D"];
const TRAIN_BERTHS: [(&str, &str); 8] = [
    ("LB", "A"),
    ("MB", "A"),
    ("UB", "A"),
    ("LB", "B"),
    ("MB", "B"),
    ("UB", "B"),
    ("SL", ""),
    ("SU", ""),
];

/// Seats for a vehicle of `vehicle_type` holding `seat_count` passengers.
#[must_use]
pub fn layout(vehicle_type: VehicleType, seat_count: u32) -> Vec<SeatSpec> {
    match vehicle_type {
        VehicleType::Flight => flight_layout(seat_count),
        VehicleType::Bus => bus_layout(seat_count),
        VehicleType::Train => train_layout(seat_count),
    }
}

/// 3+3 economy cabin.
#[must_use]
pub fn flight_layout(seat_count: u32) -> Vec<SeatSpec> {
    grid(seat_count, 4, &FLIGHT_COLUMNS, "economy", |row, column| {
        format!("{row}{column}")
    })
}

/// 2+2 coach.
#[must_use]
pub fn bus_layout(seat_count: u32) -> Vec<SeatSpec> {
    grid(seat_count, 5, &BUS_COLUMNS, "standard", |row, column| {
        format!("{row}{column}")
    })
}

/// Sleeper coach: per compartment three berths on each side plus two side berths.
#[must_use]
pub fn train_layout(seat_count: u32) -> Vec<SeatSpec> {
    grid(seat_count, 5, &TRAIN_BERTHS, "sleeper", |compartment, (berth, side)| {
        format!("{berth}-{compartment}{side}")
    })
}

fn grid<C: Copy>(
    seat_count: u32,
    min_rows: u32,
    columns: &[C],
    seat_class: &str,
    label: impl Fn(u32, C) -> String,
) -> Vec<SeatSpec> {
    let width = u32::try_from(columns.len()).unwrap_or(u32::MAX).max(1);
    let rows = seat_count.div_ceil(width).max(min_rows);

    (1..=rows)
        .flat_map(|row| {
            columns.iter().zip(0u32..).map(move |(column, col)| (row, col, *column))
        })
        .take(usize::try_from(seat_count).unwrap_or(usize::MAX))
        .map(|(row, col, column)| SeatSpec {
            label: label(row, column),
            row,
            col,
            seat_class: seat_class.to_string(),
        })
        .collect()
}
