//! Price resolution for reservation requests.
//!
//! Runs before any ledger is touched: a request that cannot be priced never reaches the
//! capacity ledger.

use crate::request::ReservationRequest;
use wayfare_core::BookingError;
use wayfare_core::error::Result;
use wayfare_core::types::{
    FareClass, InventoryItem, ItemKind, Money, StayDates, reserved_units,
};

/// A validated, priced reservation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quote {
    /// Trimmed, non-blank passenger names
    pub passenger_names: Vec<String>,
    /// Number of travellers (at least 1)
    pub guest_count: u32,
    /// Capacity units to reserve
    pub units: u32,
    /// Fare class (trains only)
    pub fare_class: Option<FareClass>,
    /// Stay dates (rooms only)
    pub stay: Option<StayDates>,
    /// Price per passenger, or per night for rooms
    pub unit_price: Money,
    /// Amount charged
    pub total_price: Money,
}

/// Validates `request` against `item` and computes the price.
///
/// - transport: unit price × guest count (trains price by fare class)
/// - rooms: nightly rate × nights, one unit whatever the guest count
///
/// Seat ids play no part in the price; rooms have no seat map and ignore them.
///
/// # Errors
///
/// Returns `BookingError::Validation` if:
/// - a room is booked without a stay, with check-out not after check-in, or with a fare
///   class
/// - a transport item is booked with a stay
/// - a train is booked without a fare class, or with one it does not sell
/// - a fare class is given for anything but a train
/// - the total overflows
pub fn quote(item: &InventoryItem, request: &ReservationRequest) -> Result<Quote> {
    let kind = item.kind();
    let passenger_names: Vec<String> = request
        .passenger_names
        .iter()
        .map(String::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    let guest_count = u32::try_from(passenger_names.len())
        .map_err(|_| BookingError::Validation("Too many passengers".to_string()))?
        .max(1);

    if request.fare_class.is_some() && kind != ItemKind::Train {
        return Err(BookingError::Validation(format!(
            "Fare classes apply to trains only, not to a {kind}"
        )));
    }

    let stay = match (kind, request.stay) {
        (ItemKind::Room, Some((check_in, check_out))) => Some(StayDates::new(check_in, check_out)?),
        (ItemKind::Room, None) => {
            return Err(BookingError::Validation(
                "Check-in and check-out dates are required for hotel bookings".to_string(),
            ));
        }
        (_, Some(_)) => {
            return Err(BookingError::Validation(format!(
                "Stay dates apply to hotel rooms only, not to a {kind}"
            )));
        }
        (_, None) => None,
    };

    let unit_price = item.unit_price(request.fare_class.as_ref())?;
    let multiplier = stay.map_or(guest_count, |stay| stay.nights());
    let total_price = unit_price.checked_multiply(multiplier).ok_or_else(|| {
        BookingError::Validation(format!("Total of {unit_price} × {multiplier} is too large"))
    })?;

    Ok(Quote {
        units: reserved_units(kind, guest_count),
        passenger_names,
        guest_count,
        fare_class: request.fare_class.clone(),
        stay,
        unit_price,
        total_price,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wayfare_core::types::{ItemId, SeatId, UserId};
    use wayfare_testing::fixtures::{bus_details, room_details, train_details};

    fn item(details: wayfare_core::types::ItemDetails) -> InventoryItem {
        InventoryItem {
            id: ItemId::new(1),
            details,
            initial_capacity: 10,
            available_capacity: 10,
        }
    }

    fn request(item: &InventoryItem) -> ReservationRequest {
        ReservationRequest::new(UserId::new(1), item.key())
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[test]
    fn blank_names_are_dropped_and_guest_count_defaults_to_one() {
        let bus = item(bus_details("Delhi", "Jaipur"));
        let quote = quote(&bus, &request(&bus).passengers(["  ", ""])).unwrap();
        assert!(quote.passenger_names.is_empty());
        assert_eq!(quote.guest_count, 1);
        assert_eq!(quote.units, 1);
        assert_eq!(quote.total_price, Money::from_minor(80_000));

        let quote = super::quote(&bus, &request(&bus).passengers([" Asha ", "", "Ravi"])).unwrap();
        assert_eq!(quote.passenger_names, vec!["Asha", "Ravi"]);
        assert_eq!(quote.total_price, Money::from_minor(160_000));
    }

    #[test]
    fn hotel_is_priced_per_night_for_one_room() {
        let room = item(room_details("Mumbai"));
        let quote = quote(
            &room,
            &request(&room).passengers(["Meera", "Kabir", "Ira"]).stay(date(10), date(12)),
        )
        .unwrap();
        assert_eq!(quote.units, 1);
        assert_eq!(quote.guest_count, 3);
        assert_eq!(quote.stay.unwrap().nights(), 2);
        assert_eq!(quote.total_price, Money::from_minor(1_000_000));
    }

    #[test]
    fn hotel_requires_a_positive_stay() {
        let room = item(room_details("Mumbai"));
        for bad in [
            request(&room),
            request(&room).stay(date(10), date(10)),
            request(&room).stay(date(12), date(10)),
            request(&room).stay(date(10), date(11)).fare_class("SL"),
        ] {
            assert!(matches!(quote(&room, &bad), Err(BookingError::Validation(_))));
        }
    }

    #[test]
    fn hotel_ignores_seat_ids() {
        let room = item(room_details("Mumbai"));
        let with_seats = request(&room).stay(date(10), date(12)).seats([SeatId::new(404)]);
        let quote = quote(&room, &with_seats).unwrap();
        assert_eq!(quote.units, 1);
        assert_eq!(quote.total_price, Money::from_minor(1_000_000));
    }

    #[test]
    fn train_fare_class_lookup() {
        let train = item(train_details("New Delhi", "Mumbai Central"));
        let req = request(&train).passengers(["A", "B"]).fare_class("3a");
        let quote = quote(&train, &req).unwrap();
        assert_eq!(quote.fare_class.unwrap().as_str(), "3A");
        assert_eq!(quote.total_price, Money::from_minor(250_000));

        assert!(super::quote(&train, &request(&train)).is_err());
        assert!(super::quote(&train, &request(&train).fare_class("1A")).is_err());
    }

    #[test]
    fn transport_rejects_stay_and_non_train_rejects_class() {
        let bus = item(bus_details("Delhi", "Jaipur"));
        assert!(quote(&bus, &request(&bus).stay(date(1), date(2))).is_err());
        assert!(quote(&bus, &request(&bus).fare_class("SL")).is_err());
    }

    #[test]
    fn overflow_is_a_validation_error() {
        let mut bus = item(bus_details("Delhi", "Jaipur"));
        if let wayfare_core::types::ItemDetails::Bus { price, .. } = &mut bus.details {
            *price = Money::from_minor(u64::MAX / 2 + 1);
        }
        let err = quote(&bus, &request(&bus).passengers(["A", "B"])).unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }
}
