//! Reservation requests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use wayfare_core::types::{FareClass, ItemKey, SeatId, UserId};

/// Everything a caller supplies to reserve an inventory item.
///
/// Fields are kept raw; [`crate::pricing::quote`] normalises and validates them
/// against the item being booked.
///
/// # Example
///
/// ```
/// use wayfare_booking::ReservationRequest;
/// use wayfare_core::types::{ItemId, ItemKey, ItemKind, UserId};
///
/// let request = ReservationRequest::new(UserId::new(1), ItemKey::new(ItemKind::Train, ItemId::new(4)))
///     .passengers(["Asha Rao", "Vikram Rao"])
///     .fare_class("3a");
/// assert_eq!(request.passenger_names.len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    /// Booking owner
    pub user_id: UserId,
    /// Item to reserve
    pub item: ItemKey,
    /// Passenger (or guest) names as entered
    pub passenger_names: Vec<String>,
    /// Train fare class
    pub fare_class: Option<FareClass>,
    /// Hotel check-in and check-out dates
    pub stay: Option<(NaiveDate, NaiveDate)>,
    /// Seats the caller would like, best effort
    pub seat_ids: Vec<SeatId>,
}

impl ReservationRequest {
    /// A request with no passengers, class, stay or seats
    #[must_use]
    pub const fn new(user_id: UserId, item: ItemKey) -> Self {
        Self {
            user_id,
            item,
            passenger_names: Vec::new(),
            fare_class: None,
            stay: None,
            seat_ids: Vec::new(),
        }
    }

    /// Sets the passenger names
    #[must_use]
    pub fn passengers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.passenger_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the train fare class
    #[must_use]
    pub fn fare_class(mut self, class: impl AsRef<str>) -> Self {
        self.fare_class = Some(FareClass::new(class));
        self
    }

    /// Sets the hotel stay
    #[must_use]
    pub const fn stay(mut self, check_in: NaiveDate, check_out: NaiveDate) -> Self {
        self.stay = Some((check_in, check_out));
        self
    }

    /// Sets the requested seats
    #[must_use]
    pub fn seats(mut self, seat_ids: impl IntoIterator<Item = SeatId>) -> Self {
        self.seat_ids = seat_ids.into_iter().collect();
        self
    }
}
