//! Domain types for the Wayfare booking engine.
//!
//! This module contains the identifiers, value objects and entities shared by every
//! layer: inventory items (flights, trains, buses, hotel rooms), seats, bookings and
//! reviews. Item kinds are a tagged union ([`ItemDetails`]) rather than a type
//! hierarchy; the per-kind pricing and quantity rules live on [`InventoryItem`] and
//! [`Booking`].

use crate::error::BookingError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database identifier
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw identifier
            #[must_use]
            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of an inventory item, unique within its [`ItemKind`]
    ItemId
);
numeric_id!(
    /// Identifier of a booking ledger entry
    BookingId
);
numeric_id!(
    /// Identifier of an individual seat
    SeatId
);
numeric_id!(
    /// Identifier of a platform user (issued by the authentication collaborator)
    UserId
);
numeric_id!(
    /// Identifier of a review
    ReviewId
);

// ============================================================================
// Item kinds
// ============================================================================

/// Kind of bookable inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A flight; capacity counts seats
    Flight,
    /// A train; capacity counts berths across fare classes
    Train,
    /// A bus; capacity counts seats
    Bus,
    /// A hotel room type; capacity counts rooms
    Room,
}

impl ItemKind {
    /// All item kinds, in display order
    pub const ALL: [Self; 4] = [Self::Flight, Self::Train, Self::Bus, Self::Room];

    /// Stable lowercase name, used for persistence and metric labels
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flight => "flight",
            Self::Train => "train",
            Self::Bus => "bus",
            Self::Room => "room",
        }
    }

    /// The seat-map vehicle type for this kind, if it has one
    #[must_use]
    pub const fn vehicle_type(&self) -> Option<VehicleType> {
        match self {
            Self::Flight => Some(VehicleType::Flight),
            Self::Train => Some(VehicleType::Train),
            Self::Bus => Some(VehicleType::Bus),
            Self::Room => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flight" => Ok(Self::Flight),
            "train" => Ok(Self::Train),
            "bus" => Ok(Self::Bus),
            // "hotel" is accepted as an alias for rooms
            "room" | "hotel" => Ok(Self::Room),
            other => Err(BookingError::Validation(format!("Unknown item kind '{other}'"))),
        }
    }
}

/// Vehicles that carry an individually addressable seat map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    /// Flight seat map
    Flight,
    /// Train berth map
    Train,
    /// Bus seat map
    Bus,
}

impl VehicleType {
    /// Stable lowercase name, used for persistence
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flight => "flight",
            Self::Train => "train",
            Self::Bus => "bus",
        }
    }

    /// The inventory kind this vehicle belongs to
    #[must_use]
    pub const fn item_kind(&self) -> ItemKind {
        match self {
            Self::Flight => ItemKind::Flight,
            Self::Train => ItemKind::Train,
            Self::Bus => ItemKind::Bus,
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<ItemKind>()?.vehicle_type() {
            Some(vehicle_type) => Ok(vehicle_type),
            None => Err(BookingError::Validation(format!("Invalid vehicle type '{s}'"))),
        }
    }
}

/// Global key of an inventory item: its kind plus its per-kind identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    /// Item kind
    pub kind: ItemKind,
    /// Identifier within the kind
    pub id: ItemId,
}

impl ItemKey {
    /// Creates a new `ItemKey`
    #[must_use]
    pub const fn new(kind: ItemKind, id: ItemId) -> Self {
        Self { kind, id }
    }

    /// The seat map attached to this item, if its kind has one
    #[must_use]
    pub const fn vehicle(&self) -> Option<VehicleRef> {
        match self.kind.vehicle_type() {
            Some(vehicle_type) => Some(VehicleRef::new(vehicle_type, self.id)),
            None => None,
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// A specific vehicle's seat map: `(vehicle_type, vehicle_id)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleRef {
    /// Vehicle type
    pub vehicle_type: VehicleType,
    /// Identifier of the flight, train or bus
    pub vehicle_id: ItemId,
}

impl VehicleRef {
    /// Creates a new `VehicleRef`
    #[must_use]
    pub const fn new(vehicle_type: VehicleType, vehicle_id: ItemId) -> Self {
        Self {
            vehicle_type,
            vehicle_id,
        }
    }

    /// The inventory item owning this seat map
    #[must_use]
    pub const fn item(&self) -> ItemKey {
        ItemKey::new(self.vehicle_type.item_kind(), self.vehicle_id)
    }
}

impl fmt::Display for VehicleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.vehicle_type, self.vehicle_id)
    }
}

// ============================================================================
// Money Value Object (minor units to avoid floating point errors)
// ============================================================================

/// Represents money in minor currency units (paise, cents)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from minor units
    #[must_use]
    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Returns the amount in minor units
    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Fare classes & reservation codes
// ============================================================================

/// Train fare class (SL, 3A, 2A, 1A, CC, EC, ...), normalised to uppercase.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FareClass(String);

impl FareClass {
    /// Creates a normalised fare class
    #[must_use]
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    /// The class code
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FareClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reservation code (PNR) issued on confirmation.
///
/// Always eight ASCII alphanumerics, stored uppercase; parsing is case-insensitive.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReservationCode(String);

impl ReservationCode {
    /// Number of characters in a reservation code
    pub const LENGTH: usize = 8;

    /// Alphabet codes are drawn from
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Parses a code, accepting any letter case.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::Validation` if the input is not eight alphanumerics.
    pub fn parse(input: &str) -> Result<Self, BookingError> {
        let trimmed = input.trim();
        if trimmed.len() != Self::LENGTH || !trimmed.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(BookingError::Validation(format!(
                "Reservation code must be {} alphanumeric characters",
                Self::LENGTH
            )));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// The code as an uppercase string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReservationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ReservationCode {
    type Error = BookingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReservationCode> for String {
    fn from(code: ReservationCode) -> Self {
        code.0
    }
}

// ============================================================================
// Inventory
// ============================================================================

/// Origin and destination of a transport item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Airport code, station or city of departure
    pub origin: String,
    /// Airport code, station or city of arrival
    pub destination: String,
}

impl Route {
    /// Creates a new `Route`
    #[must_use]
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
        }
    }

    /// Case-insensitive match against a searched origin/destination pair
    #[must_use]
    pub fn matches(&self, origin: &str, destination: &str) -> bool {
        self.origin.trim().eq_ignore_ascii_case(origin.trim())
            && self.destination.trim().eq_ignore_ascii_case(destination.trim())
    }
}

/// Departure and arrival times of a transport item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Departure time
    pub departure: DateTime<Utc>,
    /// Arrival time
    pub arrival: DateTime<Utc>,
}

impl Schedule {
    /// Creates a new `Schedule`
    #[must_use]
    pub const fn new(departure: DateTime<Utc>, arrival: DateTime<Utc>) -> Self {
        Self { departure, arrival }
    }

    /// Journey duration formatted as `"{h}h {m}m"`
    #[must_use]
    pub fn duration_label(&self) -> String {
        let minutes = (self.arrival - self.departure).num_minutes().max(0);
        format!("{}h {}m", minutes / 60, minutes % 60)
    }
}

/// Kind-specific description of an inventory item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemDetails {
    /// A scheduled flight
    Flight {
        /// Flight number, e.g. `AI-101`
        flight_number: String,
        /// Operating airline
        airline: String,
        /// Airport codes
        route: Route,
        /// Departure/arrival
        schedule: Schedule,
        /// Price per passenger
        price: Money,
    },
    /// A scheduled train with per-class fares
    Train {
        /// Train number, e.g. `12952`
        train_number: String,
        /// Train name
        name: String,
        /// Stations
        route: Route,
        /// Departure/arrival
        schedule: Schedule,
        /// Price per passenger for each fare class
        fares: BTreeMap<FareClass, Money>,
    },
    /// A scheduled bus
    Bus {
        /// Bus operator
        operator: String,
        /// Sleeper / Seater / Semi-Sleeper
        bus_type: String,
        /// Cities
        route: Route,
        /// Departure/arrival
        schedule: Schedule,
        /// Price per passenger
        price: Money,
    },
    /// A room type within a hotel
    Room {
        /// Hotel name
        hotel_name: String,
        /// Hotel city
        city: String,
        /// Standard / Deluxe / Suite / ...
        room_type: String,
        /// Hotel star rating, 1 to 5
        star_rating: u8,
        /// Free-text description of the hotel
        #[serde(default)]
        description: String,
        /// Price per night
        nightly_rate: Money,
    },
}

impl ItemDetails {
    /// The item kind of these details
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        match self {
            Self::Flight { .. } => ItemKind::Flight,
            Self::Train { .. } => ItemKind::Train,
            Self::Bus { .. } => ItemKind::Bus,
            Self::Room { .. } => ItemKind::Room,
        }
    }

    /// Route, for transport items
    #[must_use]
    pub const fn route(&self) -> Option<&Route> {
        match self {
            Self::Flight { route, .. } | Self::Train { route, .. } | Self::Bus { route, .. } => {
                Some(route)
            }
            Self::Room { .. } => None,
        }
    }

    /// Schedule, for transport items
    #[must_use]
    pub const fn schedule(&self) -> Option<&Schedule> {
        match self {
            Self::Flight { schedule, .. }
            | Self::Train { schedule, .. }
            | Self::Bus { schedule, .. } => Some(schedule),
            Self::Room { .. } => None,
        }
    }

    /// Star rating, for rooms
    #[must_use]
    pub const fn star_rating(&self) -> Option<u8> {
        match self {
            Self::Room { star_rating, .. } => Some(*star_rating),
            _ => None,
        }
    }

    /// Airline, train name or bus operator, for transport items
    #[must_use]
    pub fn carrier(&self) -> Option<&str> {
        match self {
            Self::Flight { airline, .. } => Some(airline),
            Self::Train { name, .. } => Some(name),
            Self::Bus { operator, .. } => Some(operator),
            Self::Room { .. } => None,
        }
    }

    /// Short human label ("IndiGo 6E-302", "Mumbai Rajdhani (12952)", ...)
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Flight {
                flight_number,
                airline,
                ..
            } => format!("{airline} {flight_number}"),
            Self::Train {
                train_number, name, ..
            } => format!("{name} ({train_number})"),
            Self::Bus {
                operator, bus_type, ..
            } => format!("{operator} ({bus_type})"),
            Self::Room {
                hotel_name,
                room_type,
                ..
            } => format!("{hotel_name} - {room_type}"),
        }
    }
}

/// A bookable inventory item with its capacity counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Identifier within the item kind
    pub id: ItemId,
    /// Kind-specific description and pricing
    pub details: ItemDetails,
    /// Capacity assigned at creation
    pub initial_capacity: u32,
    /// Unsold units; never negative, never above `initial_capacity`
    pub available_capacity: u32,
}

impl InventoryItem {
    /// The global key of this item
    #[must_use]
    pub const fn key(&self) -> ItemKey {
        ItemKey::new(self.details.kind(), self.id)
    }

    /// The item kind
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        self.details.kind()
    }

    /// Units currently held by active bookings
    #[must_use]
    pub const fn reserved_units(&self) -> u32 {
        self.initial_capacity.saturating_sub(self.available_capacity)
    }

    /// Price of one unit (a passenger, or a room-night).
    ///
    /// Trains price by fare class; every other kind ignores `fare_class`.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::Validation` if a train is priced without a fare class or
    /// with one it does not sell.
    pub fn unit_price(&self, fare_class: Option<&FareClass>) -> Result<Money, BookingError> {
        match &self.details {
            ItemDetails::Flight { price, .. } | ItemDetails::Bus { price, .. } => Ok(*price),
            ItemDetails::Room { nightly_rate, .. } => Ok(*nightly_rate),
            ItemDetails::Train { fares, .. } => {
                let Some(class) = fare_class else {
                    return Err(BookingError::Validation(
                        "A fare class is required for train bookings".to_string(),
                    ));
                };
                fares
                    .get(class)
                    .copied()
                    .filter(|price| *price > Money::ZERO)
                    .ok_or_else(|| {
                        BookingError::Validation(format!(
                            "Fare class '{class}' is not offered on train {}",
                            self.id
                        ))
                    })
            }
        }
    }

    /// Cheapest price a single unit can be bought for (lowest fare class for trains)
    #[must_use]
    pub fn lowest_price(&self) -> Option<Money> {
        match &self.details {
            ItemDetails::Flight { price, .. } | ItemDetails::Bus { price, .. } => Some(*price),
            ItemDetails::Room { nightly_rate, .. } => Some(*nightly_rate),
            ItemDetails::Train { fares, .. } => fares.values().copied().min(),
        }
    }
}

/// Inventory item to be created; the store assigns the identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInventoryItem {
    /// Kind-specific description and pricing
    pub details: ItemDetails,
    /// Starting capacity (also the ceiling for releases)
    pub capacity: u32,
}

// ============================================================================
// Seats
// ============================================================================

/// An individually addressable seat or berth within a vehicle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Seat identifier
    pub id: SeatId,
    /// Vehicle the seat belongs to
    pub vehicle: VehicleRef,
    /// Human-readable label, unique within the vehicle ("12A", "LB-3")
    pub label: String,
    /// Row (or compartment) number
    pub row: u32,
    /// Column index within the row
    pub col: u32,
    /// Class tag ("economy", "standard", "sleeper")
    pub seat_class: String,
    /// Whether an active booking holds this seat
    pub is_booked: bool,
    /// The booking holding this seat
    pub booking_id: Option<BookingId>,
}

/// Seat to be added to a vehicle's seat map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSpec {
    /// Human-readable label, unique within the vehicle
    pub label: String,
    /// Row (or compartment) number
    pub row: u32,
    /// Column index within the row
    pub col: u32,
    /// Class tag
    pub seat_class: String,
}

/// A vehicle's seat list with booked/available totals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatMapView {
    /// Vehicle the seats belong to
    pub vehicle: VehicleRef,
    /// Seats ordered by row, then column
    pub seats: Vec<Seat>,
    /// Number of seats
    pub total: usize,
    /// Seats held by active bookings
    pub booked: usize,
    /// Seats free to allocate
    pub available: usize,
}

impl SeatMapView {
    /// Builds a view, ordering seats by position
    #[must_use]
    pub fn new(vehicle: VehicleRef, mut seats: Vec<Seat>) -> Self {
        seats.sort_by_key(|seat| (seat.row, seat.col, seat.id));
        let booked = seats.iter().filter(|seat| seat.is_booked).count();
        Self {
            vehicle,
            total: seats.len(),
            booked,
            available: seats.len() - booked,
            seats,
        }
    }
}

// ============================================================================
// Bookings
// ============================================================================

/// Lifecycle status of a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    /// Capacity held, awaiting confirmation
    Pending,
    /// Paid and issued a reservation code
    Confirmed,
    /// Released; terminal
    Cancelled,
}

impl BookingStatus {
    /// Stable name, used for persistence
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Whether the booking still holds capacity
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Confirmed" => Ok(Self::Confirmed),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(BookingError::Validation(format!(
                "Unknown booking status '{other}'"
            ))),
        }
    }
}

/// Hotel stay dates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayDates {
    /// Check-in date
    pub check_in: NaiveDate,
    /// Check-out date
    pub check_out: NaiveDate,
}

impl StayDates {
    /// Validates and creates a stay of at least one night.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::Validation` if check-out is not after check-in.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, BookingError> {
        if check_out <= check_in {
            return Err(BookingError::Validation(
                "Check-out must be after check-in".to_string(),
            ));
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// Number of nights between check-in and check-out
    #[must_use]
    pub fn nights(&self) -> u32 {
        u32::try_from((self.check_out - self.check_in).num_days()).unwrap_or(0)
    }
}

/// The unified booking ledger entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking identifier
    pub id: BookingId,
    /// Owning user
    pub user_id: UserId,
    /// Booked item
    pub item: ItemKey,
    /// Passenger (or guest) names in entry order
    pub passenger_names: Vec<String>,
    /// Number of travellers
    pub guest_count: u32,
    /// Train fare class
    pub fare_class: Option<FareClass>,
    /// Hotel stay
    pub stay: Option<StayDates>,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Total price charged
    pub total_price: Money,
    /// Reservation code, issued on confirmation
    pub code: Option<ReservationCode>,
    /// Labels of seats allocated to this booking (possibly empty)
    pub seat_labels: Vec<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Capacity units this booking holds: one room, or one unit per traveller
    #[must_use]
    pub const fn reserved_units(&self) -> u32 {
        reserved_units(self.item.kind, self.guest_count)
    }
}

/// Capacity units consumed by a booking of `kind` for `guest_count` travellers.
#[must_use]
pub const fn reserved_units(kind: ItemKind, guest_count: u32) -> u32 {
    match kind {
        ItemKind::Room => 1,
        ItemKind::Flight | ItemKind::Train | ItemKind::Bus => guest_count,
    }
}

// ============================================================================
// Reviews
// ============================================================================

/// A user's rating of an item; one per (user, item kind, item id).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review identifier
    pub id: ReviewId,
    /// Author
    pub user_id: UserId,
    /// Reviewed item
    pub item: ItemKey,
    /// Rating, 1 to 5
    pub rating: u8,
    /// Free-text comment
    pub comment: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Review to be stored; the store assigns the identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    /// Author
    pub user_id: UserId,
    /// Reviewed item
    pub item: ItemKey,
    /// Rating, 1 to 5
    pub rating: u8,
    /// Free-text comment
    pub comment: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn train(fares: &[(&str, u64)]) -> InventoryItem {
        let departure = Utc.with_ymd_and_hms(2026, 3, 10, 16, 30, 0).unwrap();
        InventoryItem {
            id: ItemId::new(7),
            details: ItemDetails::Train {
                train_number: "12952".to_string(),
                name: "Mumbai Rajdhani".to_string(),
                route: Route::new("New Delhi", "Mumbai Central"),
                schedule: Schedule::new(departure, departure + chrono::Duration::hours(16)),
                fares: fares
                    .iter()
                    .map(|(class, price)| (FareClass::new(class), Money::from_minor(*price)))
                    .collect(),
            },
            initial_capacity: 120,
            available_capacity: 120,
        }
    }

    #[test]
    fn train_prices_by_fare_class() {
        let item = train(&[("SL", 450), ("3A", 1250)]);
        assert_eq!(
            item.unit_price(Some(&FareClass::new("3a"))).unwrap(),
            Money::from_minor(1250)
        );
        assert_eq!(item.lowest_price(), Some(Money::from_minor(450)));
    }

    #[test]
    fn train_rejects_missing_or_unknown_fare_class() {
        let item = train(&[("SL", 450)]);
        assert!(matches!(item.unit_price(None), Err(BookingError::Validation(_))));
        assert!(matches!(
            item.unit_price(Some(&FareClass::new("1A"))),
            Err(BookingError::Validation(_))
        ));
    }

    #[test]
    fn rooms_hold_one_unit_regardless_of_guests() {
        assert_eq!(reserved_units(ItemKind::Room, 4), 1);
        assert_eq!(reserved_units(ItemKind::Bus, 4), 4);
    }

    #[test]
    fn stay_requires_at_least_one_night() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert!(StayDates::new(day, day).is_err());
        let stay = StayDates::new(day, NaiveDate::from_ymd_opt(2026, 3, 12).unwrap()).unwrap();
        assert_eq!(stay.nights(), 2);
    }

    #[test]
    fn reservation_code_parses_case_insensitively() {
        let code = ReservationCode::parse(" ab12cd34 ").unwrap();
        assert_eq!(code.as_str(), "AB12CD34");
        assert!(ReservationCode::parse("AB12CD3").is_err());
        assert!(ReservationCode::parse("AB12CD3!").is_err());
    }

    #[test]
    fn duration_label_formats_hours_and_minutes() {
        let departure = Utc.with_ymd_and_hms(2026, 3, 10, 6, 0, 0).unwrap();
        let schedule = Schedule::new(
            departure,
            departure + chrono::Duration::minutes(2 * 60 + 15),
        );
        assert_eq!(schedule.duration_label(), "2h 15m");
    }

    #[test]
    fn hotel_is_an_alias_for_room() {
        assert_eq!("Hotel".parse::<ItemKind>().unwrap(), ItemKind::Room);
        assert!("hotel".parse::<VehicleType>().is_err());
    }

    #[test]
    fn seat_map_view_orders_and_counts() {
        let vehicle = VehicleRef::new(VehicleType::Bus, ItemId::new(1));
        let seat = |id: i64, row: u32, col: u32, booked: bool| Seat {
            id: SeatId::new(id),
            vehicle,
            label: format!("{row}{col}"),
            row,
            col,
            seat_class: "standard".to_string(),
            is_booked: booked,
            booking_id: None,
        };
        let view = SeatMapView::new(
            vehicle,
            vec![seat(3, 2, 0, true), seat(1, 1, 1, false), seat(2, 1, 0, false)],
        );
        let ids: Vec<i64> = view.seats.iter().map(|s| s.id.value()).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!((view.total, view.booked, view.available), (3, 1, 2));
    }

    #[test]
    fn room_details_decode_without_description() {
        let json = r#"{"kind":"room","hotel_name":"Leela","city":"Goa","room_type":"Suite","star_rating":5,"nightly_rate":1200000}"#;
        let details: ItemDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.star_rating(), Some(5));
        assert_eq!(details.carrier(), None);
        assert!(matches!(
            &details,
            ItemDetails::Room { description, .. } if description.is_empty()
        ));
        assert_eq!(train(&[("SL", 450)]).details.carrier(), Some("Mumbai Rajdhani"));
    }

    proptest::proptest! {
        #[test]
        fn money_multiply_matches_integer_math(minor in 0u64..1_000_000, qty in 0u32..1_000) {
            let total = Money::from_minor(minor).checked_multiply(qty).unwrap();
            proptest::prop_assert_eq!(total.minor(), minor * u64::from(qty));
        }
    }
}
