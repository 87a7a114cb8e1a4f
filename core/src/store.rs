//! Store abstractions: the capacity ledger, seat map and booking ledger.
//!
//! Mutations of the three ledgers happen inside a [`StoreTransaction`] obtained from
//! [`BookingStore::begin`]. A transaction that is dropped without [`StoreTransaction::commit`]
//! is rolled back, so a workflow that bails out with `?` after decrementing capacity
//! leaves no trace.
//!
//! # Implementations
//!
//! - `PostgresBookingStore` (in `wayfare-postgres`): conditional `UPDATE`s and row locks
//! - `InMemoryBookingStore` (in `wayfare-testing`): a single async mutex with an undo journal
//!
//! # Dyn Compatibility
//!
//! Methods return [`StoreFuture`] (`Pin<Box<dyn Future>>`) rather than using `async fn`,
//! so the engine can hold an `Arc<dyn BookingStore>` and a `Box<dyn StoreTransaction>`.

use crate::error::StoreError;
use crate::types::{
    Booking, BookingId, InventoryItem, ItemKey, ItemKind, NewInventoryItem, NewReview,
    ReservationCode, Review, Seat, SeatId, SeatSpec, UserId, VehicleRef,
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Outcome of a conditional capacity decrement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Capacity was decremented
    Reserved {
        /// Capacity left after the decrement
        remaining: u32,
    },
    /// Not enough capacity; nothing changed
    Insufficient {
        /// Capacity at the time of the attempt
        available: u32,
    },
    /// No such item
    UnknownItem,
}

/// Per-item counter of remaining capacity.
pub trait CapacityLedger: Send {
    /// Decrements `available_capacity` by `quantity` if at least `quantity` remains.
    ///
    /// Never blocks waiting for capacity and never partially decrements. Concurrent
    /// callers serialize on the item, so two callers competing for the last unit see
    /// exactly one `Reserved`.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    fn try_reserve(&mut self, item: ItemKey, quantity: u32) -> StoreFuture<'_, ReserveOutcome>;

    /// Returns `quantity` units to the item, clamped at its initial capacity.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    fn release(&mut self, item: ItemKey, quantity: u32) -> StoreFuture<'_, ()>;
}

/// Per-vehicle map of individually addressable seats.
pub trait SeatMap: Send {
    /// Marks the requested seats booked by `booking`, skipping any that are already
    /// booked, belong to another vehicle or do not exist.
    ///
    /// Returns the labels of the seats actually allocated, in row/column order.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    fn allocate_seats(
        &mut self,
        vehicle: VehicleRef,
        seat_ids: Vec<SeatId>,
        booking: BookingId,
    ) -> StoreFuture<'_, Vec<String>>;

    /// Unbooks and unlinks every seat held by `booking`; returns how many were freed.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    fn release_seats(&mut self, booking: BookingId) -> StoreFuture<'_, u32>;
}

/// Transactional record of bookings.
pub trait BookingLedger: Send {
    /// Reserves the identifier the next inserted booking will use.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    fn next_booking_id(&mut self) -> StoreFuture<'_, BookingId>;

    /// Inserts a new booking row.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    /// - `Conflict`: identifier or reservation code already used
    fn insert_booking(&mut self, booking: Booking) -> StoreFuture<'_, ()>;

    /// Loads a booking and locks it until the transaction ends.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    /// - `Serialization`: stored row could not be decoded
    fn lock_booking(&mut self, id: BookingId) -> StoreFuture<'_, Option<Booking>>;

    /// Overwrites the mutable fields of an existing booking (status, code, seat labels).
    ///
    /// # Errors
    ///
    /// - `Database`: query failed or the booking does not exist
    /// - `Conflict`: reservation code already used
    fn update_booking(&mut self, booking: Booking) -> StoreFuture<'_, ()>;

    /// Whether any booking already carries `code`.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    fn code_exists(&mut self, code: ReservationCode) -> StoreFuture<'_, bool>;
}

/// A unit of work spanning the three ledgers.
///
/// Dropping the transaction without committing rolls every change back.
pub trait StoreTransaction: CapacityLedger + SeatMap + BookingLedger {
    /// Makes every change of the transaction durable and visible.
    ///
    /// # Errors
    ///
    /// - `Database`: commit failed (the transaction is rolled back)
    fn commit(self: Box<Self>) -> StoreFuture<'static, ()>;
}

/// Persistent store for inventory, seats, bookings and reviews.
///
/// Implementations must be `Send + Sync` to be shared as `Arc<dyn BookingStore>`.
pub trait BookingStore: Send + Sync {
    /// Opens a transaction over the capacity ledger, seat map and booking ledger.
    ///
    /// # Errors
    ///
    /// - `Database`: a connection could not be acquired
    fn begin(&self) -> StoreFuture<'_, Box<dyn StoreTransaction>>;

    /// Creates an inventory item with `available_capacity == initial_capacity == capacity`.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    /// - `Serialization`: details could not be encoded
    fn create_item(&self, item: NewInventoryItem) -> StoreFuture<'_, InventoryItem>;

    /// Loads an inventory item.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    /// - `Serialization`: stored details could not be decoded
    fn get_item(&self, key: ItemKey) -> StoreFuture<'_, Option<InventoryItem>>;

    /// Transport items of `kind` departing in `[from, until)` whose route matches
    /// `origin`/`destination` case-insensitively, ordered by departure.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    /// - `Serialization`: stored details could not be decoded
    fn items_on_route(
        &self,
        kind: ItemKind,
        origin: String,
        destination: String,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreFuture<'_, Vec<InventoryItem>>;

    /// Transport items of `kind` with capacity left whose route matches
    /// `origin`/`destination` case-insensitively, ordered by departure.
    ///
    /// `departing` restricts departures to `[from, until)`; `None` searches every date.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    /// - `Serialization`: stored details could not be decoded
    fn available_on_route(
        &self,
        kind: ItemKind,
        origin: String,
        destination: String,
        departing: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> StoreFuture<'_, Vec<InventoryItem>>;

    /// Rooms whose city contains `city` (case-insensitive) in hotels rated at least
    /// `min_stars`, highest rated first.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    /// - `Serialization`: stored details could not be decoded
    fn rooms_in_city(&self, city: String, min_stars: u8) -> StoreFuture<'_, Vec<InventoryItem>>;

    /// Adds seats to a vehicle's seat map; returns the created seats.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    /// - `Conflict`: a label already exists on the vehicle
    fn add_seats(&self, vehicle: VehicleRef, seats: Vec<SeatSpec>) -> StoreFuture<'_, Vec<Seat>>;

    /// All seats of a vehicle, ordered by row then column.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    fn list_seats(&self, vehicle: VehicleRef) -> StoreFuture<'_, Vec<Seat>>;

    /// Loads a booking without locking it.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    /// - `Serialization`: stored row could not be decoded
    fn get_booking(&self, id: BookingId) -> StoreFuture<'_, Option<Booking>>;

    /// Finds the booking carrying `code`.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    /// - `Serialization`: stored row could not be decoded
    fn find_by_code(&self, code: ReservationCode) -> StoreFuture<'_, Option<Booking>>;

    /// A user's bookings, newest first.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    /// - `Serialization`: stored rows could not be decoded
    fn bookings_for_user(&self, user: UserId) -> StoreFuture<'_, Vec<Booking>>;

    /// Stores a review.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    /// - `Conflict`: the user already reviewed the item
    fn insert_review(&self, review: NewReview) -> StoreFuture<'_, Review>;

    /// Reviews of an item, newest first.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    fn reviews_for(&self, item: ItemKey) -> StoreFuture<'_, Vec<Review>>;
}
