//! The booking engine.
//!
//! [`BookingEngine`] orchestrates the capacity ledger, seat map and booking ledger of a
//! [`BookingStore`]:
//!
//! ```text
//! reserve:  price ─▶ try_reserve ─▶ allocate_seats ─▶ insert_booking ─▶ commit
//! confirm:  lock_booking ─▶ issue code ─▶ Confirmed ─▶ update_booking ─▶ commit
//! cancel:   lock_booking ─▶ Cancelled ─▶ release ─▶ release_seats ─▶ update_booking ─▶ commit
//! ```
//!
//! Each workflow runs in one store transaction. Returning early with `?` drops the
//! transaction uncommitted, which rolls back the capacity decrement and any seat
//! allocation with it. Committed lifecycle changes are published as
//! [`BookingEvent`]s to every [`BookingEngine::subscribe`]r.
//!
//! The engine reads items with the store's own query methods before it opens a
//! transaction and never while one is open.

mod cancel;
mod confirm;
mod reserve;
mod reviews;
mod search;

use crate::config::EngineConfig;
use crate::fare_calendar::{self, CalendarMonth, FareDay};
use crate::pnr::CodeGenerator;
use crate::seat_layout;
use std::sync::Arc;
use tokio::sync::broadcast;
use wayfare_core::BookingError;
use wayfare_core::environment::Clock;
use wayfare_core::error::Result;
use wayfare_core::lifecycle::BookingEvent;
use wayfare_core::store::BookingStore;
use wayfare_core::types::{
    Booking, BookingId, InventoryItem, ItemKey, ItemKind, NewInventoryItem, ReservationCode,
    Seat, SeatMapView, SeatSpec, UserId, VehicleRef,
};

/// Reservation, confirmation and cancellation over a shared [`BookingStore`].
///
/// Cheap to clone; clones share the store, clock and event channel.
#[derive(Clone)]
pub struct BookingEngine {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<BookingEvent>,
    codes: CodeGenerator,
}

impl std::fmt::Debug for BookingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingEngine")
            .field("codes", &self.codes)
            .field("subscribers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl BookingEngine {
    /// Creates an engine over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn BookingStore>, clock: Arc<dyn Clock>, config: &EngineConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_channel_capacity.max(1));
        Self {
            store,
            clock,
            events,
            codes: CodeGenerator::new(config.code_max_attempts),
        }
    }

    /// Receives every lifecycle event committed after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: BookingEvent) {
        tracing::debug!(event = event.name(), booking_id = %event.booking_id(), "Publishing booking event");
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    async fn load_item(&self, key: ItemKey) -> Result<InventoryItem> {
        self.store
            .get_item(key)
            .await?
            .ok_or_else(|| BookingError::not_found(key.kind.as_str(), key.id))
    }

    async fn load_vehicle(&self, vehicle: VehicleRef) -> Result<InventoryItem> {
        self.load_item(vehicle.item()).await
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    /// Creates an inventory item.
    ///
    /// # Errors
    ///
    /// - `Validation`: capacity is zero
    /// - `Store`: the write failed
    #[tracing::instrument(skip(self, item), fields(kind = %item.details.kind()))]
    pub async fn create_item(&self, item: NewInventoryItem) -> Result<InventoryItem> {
        if item.capacity == 0 {
            return Err(BookingError::Validation(
                "Capacity must be greater than zero".to_string(),
            ));
        }
        let item = self.store.create_item(item).await?;
        tracing::info!(item = %item.key(), capacity = item.initial_capacity, "Inventory item created");
        Ok(item)
    }

    /// Adds seats to a vehicle's seat map.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no such vehicle
    /// - `Store(Conflict)`: a label already exists on the vehicle
    #[tracing::instrument(skip(self, seats), fields(count = seats.len()))]
    pub async fn add_seats(&self, vehicle: VehicleRef, seats: Vec<SeatSpec>) -> Result<Vec<Seat>> {
        self.load_vehicle(vehicle).await?;
        let seats = self.store.add_seats(vehicle, seats).await?;
        tracing::debug!(added = seats.len(), "Seats added");
        Ok(seats)
    }

    /// Generates and adds the standard seat layout for a vehicle, one seat per unit of
    /// capacity.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no such vehicle
    /// - `Store(Conflict)`: the vehicle already has seats with the same labels
    pub async fn seed_vehicle_seats(&self, vehicle: VehicleRef) -> Result<Vec<Seat>> {
        let item = self.load_vehicle(vehicle).await?;
        let specs = seat_layout::layout(vehicle.vehicle_type, item.initial_capacity);
        self.add_seats(vehicle, specs).await
    }

    /// The seat map of a vehicle with booked and available totals.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no such vehicle
    /// - `Store`: the query failed
    #[tracing::instrument(skip(self))]
    pub async fn list_seats(&self, vehicle: VehicleRef) -> Result<SeatMapView> {
        self.load_vehicle(vehicle).await?;
        let seats = self.store.list_seats(vehicle).await?;
        Ok(SeatMapView::new(vehicle, seats))
    }

    /// Cheapest fare per departure day for a route over one month.
    ///
    /// # Errors
    ///
    /// - `Validation`: `kind` is a room, or origin/destination is blank
    /// - `Store`: the query failed
    #[tracing::instrument(skip(self))]
    pub async fn fare_calendar(
        &self,
        kind: ItemKind,
        origin: &str,
        destination: &str,
        month: CalendarMonth,
    ) -> Result<Vec<FareDay>> {
        if kind.vehicle_type().is_none() {
            return Err(BookingError::Validation(format!(
                "A {kind} has no route to build a fare calendar for"
            )));
        }
        let (origin, destination) = (origin.trim(), destination.trim());
        if origin.is_empty() || destination.is_empty() {
            return Err(BookingError::Validation(
                "Origin and destination are required".to_string(),
            ));
        }

        let (from, until) = month.range();
        let items = self
            .store
            .items_on_route(kind, origin.to_string(), destination.to_string(), from, until)
            .await?;
        let days = fare_calendar::summarize(&items);
        tracing::debug!(items = items.len(), days = days.len(), "Fare calendar built");
        Ok(days)
    }

    // ========================================================================
    // Booking queries
    // ========================================================================

    /// Loads a booking owned by `caller`.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no such booking
    /// - `Unauthorized`: owned by someone else
    #[tracing::instrument(skip(self))]
    pub async fn get_booking(&self, booking_id: BookingId, caller: UserId) -> Result<Booking> {
        let booking = self
            .store
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::not_found("booking", booking_id))?;
        if booking.user_id != caller {
            tracing::warn!("Booking requested by a user who does not own it");
            return Err(BookingError::Unauthorized {
                booking_id,
                user_id: caller,
            });
        }
        Ok(booking)
    }

    /// Looks a booking up by reservation code, ignoring case and surrounding spaces.
    ///
    /// # Errors
    ///
    /// - `Validation`: not a well-formed code
    /// - `NotFound`: no booking carries the code
    #[tracing::instrument(skip(self))]
    pub async fn find_by_code(&self, code: &str) -> Result<Booking> {
        let code = ReservationCode::parse(code)?;
        self.store
            .find_by_code(code.clone())
            .await?
            .ok_or_else(|| BookingError::not_found("reservation code", code))
    }

    /// A user's bookings, newest first.
    ///
    /// # Errors
    ///
    /// - `Store`: the query failed
    pub async fn bookings_for_user(&self, user: UserId) -> Result<Vec<Booking>> {
        Ok(self.store.bookings_for_user(user).await?)
    }
}
