//! In-memory implementation of the booking store.
//!
//! All state lives behind one `tokio::sync::Mutex`. A transaction owns the guard for its
//! whole lifetime, which serializes transactions the way row locks serialize competing
//! writers in `PostgreSQL`. Every mutation made through a transaction is recorded in an
//! undo journal; dropping the transaction without committing replays the journal in
//! reverse.
//!
//! Do not call [`BookingStore`] methods on the same store while holding one of its
//! transactions: they wait for the same mutex.

use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::future::ready;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use wayfare_core::StoreError;
use wayfare_core::store::{
    BookingLedger, BookingStore, CapacityLedger, ReserveOutcome, SeatMap, StoreFuture,
    StoreTransaction,
};
use wayfare_core::types::{
    Booking, BookingId, InventoryItem, ItemDetails, ItemId, ItemKey, ItemKind, NewInventoryItem,
    NewReview, ReservationCode, Review, ReviewId, Seat, SeatId, SeatSpec, UserId, VehicleRef,
};

#[derive(Debug, Default)]
struct StoreState {
    items: BTreeMap<ItemKey, InventoryItem>,
    seats: BTreeMap<SeatId, Seat>,
    bookings: BTreeMap<BookingId, Booking>,
    reviews: Vec<Review>,
    last_item_id: i64,
    last_seat_id: i64,
    last_booking_id: i64,
    last_review_id: i64,
    fail_next_booking_write: bool,
}

impl StoreState {
    fn code_taken(&self, code: &ReservationCode, except: BookingId) -> bool {
        self.bookings
            .values()
            .any(|b| b.id != except && b.code.as_ref() == Some(code))
    }

    fn take_injected_failure(&mut self) -> Result<(), StoreError> {
        if self.fail_next_booking_write {
            self.fail_next_booking_write = false;
            return Err(StoreError::Database("injected booking write failure".to_string()));
        }
        Ok(())
    }
}

/// In-memory booking store for tests and the demo binary.
///
/// Cloning shares the underlying state.
#[derive(Clone, Debug, Default)]
pub struct InMemoryBookingStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryBookingStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next booking insert or update fail with `StoreError::Database`.
    ///
    /// Used to exercise rollback after the capacity decrement.
    pub async fn fail_next_booking_write(&self) {
        self.state.lock().await.fail_next_booking_write = true;
    }

    /// Every booking in the ledger, ordered by ID
    pub async fn all_bookings(&self) -> Vec<Booking> {
        self.state.lock().await.bookings.values().cloned().collect()
    }

    /// Current available capacity of an item
    pub async fn available_capacity(&self, key: ItemKey) -> Option<u32> {
        self.state
            .lock()
            .await
            .items
            .get(&key)
            .map(|item| item.available_capacity)
    }
}

#[derive(Debug)]
enum Undo {
    Capacity { item: ItemKey, available: u32 },
    Seat(Seat),
    Booking { id: BookingId, previous: Option<Booking> },
}

/// Transaction over an [`InMemoryBookingStore`].
#[derive(Debug)]
pub struct InMemoryTransaction {
    state: OwnedMutexGuard<StoreState>,
    journal: Vec<Undo>,
}

impl InMemoryTransaction {
    fn write_new_booking(&mut self, booking: Booking) -> Result<(), StoreError> {
        self.state.take_injected_failure()?;
        if self.state.bookings.contains_key(&booking.id) {
            return Err(StoreError::Conflict(format!(
                "Booking {} already exists",
                booking.id
            )));
        }
        self.ensure_code_free(&booking)?;
        self.journal.push(Undo::Booking {
            id: booking.id,
            previous: None,
        });
        self.state.bookings.insert(booking.id, booking);
        Ok(())
    }

    fn overwrite_booking(&mut self, booking: Booking) -> Result<(), StoreError> {
        self.state.take_injected_failure()?;
        self.ensure_code_free(&booking)?;
        let Some(current) = self.state.bookings.get_mut(&booking.id) else {
            return Err(StoreError::Database(format!(
                "Failed to update booking {}: no such row",
                booking.id
            )));
        };
        let previous = std::mem::replace(current, booking);
        self.journal.push(Undo::Booking {
            id: previous.id,
            previous: Some(previous),
        });
        Ok(())
    }

    fn ensure_code_free(&self, booking: &Booking) -> Result<(), StoreError> {
        match &booking.code {
            Some(code) if self.state.code_taken(code, booking.id) => Err(StoreError::Conflict(
                format!("Reservation code {code} already used"),
            )),
            _ => Ok(()),
        }
    }

    fn rollback(&mut self) {
        while let Some(undo) = self.journal.pop() {
            match undo {
                Undo::Capacity { item, available } => {
                    if let Some(entry) = self.state.items.get_mut(&item) {
                        entry.available_capacity = available;
                    }
                }
                Undo::Seat(seat) => {
                    self.state.seats.insert(seat.id, seat);
                }
                Undo::Booking { id, previous } => match previous {
                    Some(booking) => {
                        self.state.bookings.insert(id, booking);
                    }
                    None => {
                        self.state.bookings.remove(&id);
                    }
                },
            }
        }
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if !self.journal.is_empty() {
            tracing::debug!(changes = self.journal.len(), "Rolling back in-memory transaction");
            self.rollback();
        }
    }
}

impl CapacityLedger for InMemoryTransaction {
    fn try_reserve(&mut self, item: ItemKey, quantity: u32) -> StoreFuture<'_, ReserveOutcome> {
        let outcome = match self.state.items.get_mut(&item) {
            None => ReserveOutcome::UnknownItem,
            Some(entry) if entry.available_capacity >= quantity => {
                self.journal.push(Undo::Capacity {
                    item,
                    available: entry.available_capacity,
                });
                entry.available_capacity -= quantity;
                ReserveOutcome::Reserved {
                    remaining: entry.available_capacity,
                }
            }
            Some(entry) => ReserveOutcome::Insufficient {
                available: entry.available_capacity,
            },
        };
        Box::pin(ready(Ok(outcome)))
    }

    fn release(&mut self, item: ItemKey, quantity: u32) -> StoreFuture<'_, ()> {
        if let Some(entry) = self.state.items.get_mut(&item) {
            self.journal.push(Undo::Capacity {
                item,
                available: entry.available_capacity,
            });
            entry.available_capacity = entry
                .available_capacity
                .saturating_add(quantity)
                .min(entry.initial_capacity);
        }
        Box::pin(ready(Ok(())))
    }
}

impl SeatMap for InMemoryTransaction {
    fn allocate_seats(
        &mut self,
        vehicle: VehicleRef,
        seat_ids: Vec<SeatId>,
        booking: BookingId,
    ) -> StoreFuture<'_, Vec<String>> {
        let requested: BTreeSet<SeatId> = seat_ids.into_iter().collect();
        let mut allocated = Vec::new();

        for id in requested {
            let Some(seat) = self.state.seats.get_mut(&id) else {
                continue;
            };
            if seat.vehicle != vehicle || seat.is_booked {
                continue;
            }
            self.journal.push(Undo::Seat(seat.clone()));
            seat.is_booked = true;
            seat.booking_id = Some(booking);
            allocated.push((seat.row, seat.col, seat.label.clone()));
        }

        allocated.sort();
        let labels = allocated.into_iter().map(|(_, _, label)| label).collect();
        Box::pin(ready(Ok(labels)))
    }

    fn release_seats(&mut self, booking: BookingId) -> StoreFuture<'_, u32> {
        let mut released = 0;
        for seat in self.state.seats.values_mut() {
            if seat.booking_id == Some(booking) {
                self.journal.push(Undo::Seat(seat.clone()));
                seat.is_booked = false;
                seat.booking_id = None;
                released += 1;
            }
        }
        Box::pin(ready(Ok(released)))
    }
}

impl BookingLedger for InMemoryTransaction {
    fn next_booking_id(&mut self) -> StoreFuture<'_, BookingId> {
        // Like a database sequence, identifiers are not reused after a rollback
        self.state.last_booking_id += 1;
        Box::pin(ready(Ok(BookingId::new(self.state.last_booking_id))))
    }

    fn insert_booking(&mut self, booking: Booking) -> StoreFuture<'_, ()> {
        let result = self.write_new_booking(booking);
        Box::pin(ready(result))
    }

    fn lock_booking(&mut self, id: BookingId) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(ready(Ok(self.state.bookings.get(&id).cloned())))
    }

    fn update_booking(&mut self, booking: Booking) -> StoreFuture<'_, ()> {
        let result = self.overwrite_booking(booking);
        Box::pin(ready(result))
    }

    fn code_exists(&mut self, code: ReservationCode) -> StoreFuture<'_, bool> {
        let taken = self
            .state
            .bookings
            .values()
            .any(|b| b.code.as_ref() == Some(&code));
        Box::pin(ready(Ok(taken)))
    }
}

impl StoreTransaction for InMemoryTransaction {
    fn commit(mut self: Box<Self>) -> StoreFuture<'static, ()> {
        self.journal.clear();
        drop(self);
        Box::pin(ready(Ok(())))
    }
}

fn newest_first(a: (DateTime<Utc>, i64), b: (DateTime<Utc>, i64)) -> std::cmp::Ordering {
    b.cmp(&a)
}

impl BookingStore for InMemoryBookingStore {
    fn begin(&self) -> StoreFuture<'_, Box<dyn StoreTransaction>> {
        Box::pin(async move {
            let state = Arc::clone(&self.state).lock_owned().await;
            let tx: Box<dyn StoreTransaction> = Box::new(InMemoryTransaction {
                state,
                journal: Vec::new(),
            });
            Ok(tx)
        })
    }

    fn create_item(&self, item: NewInventoryItem) -> StoreFuture<'_, InventoryItem> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.last_item_id += 1;
            let created = InventoryItem {
                id: ItemId::new(state.last_item_id),
                details: item.details,
                initial_capacity: item.capacity,
                available_capacity: item.capacity,
            };
            state.items.insert(created.key(), created.clone());
            Ok(created)
        })
    }

    fn get_item(&self, key: ItemKey) -> StoreFuture<'_, Option<InventoryItem>> {
        Box::pin(async move { Ok(self.state.lock().await.items.get(&key).cloned()) })
    }

    fn items_on_route(
        &self,
        kind: ItemKind,
        origin: String,
        destination: String,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreFuture<'_, Vec<InventoryItem>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let mut matching: Vec<InventoryItem> = state
                .items
                .values()
                .filter(|item| item.kind() == kind)
                .filter(|item| {
                    item.details
                        .route()
                        .is_some_and(|route| route.matches(&origin, &destination))
                })
                .filter(|item| {
                    item.details
                        .schedule()
                        .is_some_and(|s| s.departure >= from && s.departure < until)
                })
                .cloned()
                .collect();
            matching.sort_by_key(|item| (item.details.schedule().map(|s| s.departure), item.id));
            Ok(matching)
        })
    }

    fn available_on_route(
        &self,
        kind: ItemKind,
        origin: String,
        destination: String,
        departing: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> StoreFuture<'_, Vec<InventoryItem>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let mut matching: Vec<InventoryItem> = state
                .items
                .values()
                .filter(|item| item.kind() == kind && item.available_capacity > 0)
                .filter(|item| {
                    item.details
                        .route()
                        .is_some_and(|route| route.matches(&origin, &destination))
                })
                .filter(|item| {
                    let departure = item.details.schedule().map(|s| s.departure);
                    match (departing, departure) {
                        (None, _) => true,
                        (Some((from, until)), Some(departure)) => {
                            departure >= from && departure < until
                        }
                        (Some(_), None) => false,
                    }
                })
                .cloned()
                .collect();
            matching.sort_by_key(|item| (item.details.schedule().map(|s| s.departure), item.id));
            Ok(matching)
        })
    }

    fn rooms_in_city(&self, city: String, min_stars: u8) -> StoreFuture<'_, Vec<InventoryItem>> {
        Box::pin(async move {
            let needle = city.trim().to_lowercase();
            let state = self.state.lock().await;
            let mut matching: Vec<InventoryItem> = state
                .items
                .values()
                .filter(|item| match &item.details {
                    ItemDetails::Room {
                        city, star_rating, ..
                    } => *star_rating >= min_stars && city.to_lowercase().contains(&needle),
                    _ => false,
                })
                .cloned()
                .collect();
            matching.sort_by_key(|item| (Reverse(item.details.star_rating()), item.id));
            Ok(matching)
        })
    }

    fn add_seats(&self, vehicle: VehicleRef, seats: Vec<SeatSpec>) -> StoreFuture<'_, Vec<Seat>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let mut labels: BTreeSet<String> = state
                .seats
                .values()
                .filter(|seat| seat.vehicle == vehicle)
                .map(|seat| seat.label.clone())
                .collect();
            for spec in &seats {
                if !labels.insert(spec.label.clone()) {
                    return Err(StoreError::Conflict(format!(
                        "Seat {} already exists on {vehicle}",
                        spec.label
                    )));
                }
            }

            let mut created = Vec::with_capacity(seats.len());
            for spec in seats {
                state.last_seat_id += 1;
                let seat = Seat {
                    id: SeatId::new(state.last_seat_id),
                    vehicle,
                    label: spec.label,
                    row: spec.row,
                    col: spec.col,
                    seat_class: spec.seat_class,
                    is_booked: false,
                    booking_id: None,
                };
                state.seats.insert(seat.id, seat.clone());
                created.push(seat);
            }
            Ok(created)
        })
    }

    fn list_seats(&self, vehicle: VehicleRef) -> StoreFuture<'_, Vec<Seat>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let mut seats: Vec<Seat> = state
                .seats
                .values()
                .filter(|seat| seat.vehicle == vehicle)
                .cloned()
                .collect();
            seats.sort_by_key(|seat| (seat.row, seat.col, seat.id));
            Ok(seats)
        })
    }

    fn get_booking(&self, id: BookingId) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move { Ok(self.state.lock().await.bookings.get(&id).cloned()) })
    }

    fn find_by_code(&self, code: ReservationCode) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            Ok(state
                .bookings
                .values()
                .find(|b| b.code.as_ref() == Some(&code))
                .cloned())
        })
    }

    fn bookings_for_user(&self, user: UserId) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let mut bookings: Vec<Booking> = state
                .bookings
                .values()
                .filter(|b| b.user_id == user)
                .cloned()
                .collect();
            bookings.sort_by(|a, b| {
                newest_first((a.created_at, a.id.value()), (b.created_at, b.id.value()))
            });
            Ok(bookings)
        })
    }

    fn insert_review(&self, review: NewReview) -> StoreFuture<'_, Review> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if state
                .reviews
                .iter()
                .any(|r| r.user_id == review.user_id && r.item == review.item)
            {
                return Err(StoreError::Conflict(format!(
                    "User {} already reviewed {}",
                    review.user_id, review.item
                )));
            }
            state.last_review_id += 1;
            let stored = Review {
                id: ReviewId::new(state.last_review_id),
                user_id: review.user_id,
                item: review.item,
                rating: review.rating,
                comment: review.comment,
                created_at: review.created_at,
            };
            state.reviews.push(stored.clone());
            Ok(stored)
        })
    }

    fn reviews_for(&self, item: ItemKey) -> StoreFuture<'_, Vec<Review>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let mut reviews: Vec<Review> = state
                .reviews
                .iter()
                .filter(|r| r.item == item)
                .cloned()
                .collect();
            reviews.sort_by(|a, b| {
                newest_first((a.created_at, a.id.value()), (b.created_at, b.id.value()))
            });
            Ok(reviews)
        })
    }
}
