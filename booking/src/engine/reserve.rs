use super::BookingEngine;
use crate::metrics;
use crate::pricing;
use crate::request::ReservationRequest;
use std::collections::BTreeSet;
use std::time::Instant;
use wayfare_core::BookingError;
use wayfare_core::error::Result;
use wayfare_core::lifecycle::BookingEvent;
use wayfare_core::store::{BookingLedger, CapacityLedger, ReserveOutcome, SeatMap};
use wayfare_core::types::{Booking, BookingStatus};

impl BookingEngine {
    /// Reserves capacity on an item and records a `Pending` booking.
    ///
    /// Seats are best effort: requested seats that are taken, unknown or on another
    /// vehicle are skipped and the booking still succeeds with the remaining labels.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no such item
    /// - `Validation`: the request cannot be priced (see [`pricing::quote`])
    /// - `SoldOut`: not enough capacity left; nothing was written
    /// - `Store`: persistence failed; the capacity decrement was rolled back
    #[tracing::instrument(
        skip(self, request),
        fields(user_id = %request.user_id, item = %request.item)
    )]
    pub async fn reserve(&self, request: ReservationRequest) -> Result<Booking> {
        let started = Instant::now();
        let kind = request.item.kind;
        let result = self.reserve_inner(request).await;
        metrics::record_reservation(kind, &result, started.elapsed().as_secs_f64());

        match &result {
            Ok(booking) => {
                self.publish(BookingEvent::reserved(booking));
            }
            Err(e) if e.is_rejection() => tracing::warn!(error = %e, "Reservation rejected"),
            Err(e) => tracing::error!(error = %e, "Reservation failed"),
        }
        result
    }

    async fn reserve_inner(&self, request: ReservationRequest) -> Result<Booking> {
        let item = self.load_item(request.item).await?;
        let quote = pricing::quote(&item, &request)?;
        tracing::debug!(
            units = quote.units,
            total_price = %quote.total_price,
            "Reservation priced"
        );

        let mut tx = self.store.begin().await?;

        match tx.try_reserve(item.key(), quote.units).await? {
            ReserveOutcome::Reserved { remaining } => {
                tracing::debug!(units = quote.units, remaining, "Capacity reserved");
            }
            ReserveOutcome::Insufficient { available } => {
                tracing::debug!(requested = quote.units, available, "Not enough capacity");
                return Err(BookingError::SoldOut {
                    item: item.key(),
                    requested: quote.units,
                });
            }
            ReserveOutcome::UnknownItem => {
                return Err(BookingError::not_found(item.kind().as_str(), item.id));
            }
        }

        let booking_id = tx.next_booking_id().await?;

        let seat_labels = match item.key().vehicle() {
            Some(vehicle) if !request.seat_ids.is_empty() => {
                let requested: BTreeSet<_> = request.seat_ids.iter().copied().collect();
                let labels = tx
                    .allocate_seats(vehicle, request.seat_ids, booking_id)
                    .await?;
                if labels.len() < requested.len() {
                    tracing::debug!(
                        requested = requested.len(),
                        allocated = labels.len(),
                        "Some requested seats were unavailable"
                    );
                }
                labels
            }
            _ => Vec::new(),
        };

        let booking = Booking {
            id: booking_id,
            user_id: request.user_id,
            item: item.key(),
            passenger_names: quote.passenger_names,
            guest_count: quote.guest_count,
            fare_class: quote.fare_class,
            stay: quote.stay,
            status: BookingStatus::Pending,
            total_price: quote.total_price,
            code: None,
            seat_labels,
            created_at: self.clock.now(),
        };
        tx.insert_booking(booking.clone()).await?;
        tx.commit().await?;

        tracing::info!(
            booking_id = %booking.id,
            units = quote.units,
            seats = booking.seat_labels.len(),
            "Booking reserved"
        );
        Ok(booking)
    }
}
