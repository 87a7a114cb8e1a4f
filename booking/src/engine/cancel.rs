use super::BookingEngine;
use crate::metrics;
use wayfare_core::BookingError;
use wayfare_core::error::Result;
use wayfare_core::lifecycle::{BookingCommand, BookingLifecycle};
use wayfare_core::store::{BookingLedger, CapacityLedger, SeatMap};
use wayfare_core::types::{Booking, BookingId, UserId};

impl BookingEngine {
    /// Cancels a pending or confirmed booking, returning its capacity and seats.
    ///
    /// The booking row stays locked for the whole transaction, so of two concurrent
    /// cancellations only the first releases anything; the second sees `Cancelled`.
    /// A confirmed booking keeps its reservation code.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no such booking
    /// - `Unauthorized`: `caller` does not own the booking
    /// - `InvalidState`: already cancelled; nothing is released twice
    /// - `Store`: persistence failed; nothing changed
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, booking_id: BookingId, caller: UserId) -> Result<Booking> {
        let mut tx = self.store.begin().await?;
        let mut booking = tx
            .lock_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::not_found("booking", booking_id))?;

        let previous = booking.status;
        let event = match BookingLifecycle::handle(
            &mut booking,
            BookingCommand::Cancel { caller },
            self.clock.now(),
        ) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Cancellation rejected");
                return Err(e);
            }
        };

        let units = booking.reserved_units();
        tx.release(booking.item, units).await?;
        let freed = tx.release_seats(booking.id).await?;
        tracing::debug!(units, seats = freed, "Capacity and seats released");

        tx.update_booking(booking.clone()).await?;
        tx.commit().await?;

        tracing::info!(previous = %previous, "Booking cancelled");
        metrics::record_cancellation(booking.item.kind, units, previous);
        self.publish(event);
        Ok(booking)
    }
}
