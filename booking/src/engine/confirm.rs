use super::BookingEngine;
use crate::metrics;
use wayfare_core::BookingError;
use wayfare_core::error::Result;
use wayfare_core::lifecycle::{BookingCommand, BookingLifecycle};
use wayfare_core::store::BookingLedger;
use wayfare_core::types::{Booking, BookingId, UserId};

impl BookingEngine {
    /// Confirms a pending booking and issues its reservation code.
    ///
    /// Payment is not modelled; confirmation succeeds whenever the preconditions hold.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no such booking
    /// - `Unauthorized`: `caller` does not own the booking
    /// - `InvalidState`: the booking is not `Pending`
    /// - `Store`: persistence failed; nothing changed
    #[tracing::instrument(skip(self))]
    pub async fn confirm(&self, booking_id: BookingId, caller: UserId) -> Result<Booking> {
        let mut tx = self.store.begin().await?;
        let mut booking = tx
            .lock_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::not_found("booking", booking_id))?;

        if let Err(e) = BookingLifecycle::validate_confirm(&booking, caller) {
            tracing::warn!(error = %e, "Confirmation rejected");
            return Err(e);
        }

        let code = self.codes.issue(tx.as_mut()).await?;
        let event = BookingLifecycle::handle(
            &mut booking,
            BookingCommand::Confirm { caller, code },
            self.clock.now(),
        )?;

        tx.update_booking(booking.clone()).await?;
        tx.commit().await?;

        tracing::info!(code = ?booking.code.as_ref().map(ToString::to_string), "Booking confirmed");
        metrics::record_confirmation(booking.item.kind);
        self.publish(event);
        Ok(booking)
    }
}
