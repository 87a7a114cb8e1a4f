//! Booking lifecycle state machine.
//!
//! ```text
//!            confirm             cancel
//! Pending ───────────▶ Confirmed ───────▶ Cancelled
//!    │                                       ▲
//!    └───────────────── cancel ──────────────┘
//! ```
//!
//! Commands are validated against the current booking, turned into a [`BookingEvent`],
//! and the event is applied. Validation never mutates; a rejected command leaves the
//! booking untouched. The workflows in `wayfare-booking` load the booking under a row
//! lock, run it through [`BookingLifecycle::handle`] and persist the result.

use crate::error::{BookingError, Result};
use crate::types::{
    Booking, BookingId, BookingStatus, ItemKey, Money, ReservationCode, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Commands
// ============================================================================

/// Requests to move an existing booking through its lifecycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingCommand {
    /// Finalise a pending booking with a freshly minted reservation code
    Confirm {
        /// User issuing the command
        caller: UserId,
        /// Code already checked for uniqueness against the ledger
        code: ReservationCode,
    },
    /// Cancel a pending or confirmed booking
    Cancel {
        /// User issuing the command
        caller: UserId,
    },
}

impl BookingCommand {
    /// The user issuing the command
    #[must_use]
    pub const fn caller(&self) -> UserId {
        match self {
            Self::Confirm { caller, .. } | Self::Cancel { caller } => *caller,
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// Facts published after a lifecycle change commits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingEvent {
    /// A booking was created and its capacity held
    Reserved {
        /// Booking ID
        booking_id: BookingId,
        /// Owner
        user_id: UserId,
        /// Booked item
        item: ItemKey,
        /// Capacity units held
        units: u32,
        /// Seats allocated
        seat_labels: Vec<String>,
        /// Price charged
        total_price: Money,
        /// When the booking was created
        at: DateTime<Utc>,
    },
    /// A booking was confirmed and issued a code
    Confirmed {
        /// Booking ID
        booking_id: BookingId,
        /// Owner
        user_id: UserId,
        /// Booked item
        item: ItemKey,
        /// Issued reservation code
        code: ReservationCode,
        /// When the booking was confirmed
        at: DateTime<Utc>,
    },
    /// A booking was cancelled and its capacity returned
    Cancelled {
        /// Booking ID
        booking_id: BookingId,
        /// Owner
        user_id: UserId,
        /// Booked item
        item: ItemKey,
        /// Capacity units returned
        units: u32,
        /// Status the booking was cancelled from
        previous_status: BookingStatus,
        /// When the booking was cancelled
        at: DateTime<Utc>,
    },
}

impl BookingEvent {
    /// The booking the event concerns
    #[must_use]
    pub const fn booking_id(&self) -> BookingId {
        match self {
            Self::Reserved { booking_id, .. }
            | Self::Confirmed { booking_id, .. }
            | Self::Cancelled { booking_id, .. } => *booking_id,
        }
    }

    /// Event name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Reserved { .. } => "Reserved",
            Self::Confirmed { .. } => "Confirmed",
            Self::Cancelled { .. } => "Cancelled",
        }
    }

    /// The `Reserved` event describing a freshly inserted booking
    #[must_use]
    pub fn reserved(booking: &Booking) -> Self {
        Self::Reserved {
            booking_id: booking.id,
            user_id: booking.user_id,
            item: booking.item,
            units: booking.reserved_units(),
            seat_labels: booking.seat_labels.clone(),
            total_price: booking.total_price,
            at: booking.created_at,
        }
    }
}

// ============================================================================
// State machine
// ============================================================================

/// Validation and transition rules for existing bookings.
#[derive(Clone, Copy, Debug, Default)]
pub struct BookingLifecycle;

impl BookingLifecycle {
    /// Creates a new `BookingLifecycle`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a confirmation: caller owns the booking and it is still pending.
    ///
    /// # Errors
    ///
    /// - `Unauthorized`: caller is not the owner
    /// - `InvalidState`: booking is not `Pending`
    pub fn validate_confirm(booking: &Booking, caller: UserId) -> Result<()> {
        Self::validate_owner(booking, caller)?;

        if booking.status != BookingStatus::Pending {
            return Err(BookingError::InvalidState {
                booking_id: booking.id,
                status: booking.status,
                action: "confirmed",
            });
        }

        Ok(())
    }

    /// Validates a cancellation: caller owns the booking and it is not cancelled yet.
    ///
    /// # Errors
    ///
    /// - `Unauthorized`: caller is not the owner
    /// - `InvalidState`: booking is already `Cancelled`
    pub fn validate_cancel(booking: &Booking, caller: UserId) -> Result<()> {
        Self::validate_owner(booking, caller)?;

        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::InvalidState {
                booking_id: booking.id,
                status: booking.status,
                action: "cancelled",
            });
        }

        Ok(())
    }

    fn validate_owner(booking: &Booking, caller: UserId) -> Result<()> {
        if booking.user_id != caller {
            return Err(BookingError::Unauthorized {
                booking_id: booking.id,
                user_id: caller,
            });
        }
        Ok(())
    }

    /// Validates `command` against `booking` and returns the resulting event.
    ///
    /// # Errors
    ///
    /// Whatever the matching `validate_*` function rejects.
    pub fn decide(
        booking: &Booking,
        command: BookingCommand,
        at: DateTime<Utc>,
    ) -> Result<BookingEvent> {
        match command {
            BookingCommand::Confirm { caller, code } => {
                Self::validate_confirm(booking, caller)?;
                Ok(BookingEvent::Confirmed {
                    booking_id: booking.id,
                    user_id: booking.user_id,
                    item: booking.item,
                    code,
                    at,
                })
            }
            BookingCommand::Cancel { caller } => {
                Self::validate_cancel(booking, caller)?;
                Ok(BookingEvent::Cancelled {
                    booking_id: booking.id,
                    user_id: booking.user_id,
                    item: booking.item,
                    units: booking.reserved_units(),
                    previous_status: booking.status,
                    at,
                })
            }
        }
    }

    /// Applies an event to the booking it concerns.
    ///
    /// Events for other bookings and `Reserved` (which creates rather than changes a
    /// booking) are ignored.
    pub fn apply_event(booking: &mut Booking, event: &BookingEvent) {
        if event.booking_id() != booking.id {
            return;
        }

        match event {
            BookingEvent::Reserved { .. } => {}
            BookingEvent::Confirmed { code, .. } => {
                booking.status = BookingStatus::Confirmed;
                booking.code = Some(code.clone());
            }
            BookingEvent::Cancelled { .. } => {
                // The code, if any, stays so the PNR remains verifiable
                booking.status = BookingStatus::Cancelled;
            }
        }
    }

    /// Decides and applies `command` in one step.
    ///
    /// # Errors
    ///
    /// Whatever [`Self::decide`] rejects; `booking` is unchanged on error.
    pub fn handle(
        booking: &mut Booking,
        command: BookingCommand,
        at: DateTime<Utc>,
    ) -> Result<BookingEvent> {
        let event = Self::decide(booking, command, at)?;
        Self::apply_event(booking, &event);
        Ok(event)
    }
}
