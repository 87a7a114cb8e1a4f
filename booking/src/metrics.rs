//! Business metrics for the booking engine.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `wayfare_reservations_total{kind,outcome}` - Reservation attempts by item kind and outcome
//! - `wayfare_confirmations_total{kind}` - Bookings confirmed
//! - `wayfare_cancellations_total{kind}` - Bookings cancelled
//! - `wayfare_units_reserved_total{kind}` - Capacity units taken by successful reservations
//! - `wayfare_units_released_total{kind}` - Capacity units returned by cancellations
//!
//! ## Gauges
//! - `wayfare_pending_bookings` - Bookings created but not yet confirmed or cancelled
//!
//! ## Histograms
//! - `wayfare_reservation_duration_seconds` - Time spent in the reservation workflow
//!
//! The exporter is chosen by the host process; without one the calls are no-ops.

use metrics::{describe_counter, describe_gauge, describe_histogram};
use wayfare_core::BookingError;
use wayfare_core::types::{Booking, BookingStatus, ItemKind};

/// Initialize and register all booking metric descriptions.
///
/// Call once at startup, before any metrics are recorded.
pub fn register_booking_metrics() {
    describe_counter!(
        "wayfare_reservations_total",
        "Reservation attempts by item kind and outcome (reserved, sold_out, rejected, failed)"
    );
    describe_counter!(
        "wayfare_units_reserved_total",
        "Capacity units taken by successful reservations"
    );
    describe_histogram!(
        "wayfare_reservation_duration_seconds",
        "Time spent in the reservation workflow"
    );
    describe_gauge!(
        "wayfare_pending_bookings",
        "Bookings created but not yet confirmed or cancelled"
    );

    describe_counter!("wayfare_confirmations_total", "Bookings confirmed");
    describe_counter!("wayfare_cancellations_total", "Bookings cancelled");
    describe_counter!(
        "wayfare_units_released_total",
        "Capacity units returned by cancellations"
    );

    tracing::info!("Booking metrics registered");
}

/// Outcome label of a reservation attempt
#[must_use]
pub const fn reservation_outcome<T>(result: &Result<T, BookingError>) -> &'static str {
    match result {
        Ok(_) => "reserved",
        Err(BookingError::SoldOut { .. }) => "sold_out",
        Err(BookingError::Store(_)) => "failed",
        Err(_) => "rejected",
    }
}

/// Record a reservation attempt.
///
/// # Arguments
///
/// * `kind` - Item kind
/// * `result` - The booking created, or the error the attempt ended with
/// * `duration_secs` - Time spent in the workflow
pub fn record_reservation(
    kind: ItemKind,
    result: &Result<Booking, BookingError>,
    duration_secs: f64,
) {
    let outcome = reservation_outcome(result);
    metrics::counter!("wayfare_reservations_total", "kind" => kind.as_str(), "outcome" => outcome)
        .increment(1);
    metrics::histogram!("wayfare_reservation_duration_seconds").record(duration_secs);
    if let Ok(booking) = result {
        metrics::counter!("wayfare_units_reserved_total", "kind" => kind.as_str())
            .increment(u64::from(booking.reserved_units()));
        metrics::gauge!("wayfare_pending_bookings").increment(1.0);
    }
    tracing::debug!(kind = %kind, outcome, duration_secs, "Recorded reservation metric");
}

/// Record a confirmation.
pub fn record_confirmation(kind: ItemKind) {
    metrics::counter!("wayfare_confirmations_total", "kind" => kind.as_str()).increment(1);
    metrics::gauge!("wayfare_pending_bookings").decrement(1.0);
}

/// Record a cancellation.
///
/// # Arguments
///
/// * `kind` - Item kind
/// * `units` - Capacity units returned
/// * `previous` - Status the booking was cancelled from
pub fn record_cancellation(kind: ItemKind, units: u32, previous: BookingStatus) {
    metrics::counter!("wayfare_cancellations_total", "kind" => kind.as_str()).increment(1);
    metrics::counter!("wayfare_units_released_total", "kind" => kind.as_str())
        .increment(u64::from(units));
    if previous == BookingStatus::Pending {
        metrics::gauge!("wayfare_pending_bookings").decrement(1.0);
    }
    tracing::debug!(kind = %kind, units, "Recorded cancellation metric");
}
