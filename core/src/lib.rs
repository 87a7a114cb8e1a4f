//! # Wayfare Core
//!
//! Domain types, ledger abstractions and the booking lifecycle for the Wayfare
//! travel booking engine (flights, trains, buses and hotel rooms).
//!
//! ## Core Concepts
//!
//! - **Capacity Ledger**: per-item counter of unsold units with an atomic conditional
//!   decrement ([`store::CapacityLedger`])
//! - **Seat Map**: per-vehicle seats with booked flags, reconciled best-effort with the
//!   capacity ledger ([`store::SeatMap`])
//! - **Booking Ledger**: the unified record of bookings and their status
//!   ([`store::BookingLedger`])
//! - **Lifecycle**: `Pending → Confirmed → Cancelled` transitions
//!   ([`lifecycle::BookingLifecycle`])
//! - **Environment**: injected dependencies such as the [`environment::Clock`]
//!
//! The aggregate capacity counter is authoritative. Seat selection never decides whether
//! a booking succeeds.
//!
//! ## Example
//!
//! ```ignore
//! use wayfare_core::store::{BookingStore, ReserveOutcome};
//!
//! async fn hold(store: &dyn BookingStore, item: ItemKey) -> Result<bool, StoreError> {
//!     let mut tx = store.begin().await?;
//!     let outcome = tx.try_reserve(item, 2).await?;
//!     tx.commit().await?;
//!     Ok(matches!(outcome, ReserveOutcome::Reserved { .. }))
//! }
//! ```

pub mod error;
pub mod lifecycle;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
pub use error::{BookingError, StoreError};

/// Environment module - injected dependencies
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Production code uses [`SystemClock`]; tests use `FixedClock` from
    /// `wayfare-testing` so creation timestamps and "newest first" ordering are
    /// deterministic.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
