//! # Wayfare Booking
//!
//! Booking and inventory engine for flights, trains, buses and hotel rooms.
//!
//! The hard part is inventory concurrency: many users reserving the same finite seats
//! and rooms at once. The engine guarantees that
//!
//! - no item is ever oversold: capacity is taken with an atomic conditional decrement
//! - seats are allocated best effort and never held by two active bookings
//! - cancelling returns exactly the capacity and seats the booking held, once
//! - every failure after the decrement rolls it back
//!
//! # Architecture
//!
//! ```text
//!              ┌──────────────────────────────────────────────┐
//!  request ──▶ │                BookingEngine                 │ ──▶ BookingEvent
//!              │ pricing · pnr · lifecycle · search · fares   │     (broadcast)
//!              └──────────────────────────────────────────────┘
//!                                     │ one transaction per workflow
//!                                     ▼
//!              ┌──────────────────────────────────────────────┐
//!              │ Capacity Ledger · Seat Map · Booking Ledger  │
//!              │ PostgresBookingStore | InMemoryBookingStore  │
//!              └──────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let engine = BookingEngine::new(store, Arc::new(SystemClock), &config.engine);
//!
//! let booking = engine
//!     .reserve(ReservationRequest::new(user, flight.key()).passengers(["Asha Rao"]))
//!     .await?;
//! let booking = engine.confirm(booking.id, user).await?;
//! println!("PNR {}", booking.code.unwrap());
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod fare_calendar;
pub mod metrics;
pub mod pnr;
pub mod pricing;
pub mod request;
pub mod search;
pub mod seat_layout;

pub use config::{Config, EngineConfig, PostgresConfig};
pub use engine::BookingEngine;
pub use fare_calendar::{CalendarMonth, FareDay};
pub use pnr::CodeGenerator;
pub use pricing::Quote;
pub use request::ReservationRequest;
pub use search::{HotelSearch, SortBy, TransportResults, TransportSearch};
