//! Given-When-Then testing for the booking lifecycle state machine.

#![allow(clippy::module_name_repetitions)] // LifecycleTest is the natural name

use chrono::{DateTime, Utc};
use wayfare_core::BookingError;
use wayfare_core::lifecycle::{BookingCommand, BookingEvent, BookingLifecycle};
use wayfare_core::types::Booking;

/// Type alias for booking assertion functions
type BookingAssertion = Box<dyn FnOnce(&Booking)>;

/// Type alias for outcome assertion functions
type OutcomeAssertion = Box<dyn FnOnce(&Result<BookingEvent, BookingError>)>;

/// Fluent API for testing lifecycle transitions with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use wayfare_testing::LifecycleTest;
///
/// LifecycleTest::new()
///     .given_booking(pending)
///     .when_command(BookingCommand::Cancel { caller: owner })
///     .then_booking(|booking| assert_eq!(booking.status, BookingStatus::Cancelled))
///     .then_event(|event| assert_eq!(event.name(), "Cancelled"))
///     .run();
/// ```
pub struct LifecycleTest {
    at: DateTime<Utc>,
    initial_booking: Option<Booking>,
    command: Option<BookingCommand>,
    booking_assertions: Vec<BookingAssertion>,
    outcome_assertions: Vec<OutcomeAssertion>,
}

impl Default for LifecycleTest {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleTest {
    /// Create a new lifecycle test at the default test time
    #[must_use]
    pub fn new() -> Self {
        Self {
            at: crate::mocks::test_time(),
            initial_booking: None,
            command: None,
            booking_assertions: Vec::new(),
            outcome_assertions: Vec::new(),
        }
    }

    /// Set the time the command is handled at
    #[must_use]
    pub const fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = at;
        self
    }

    /// Set the booking before the command (Given)
    #[must_use]
    pub fn given_booking(mut self, booking: Booking) -> Self {
        self.initial_booking = Some(booking);
        self
    }

    /// Set the command to test (When)
    #[must_use]
    pub fn when_command(mut self, command: BookingCommand) -> Self {
        self.command = Some(command);
        self
    }

    /// Add an assertion about the booking after the command (Then)
    #[must_use]
    pub fn then_booking<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&Booking) + 'static,
    {
        self.booking_assertions.push(Box::new(assertion));
        self
    }

    /// Assert the command succeeded and inspect the emitted event (Then)
    #[must_use]
    #[allow(clippy::panic)] // Test assertion
    pub fn then_event<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&BookingEvent) + 'static,
    {
        self.outcome_assertions.push(Box::new(move |outcome| match outcome {
            Ok(event) => assertion(event),
            Err(error) => panic!("Expected an event, but the command was rejected: {error}"),
        }));
        self
    }

    /// Assert the command was rejected and inspect the error (Then)
    #[must_use]
    #[allow(clippy::panic)] // Test assertion
    pub fn then_error<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&BookingError) + 'static,
    {
        self.outcome_assertions.push(Box::new(move |outcome| match outcome {
            Ok(event) => panic!("Expected a rejection, but got event {event:?}"),
            Err(error) => assertion(error),
        }));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if the booking or command is not set, or if any assertion fails.
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut booking = self
            .initial_booking
            .expect("Initial booking must be set with given_booking()");

        let command = self
            .command
            .expect("Command must be set with when_command()");

        let outcome = BookingLifecycle::handle(&mut booking, command, self.at);

        for assertion in self.booking_assertions {
            assertion(&booking);
        }

        for assertion in self.outcome_assertions {
            assertion(&outcome);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures::pending_booking;
    use wayfare_core::types::{
        BookingId, BookingStatus, ItemId, ItemKey, ItemKind, ReservationCode, UserId,
    };

    fn flight_booking() -> Booking {
        pending_booking(
            BookingId::new(5),
            UserId::new(1),
            ItemKey::new(ItemKind::Flight, ItemId::new(2)),
            3,
        )
    }

    #[test]
    fn confirm_then_cancel_keeps_the_code() {
        let code = ReservationCode::parse("QWER5678").unwrap();
        let mut confirmed = flight_booking();
        confirmed.status = BookingStatus::Confirmed;
        confirmed.code = Some(code.clone());

        LifecycleTest::new()
            .given_booking(confirmed)
            .when_command(BookingCommand::Cancel {
                caller: UserId::new(1),
            })
            .then_booking(move |booking| {
                assert_eq!(booking.status, BookingStatus::Cancelled);
                assert_eq!(booking.code, Some(code));
            })
            .then_event(|event| {
                assert!(matches!(event, BookingEvent::Cancelled { units: 3, .. }));
            })
            .run();
    }

    #[test]
    fn second_confirm_is_rejected() {
        let mut confirmed = flight_booking();
        confirmed.status = BookingStatus::Confirmed;

        LifecycleTest::new()
            .given_booking(confirmed)
            .when_command(BookingCommand::Confirm {
                caller: UserId::new(1),
                code: ReservationCode::parse("ZZZZ0000").unwrap(),
            })
            .then_error(|error| assert_eq!(error.code(), "INVALID_STATE"))
            .then_booking(|booking| {
                assert_ne!(
                    booking.code.as_ref().map(ReservationCode::as_str),
                    Some("ZZZZ0000")
                );
            })
            .run();
    }
}
