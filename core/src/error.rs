//! Error taxonomy for the booking engine.
//!
//! Two layers:
//!
//! - [`StoreError`]: failures of the persistence layer (database, serialization,
//!   uniqueness conflicts). Returned by every [`crate::store`] trait method.
//! - [`BookingError`]: the typed outcomes of engine operations. Business rejections
//!   (`SoldOut`, `InvalidState`, ...) are expected results, not faults; none of them
//!   leave a partial mutation behind.

use crate::types::{BookingId, BookingStatus, ItemKey, UserId};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Errors returned by booking engine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Not enough capacity left on the item.
    #[error("Sold out: {item} cannot hold {requested} more")]
    SoldOut {
        /// The item that ran out
        item: ItemKey,
        /// Units requested
        requested: u32,
    },

    /// The booking is not in a status that permits the action.
    #[error("Booking {booking_id} is {status} and cannot be {action}")]
    InvalidState {
        /// The booking
        booking_id: BookingId,
        /// Its current status
        status: BookingStatus,
        /// Past participle of the rejected action ("confirmed", "cancelled")
        action: &'static str,
    },

    /// The caller does not own the booking.
    #[error("User {user_id} does not own booking {booking_id}")]
    Unauthorized {
        /// The booking
        booking_id: BookingId,
        /// The caller
        user_id: UserId,
    },

    /// A referenced entity does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of entity ("booking", "flight", ...)
        resource: &'static str,
        /// Its identifier as given
        id: String,
    },

    /// Request rejected by input validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The user already reviewed this item.
    #[error("User {user_id} has already reviewed {item}")]
    AlreadyReviewed {
        /// The reviewer
        user_id: UserId,
        /// The reviewed item
        item: ItemKey,
    },

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookingError {
    /// Shorthand for a `NotFound` error
    #[must_use]
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code for presentation layers
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SoldOut { .. } => "SOLD_OUT",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::AlreadyReviewed { .. } => "ALREADY_REVIEWED",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Whether this is a business rejection rather than an infrastructure fault
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

/// Result type for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemId, ItemKind};

    #[test]
    fn codes_are_stable() {
        let sold_out = BookingError::SoldOut {
            item: ItemKey::new(ItemKind::Bus, ItemId::new(3)),
            requested: 2,
        };
        assert_eq!(sold_out.code(), "SOLD_OUT");
        assert_eq!(sold_out.to_string(), "Sold out: bus 3 cannot hold 2 more");
        assert!(sold_out.is_rejection());

        let store: BookingError = StoreError::Database("down".to_string()).into();
        assert_eq!(store.code(), "STORE_ERROR");
        assert!(!store.is_rejection());
    }

    #[test]
    fn invalid_state_message_names_the_action() {
        let err = BookingError::InvalidState {
            booking_id: BookingId::new(9),
            status: BookingStatus::Cancelled,
            action: "cancelled",
        };
        assert_eq!(err.to_string(), "Booking 9 is Cancelled and cannot be cancelled");
    }
}
