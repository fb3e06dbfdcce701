//! Engine error type.
//!
//! Every rejection the engine can produce is one variant of [`EngineError`].
//! Only [`EngineError::Timeout`] is retryable.

use crate::types::{BookingId, ProductId};
use chrono::{DateTime, NaiveTime, Utc};
use dogspa_runtime::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by engine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Referenced entity does not exist
    #[error("{resource} with id {id} not found")]
    NotFound {
        /// Entity kind ("Pet", "Booking", ...)
        resource: &'static str,
        /// Requested identifier
        id: String,
    },

    /// Caller does not own the entity
    #[error("{0}")]
    Forbidden(String),

    /// Transition not allowed from the current status
    #[error("{0}")]
    InvalidState(String),

    /// Requested start falls outside opening hours
    #[error("Requested time {requested} is outside business hours ({opens}-{closes})")]
    OutOfHours {
        /// Local time-of-day of the request
        requested: NaiveTime,
        /// Opening time (inclusive)
        opens: NaiveTime,
        /// Closing time (exclusive)
        closes: NaiveTime,
    },

    /// Slot overlaps an existing booking for the same pet
    #[error("Pet already has booking {conflicting} overlapping the requested slot")]
    Conflict {
        /// The overlapping booking
        conflicting: BookingId,
    },

    /// Not enough units to cover a cart line
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        /// First failing product, in cart order
        product_id: ProductId,
        /// Units requested
        requested: u32,
        /// Units on hand
        available: u32,
    },

    /// Malformed or out-of-range input
    #[error("{0}")]
    Validation(String),

    /// Booking cannot be completed before it starts
    #[error("Booking {booking_id} cannot be completed before {scheduled_at}")]
    TooEarly {
        /// Booking ID
        booking_id: BookingId,
        /// Scheduled start
        scheduled_at: DateTime<Utc>,
    },

    /// Exclusive access not obtained in time; nothing was changed
    #[error("Timed out after {}ms waiting for exclusive access; retry the request", .waited.as_millis())]
    Timeout {
        /// Time spent waiting
        waited: Duration,
    },
}

/// Stable classification of [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`EngineError::NotFound`]
    NotFound,
    /// See [`EngineError::Forbidden`]
    Forbidden,
    /// See [`EngineError::InvalidState`]
    InvalidState,
    /// See [`EngineError::OutOfHours`]
    OutOfHours,
    /// See [`EngineError::Conflict`]
    Conflict,
    /// See [`EngineError::InsufficientStock`]
    InsufficientStock,
    /// See [`EngineError::Validation`]
    Validation,
    /// See [`EngineError::TooEarly`]
    TooEarly,
    /// See [`EngineError::Timeout`]
    Timeout,
}

impl ErrorKind {
    /// Wire code for API responses
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::InvalidState => "INVALID_STATE",
            Self::OutOfHours => "OUT_OF_HOURS",
            Self::Conflict => "CONFLICT",
            Self::InsufficientStock => "INSUFFICIENT_STOCK",
            Self::Validation => "VALIDATION_ERROR",
            Self::TooEarly => "TOO_EARLY",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl EngineError {
    /// Build a `NotFound` error
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Build a `Validation` error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::OutOfHours { .. } => ErrorKind::OutOfHours,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            Self::Validation(_) => ErrorKind::Validation,
            Self::TooEarly { .. } => ErrorKind::TooEarly,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Whether the same request may succeed if retried unchanged
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout { waited } => Self::Timeout { waited },
        }
    }
}

/// Result alias for engine operations
pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_timeout_is_retryable() {
        let timeout = EngineError::from(StoreError::Timeout {
            waited: Duration::from_millis(2000),
        });
        assert!(timeout.is_retryable());
        assert_eq!(timeout.kind(), ErrorKind::Timeout);
        assert!(timeout.to_string().contains("2000ms"));

        assert!(!EngineError::validation("bad").is_retryable());
        assert!(!EngineError::Conflict {
            conflicting: BookingId::new()
        }
        .is_retryable());
    }

    #[test]
    fn not_found_message_names_resource() {
        let err = EngineError::not_found("Pet", "abc");
        assert_eq!(err.to_string(), "Pet with id abc not found");
        assert_eq!(err.kind().code(), "NOT_FOUND");
    }
}
