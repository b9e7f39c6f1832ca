//! # Error Types
//!
//! Domain-specific error types for clipshop-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  clipshop-core errors (this file)                                       │
//! │  ├── CoreError        - Expected, caller-recoverable outcomes           │
//! │  └── ValidationError  - Malformed input                                 │
//! │                                                                         │
//! │  clipshop-db errors (separate crate)                                    │
//! │  └── DbError          - Storage failures, constraint analysis           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← DbError (mapped at the boundary)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Every failed precondition short-circuits before any mutation
//! 2. Expected outcomes (not found, conflict, out of stock, forbidden) are
//!    enum variants the caller can match on, never strings
//! 3. Only unexpected storage failures surface as `Storage`

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business-rule and lifecycle errors.
///
/// All variants except `Storage` are expected, recoverable-by-the-caller
/// outcomes. They are never retried automatically and never treated as fatal.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity (service, product, booking, order, barber,
    /// time slot) does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Double-booking or a terminal-state violation.
    ///
    /// ## When This Occurs
    /// - A second reservation for the same (barber, date, time slot)
    /// - Paying a cancelled/completed order
    /// - Cancelling an already-cancelled order or booking
    #[error("{0}")]
    Conflict(String),

    /// Requested quantity exceeds available stock. A subtype of conflict.
    #[error("insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Requester is neither the resource owner nor an admin.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Malformed input (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Unexpected storage failure (connection loss, unmapped constraint).
    /// The only variant that represents an internal failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates a Conflict error with the given message.
    pub fn conflict(message: impl Into<String>) -> Self {
        CoreError::Conflict(message.into())
    }

    /// Creates a Forbidden error with the given message.
    pub fn forbidden(message: impl Into<String>) -> Self {
        CoreError::Forbidden(message.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements and are raised
/// before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive. A quantity of zero is malformed input,
    /// not a no-op.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (bad card number, bad duration string, bad decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Card expiry date is in the past.
    #[error("card is expired")]
    CardExpired,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Pomade".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for Pomade: available 3, requested 5"
        );

        let err = CoreError::not_found("Booking", "b-1");
        assert_eq!(err.to_string(), "Booking not found: b-1");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
