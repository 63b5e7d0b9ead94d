//! # Error Types
//!
//! Domain-specific error types for smart-menu-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  smart-menu-core errors (this file)                                    │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  smart-menu-db errors (separate crate)                                 │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  smart-menu-service errors                                             │
//! │  └── ServiceError     - What the HTTP layer sees (error_code + text)   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → JSON body          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Out-of-range deliveries and unconfigured delivery pricing are NOT errors;
//! they are ordinary outcomes of [`crate::delivery::DeliveryFee`].

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Adding a card surcharge to an order that is already paid
    /// - Re-pricing a cancelled order
    #[error("Order {order_id} is {state}, cannot {operation}")]
    InvalidOrderState {
        order_id: String,
        state: String,
        operation: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any side effect so the caller can show a specific reason.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must be positive.
    #[error("{field} must be greater than 0")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, non-finite number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Shorthand for an [`ValidationError::OutOfRange`] with displayable bounds.
    pub fn out_of_range(
        field: impl Into<String>,
        min: impl ToString,
        max: impl ToString,
    ) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
