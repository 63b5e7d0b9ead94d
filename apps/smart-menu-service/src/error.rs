//! # Service Error Type
//!
//! Unified error type for every service operation.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Smart Menu                             │
//! │                                                                         │
//! │  ValidationError ─┐                                                    │
//! │  CoreError ───────┤                                                    │
//! │  GeocodeError ────┼──► ServiceError ──► error_code()  "GEOCODE_FAILED" │
//! │  DbError ─────────┘         │           http_status() 422              │
//! │                             ▼                                          │
//! │          { "success": false, "error": "...", "error_code": "..." }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An out-of-range delivery or an unconfigured delivery price is NOT an
//! error; those are successful quotes.

use serde::Serialize;
use smart_menu_core::delivery::MissingConfig;
use smart_menu_core::{CoreError, ValidationError};
use smart_menu_db::DbError;
use tracing::error;

use crate::geocoder::GeocodeError;

/// Customer-facing text for an unresolvable address.
pub const ADDRESS_NOT_FOUND_MESSAGE: &str =
    "Could not find the address. Please check and try again.";

/// Service operation errors.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Input rejected before any side effect.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Business rule violation (e.g. re-pricing a paid order).
    #[error("{0}")]
    Core(CoreError),

    /// The geocoder could not resolve the customer's address.
    #[error("{}", ADDRESS_NOT_FOUND_MESSAGE)]
    AddressNotFound(#[source] GeocodeError),

    /// The restaurant is missing configuration the operation needs.
    #[error("{}", .0.remediation())]
    MissingConfiguration(MissingConfig),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Storage failure. The message shown to callers is generic.
    #[error("Database operation failed")]
    Database(#[source] DbError),
}

impl ServiceError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "VALIDATION_ERROR",
            ServiceError::Core(CoreError::InvalidOrderState { .. }) => "INVALID_ORDER_STATE",
            ServiceError::Core(CoreError::Validation(_)) => "VALIDATION_ERROR",
            ServiceError::AddressNotFound(_) => "GEOCODE_FAILED",
            ServiceError::MissingConfiguration(MissingConfig::Coordinates) => {
                "LOCATION_NOT_CONFIGURED"
            }
            ServiceError::MissingConfiguration(MissingConfig::DeliveryRates) => {
                "DELIVERY_NOT_CONFIGURED"
            }
            ServiceError::NotFound { .. } => "NOT_FOUND",
            ServiceError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Status an HTTP layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::Validation(_) | ServiceError::MissingConfiguration(_) => 400,
            ServiceError::Core(CoreError::Validation(_)) => 400,
            ServiceError::Core(CoreError::InvalidOrderState { .. }) => 409,
            ServiceError::AddressNotFound(_) => 422,
            ServiceError::NotFound { .. } => 404,
            ServiceError::Database(_) => 500,
        }
    }

    /// The `{success: false, error, error_code}` body.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            error: self.to_string(),
            error_code: self.error_code(),
        }
    }
}

/// Failure response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub error_code: &'static str,
}

/// Flattens `CoreError::Validation` so callers see one validation variant.
impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(err) => ServiceError::Validation(err),
            other => ServiceError::Core(other),
        }
    }
}

/// Converts database errors to service errors.
impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            other => {
                // Log the actual error but return a generic message
                error!(error = %other, "Database operation failed");
                ServiceError::Database(other)
            }
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
