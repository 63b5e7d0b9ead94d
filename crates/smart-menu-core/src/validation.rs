//! # Validation Module
//!
//! Input validation for everything that crosses into the pricing core.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web front end                                                │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: smart-menu-service                                           │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation, before any side effect     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use smart_menu_core::validation::{validate_lookback_days, validate_surcharge_rate_percent};
//!
//! assert!(validate_lookback_days(14).is_ok());
//! let rate = validate_surcharge_rate_percent(Decimal::new(25, 1)).unwrap(); // 2.5%
//! assert_eq!(rate.bps(), 250);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{DeliveryRate, DeliverySettings, GeoPoint, SurchargeRate};
use crate::{
    MAX_BEST_SELLER_LIMIT, MAX_ITEM_QUANTITY, MAX_LOOKBACK_DAYS, MAX_ORDER_AMOUNT,
    MAX_SURCHARGE_BPS,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest free-text address accepted for geocoding.
const MAX_ADDRESS_LEN: usize = 500;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a UUID string, naming `field` in the error.
///
/// ## Example
/// ```rust
/// use smart_menu_core::validation::validate_uuid;
///
/// assert!(validate_uuid("restaurant_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("restaurant_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Money and Rate Validators
// =============================================================================

/// Validates a payment amount before a payment intent is created.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Validates an amount that may be zero but never negative
/// (subtotal, delivery fee, menu price).
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates an amount an order is priced from: not negative and at most
/// [`MAX_ORDER_AMOUNT`].
pub fn validate_order_amount(field: &str, amount: Money) -> ValidationResult<()> {
    validate_non_negative(field, amount)?;

    if amount > MAX_ORDER_AMOUNT {
        return Err(ValidationError::out_of_range(
            field,
            Money::zero(),
            MAX_ORDER_AMOUNT,
        ));
    }

    Ok(())
}

/// Converts a dollar amount entered by a user to Money.
///
/// Amounts finer than a cent are rejected, never rounded.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use smart_menu_core::validation::validate_dollars;
///
/// assert_eq!(validate_dollars("base_fee", Decimal::new(350, 2)).unwrap().cents(), 350);
/// assert!(validate_dollars("base_fee", Decimal::new(3505, 3)).is_err());
/// ```
pub fn validate_dollars(field: &str, amount: Decimal) -> ValidationResult<Money> {
    validate_decimal_places(field, amount, 2)?;

    Money::from_decimal(amount).ok_or_else(|| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "is not a representable amount".to_string(),
    })
}

fn validate_decimal_places(field: &str, value: Decimal, places: u32) -> ValidationResult<()> {
    if value.normalize().scale() > places {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("must have at most {} decimal places", places),
        });
    }

    Ok(())
}

/// Validates a credit card surcharge rate given as a percentage.
///
/// ## Rules
/// - Must be within 0–10 percent inclusive
/// - Out-of-range values are rejected, never clamped
/// - At most two decimal places (whole basis points)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Settings: Card Surcharge                                               │
/// │                                                                         │
/// │  Owner enters 2.5                                                      │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_surcharge_rate_percent(2.5) ← THIS FUNCTION                  │
/// │       │                                                                 │
/// │       ├── < 0 or > 10? → Error: "must be between 0 and 10"             │
/// │       │                                                                 │
/// │       └── OK → SurchargeRate(250 bps) stored                           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_surcharge_rate_percent(percent: Decimal) -> ValidationResult<SurchargeRate> {
    let max_percent = Decimal::new(MAX_SURCHARGE_BPS as i64, 2);

    if percent < Decimal::ZERO || percent > max_percent {
        return Err(ValidationError::out_of_range(
            "credit_card_surcharge_rate",
            0,
            max_percent.normalize(),
        ));
    }

    validate_decimal_places("credit_card_surcharge_rate", percent, 2)?;

    let bps = (percent * Decimal::ONE_HUNDRED)
        .to_u32()
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: "credit_card_surcharge_rate".to_string(),
            reason: "is not a representable percentage".to_string(),
        })?;

    Ok(SurchargeRate::from_bps(bps))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::out_of_range("quantity", 1, MAX_ITEM_QUANTITY));
    }

    Ok(())
}

/// Validates a best-seller lookback window, in days. Accepts 1 to 365.
pub fn validate_lookback_days(days: i64) -> ValidationResult<()> {
    if !(1..=MAX_LOOKBACK_DAYS).contains(&days) {
        return Err(ValidationError::out_of_range(
            "lookback_days",
            1,
            MAX_LOOKBACK_DAYS,
        ));
    }

    Ok(())
}

/// Validates a best-seller list size and returns it as `usize`.
pub fn validate_limit(limit: i64) -> ValidationResult<usize> {
    if limit < 1 || limit > MAX_BEST_SELLER_LIMIT as i64 {
        return Err(ValidationError::out_of_range(
            "limit",
            1,
            MAX_BEST_SELLER_LIMIT,
        ));
    }

    Ok(limit as usize)
}

/// Validates a distance in kilometres: finite and non-negative.
pub fn validate_distance_km(field: &str, km: f64) -> ValidationResult<()> {
    if !km.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if km < 0.0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Location Validators
// =============================================================================

/// Validates a customer address before it is sent to the geocoder.
///
/// ## Returns
/// The trimmed address.
pub fn validate_address(address: &str) -> ValidationResult<String> {
    let address = address.trim();

    if address.is_empty() {
        return Err(ValidationError::Required {
            field: "customer_address".to_string(),
        });
    }

    if address.chars().count() > MAX_ADDRESS_LEN {
        return Err(ValidationError::TooLong {
            field: "customer_address".to_string(),
            max: MAX_ADDRESS_LEN,
        });
    }

    Ok(address.to_string())
}

/// Validates a latitude/longitude pair.
///
/// ## Example
/// ```rust
/// use smart_menu_core::validation::validate_coordinates;
///
/// assert!(validate_coordinates(-36.8485, 174.7633).is_ok()); // Auckland
/// assert!(validate_coordinates(91.0, 0.0).is_err());
/// ```
pub fn validate_coordinates(lat: f64, lng: f64) -> ValidationResult<GeoPoint> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(ValidationError::out_of_range("latitude", -90, 90));
    }

    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(ValidationError::out_of_range("longitude", -180, 180));
    }

    Ok(GeoPoint::new(lat, lng))
}

// =============================================================================
// Delivery Configuration Validators
// =============================================================================

/// Validates per-km delivery settings.
pub fn validate_delivery_settings(settings: &DeliverySettings) -> ValidationResult<()> {
    validate_non_negative("base_fee", settings.base_fee)?;
    validate_non_negative("price_per_km", settings.price_per_km)?;
    validate_non_negative("free_delivery_above", settings.free_delivery_above)?;
    validate_distance_km("max_distance_km", settings.max_distance_km)?;

    if settings.max_distance_km == 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "max_distance_km".to_string(),
        });
    }

    Ok(())
}

/// Validates delivery tiers.
///
/// ## Rules
/// - Every tier distance is finite and > 0
/// - Every tier price is >= 0
/// - No two tiers share a distance
pub fn validate_delivery_rates(rates: &[DeliveryRate]) -> ValidationResult<()> {
    for rate in rates {
        validate_distance_km("distance_km", rate.distance_km)?;
        if rate.distance_km == 0.0 {
            return Err(ValidationError::MustBePositive {
                field: "distance_km".to_string(),
            });
        }
        validate_non_negative("price", rate.price)?;
    }

    let mut distances: Vec<f64> = rates.iter().map(|r| r.distance_km).collect();
    distances.sort_by(f64::total_cmp);
    if distances.windows(2).any(|pair| pair[0] == pair[1]) {
        return Err(ValidationError::InvalidFormat {
            field: "delivery_rates".to_string(),
            reason: "tier distances must be unique".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
