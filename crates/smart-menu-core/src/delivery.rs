//! # Delivery Fee Calculator
//!
//! Turns a road distance and a restaurant's delivery configuration into a
//! fee, an out-of-range answer, or an explicit "not configured" zero.
//!
//! ## Decision Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  calculate_delivery_fee(distance, settings, rates)                      │
//! │                                                                         │
//! │  settings? ─── none ──► rates? ── none ──► NotConfigured (fee 0 + note)│
//! │     │                     └── some ──► tier                             │
//! │     ▼                                                                   │
//! │  pricing_mode                                                           │
//! │     ├── per_km ──► distance > max? ──► OutOfRange                      │
//! │     │                 └──► base_fee + distance × price_per_km (2 dp)   │
//! │     │                                                                   │
//! │     └── tier ────► no rates? ──► NotConfigured                          │
//! │                     first tier with tier.distance >= distance           │
//! │                       └── none ──► OutOfRange (max = largest tier)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Neither out-of-range nor unconfigured pricing is an error. Invalid
//! distances (negative, NaN, infinite) are.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{DeliveryPricingMode, DeliveryRate, DeliverySettings};
use crate::validation::{validate_distance_km, ValidationResult};

/// Delivery radius reported when the restaurant configured nothing.
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 15.0;

// =============================================================================
// Outcome Types
// =============================================================================

/// The piece of restaurant configuration a delivery quote could not find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MissingConfig {
    /// Restaurant latitude/longitude.
    Coordinates,
    /// Delivery settings or delivery tiers.
    DeliveryRates,
}

impl MissingConfig {
    /// Owner-facing remediation text.
    pub fn remediation(&self) -> &'static str {
        match self {
            MissingConfig::Coordinates => {
                "Restaurant location not configured. Please set restaurant coordinates in settings."
            }
            MissingConfig::DeliveryRates => "No delivery rates configured",
        }
    }
}

/// Result of pricing a delivery over a known distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryFee {
    /// Deliverable at `fee`.
    WithinRange {
        fee: Money,
        pricing_mode: DeliveryPricingMode,
        max_distance_km: f64,
        /// Tier boundary that priced the trip (tier mode only).
        tier_distance_km: Option<f64>,
    },
    /// Too far; no fee exists.
    OutOfRange {
        pricing_mode: DeliveryPricingMode,
        max_distance_km: f64,
    },
    /// The restaurant never configured delivery pricing. Fee is zero.
    NotConfigured { missing: MissingConfig },
}

impl DeliveryFee {
    /// The fee, or `None` exactly when delivery is out of range.
    pub fn fee(&self) -> Option<Money> {
        match self {
            DeliveryFee::WithinRange { fee, .. } => Some(*fee),
            DeliveryFee::OutOfRange { .. } => None,
            DeliveryFee::NotConfigured { .. } => Some(Money::zero()),
        }
    }

    #[inline]
    pub fn is_within_range(&self) -> bool {
        !matches!(self, DeliveryFee::OutOfRange { .. })
    }

    pub fn max_distance_km(&self) -> f64 {
        match self {
            DeliveryFee::WithinRange { max_distance_km, .. }
            | DeliveryFee::OutOfRange { max_distance_km, .. } => *max_distance_km,
            DeliveryFee::NotConfigured { .. } => DEFAULT_MAX_DISTANCE_KM,
        }
    }

    pub fn message(&self) -> String {
        match self {
            DeliveryFee::WithinRange {
                tier_distance_km: Some(tier),
                ..
            } => format!("Delivery fee for up to {} km", tier),
            DeliveryFee::WithinRange { .. } => "Delivery fee calculated".to_string(),
            DeliveryFee::OutOfRange { max_distance_km, .. } => {
                format!("Sorry, we only deliver within {} km", max_distance_km)
            }
            DeliveryFee::NotConfigured { missing } => missing.remediation().to_string(),
        }
    }

    /// Flattens the outcome into the wire contract.
    pub fn to_quote(&self) -> FeeQuote {
        FeeQuote {
            fee: self.fee().map(|fee| fee.to_f64()),
            is_within_range: self.is_within_range(),
            max_distance_km: self.max_distance_km(),
            message: self.message(),
        }
    }
}

/// Wire shape of a fee decision: `fee` is null exactly when
/// `is_within_range` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FeeQuote {
    pub fee: Option<f64>,
    pub is_within_range: bool,
    pub max_distance_km: f64,
    pub message: String,
}

// =============================================================================
// Calculators
// =============================================================================

/// Prices a delivery of `distance_km` (road distance).
///
/// ## Example
/// ```rust
/// use smart_menu_core::delivery::calculate_delivery_fee;
/// use smart_menu_core::money::Money;
/// use smart_menu_core::types::DeliverySettings;
///
/// let settings = DeliverySettings::default(); // $3.00 + $1.50/km, max 15 km
/// let fee = calculate_delivery_fee(5.46, Some(&settings), &[]).unwrap();
/// assert_eq!(fee.fee(), Some(Money::from_cents(1119)));
/// ```
pub fn calculate_delivery_fee(
    distance_km: f64,
    settings: Option<&DeliverySettings>,
    rates: &[DeliveryRate],
) -> ValidationResult<DeliveryFee> {
    validate_distance_km("distance_km", distance_km)?;

    let mode = match settings {
        Some(settings) => settings.pricing_mode,
        None if !rates.is_empty() => DeliveryPricingMode::Tier,
        None => {
            return Ok(DeliveryFee::NotConfigured {
                missing: MissingConfig::DeliveryRates,
            })
        }
    };

    match (mode, settings) {
        (DeliveryPricingMode::PerKm, Some(settings)) => per_km_fee(distance_km, settings),
        _ => Ok(tier_fee(distance_km, rates)),
    }
}

/// `base_fee + distance × price_per_km`, rounded half-up to the cent.
pub fn per_km_fee(distance_km: f64, settings: &DeliverySettings) -> ValidationResult<DeliveryFee> {
    validate_distance_km("distance_km", distance_km)?;

    if distance_km > settings.max_distance_km {
        return Ok(DeliveryFee::OutOfRange {
            pricing_mode: DeliveryPricingMode::PerKm,
            max_distance_km: settings.max_distance_km,
        });
    }

    let too_large = || ValidationError::InvalidFormat {
        field: "distance_km".to_string(),
        reason: "is too large to price".to_string(),
    };

    let distance = Decimal::from_f64(distance_km).ok_or_else(too_large)?;
    let fee = distance
        .checked_mul(settings.price_per_km.to_decimal())
        .and_then(|km_fee| km_fee.checked_add(settings.base_fee.to_decimal()))
        .and_then(Money::from_decimal)
        .ok_or_else(too_large)?;

    Ok(DeliveryFee::WithinRange {
        fee,
        pricing_mode: DeliveryPricingMode::PerKm,
        max_distance_km: settings.max_distance_km,
        tier_distance_km: None,
    })
}

/// Smallest tier whose distance covers the trip; boundaries are inclusive.
pub fn tier_fee(distance_km: f64, rates: &[DeliveryRate]) -> DeliveryFee {
    let mut sorted = rates.to_vec();
    sorted.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    let Some(largest) = sorted.last().map(|rate| rate.distance_km) else {
        return DeliveryFee::NotConfigured {
            missing: MissingConfig::DeliveryRates,
        };
    };

    match sorted.iter().find(|rate| distance_km <= rate.distance_km) {
        Some(rate) => DeliveryFee::WithinRange {
            fee: rate.price,
            pricing_mode: DeliveryPricingMode::Tier,
            max_distance_km: largest,
            tier_distance_km: Some(rate.distance_km),
        },
        None => DeliveryFee::OutOfRange {
            pricing_mode: DeliveryPricingMode::Tier,
            max_distance_km: largest,
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
