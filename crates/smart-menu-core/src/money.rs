//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A 2.5% surcharge on $10.10 computed in floats can land on either      │
//! │  side of the half-cent and drift by $0.01 between front end and API.   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents + half-up rounding in integer math        │
//! │    1010 cents × 250 bps = 252500 → (252500 + 5000) / 10000 = 25 cents  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use smart_menu_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let doubled = price * 2;             // $21.98
//! let total = price + Money::from_cents(500); // $15.99
//! assert_eq!(total.cents(), 1599);
//! assert_eq!(doubled.to_string(), "$21.98");
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::{SurchargeRate, TaxRate};

/// Basis points in 100%.
const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in cents (NZD).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serialized as cents**: Response contracts convert to dollars explicitly
///
/// ## Where Money is Used
/// ```text
/// MenuItem.price ──► OrderLine.unit_price ──► Order.subtotal
///                                                  │
/// DeliverySettings.base_fee / price_per_km ──► Order.delivery_fee
///                                                  │
///                         calculate_surcharge ──► Order.surcharge_amount
///                                                  │
///                    subtotal + delivery + surcharge = Order.total_price
///                                                  │
///                               calculate_gst ──► Order.tax (informational)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use smart_menu_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -$5.50, not -$4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Converts a decimal dollar amount to Money, rounding half-up
    /// (away from zero) to whole cents.
    ///
    /// Returns `None` if the amount does not fit in i64 cents.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use smart_menu_core::money::Money;
    ///
    /// // 11.185 → $11.19
    /// let fee = Money::from_decimal(Decimal::new(11185, 3)).unwrap();
    /// assert_eq!(fee.cents(), 1119);
    /// ```
    pub fn from_decimal(amount: Decimal) -> Option<Self> {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(Money)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the exact decimal dollar amount (e.g. `11.19`).
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns the dollar amount as f64.
    ///
    /// ## Note
    /// For JSON response bodies only. Never feed the result back into math.
    pub fn to_f64(&self) -> f64 {
        self.to_decimal().to_f64().unwrap_or_default()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Applies a percentage rate (e.g. a card surcharge) to this amount.
    ///
    /// ## Rounding
    /// Half-up at the cent: `(amount × bps + 5000) / 10000` for positive
    /// amounts, mirrored for negative ones.
    ///
    /// ## Example
    /// ```rust
    /// use smart_menu_core::money::Money;
    /// use smart_menu_core::types::SurchargeRate;
    ///
    /// let base = Money::from_cents(10000);        // $100.00
    /// let rate = SurchargeRate::from_bps(250);    // 2.5%
    /// assert_eq!(base.apply_rate(rate).cents(), 250); // $2.50
    /// ```
    pub fn apply_rate(&self, rate: SurchargeRate) -> Money {
        let cents = div_round_half_up(self.0 as i128 * rate.bps() as i128, BPS_SCALE);
        Money::from_cents(cents as i64)
    }

    /// Extracts the tax component already included in this amount.
    ///
    /// For an inclusive total `T` and rate `r`, the embedded tax is
    /// `T × r / (1 + r)`. At 15% that is `T × 1500 / 11500 = T × 3 / 23`.
    ///
    /// ## Example
    /// ```rust
    /// use smart_menu_core::money::Money;
    /// use smart_menu_core::types::TaxRate;
    ///
    /// let total = Money::from_cents(11500); // $115.00 incl. GST
    /// assert_eq!(total.inclusive_tax(TaxRate::NZ_GST).cents(), 1500);
    /// ```
    pub fn inclusive_tax(&self, rate: TaxRate) -> Money {
        let bps = rate.bps() as i128;
        let cents = div_round_half_up(self.0 as i128 * bps, BPS_SCALE + bps);
        Money::from_cents(cents as i64)
    }

    /// `self + other`, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `self × qty`, or `None` on overflow.
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

/// Integer division rounding halves away from zero.
fn div_round_half_up(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1119)), "$11.19");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_decimal_conversions() {
        assert_eq!(Money::from_decimal(Decimal::new(1119, 2)), Some(Money::from_cents(1119)));
        // Half-up at the cent
        assert_eq!(Money::from_decimal(Decimal::new(1005, 3)), Some(Money::from_cents(101)));
        assert_eq!(Money::from_decimal(Decimal::new(1004, 3)), Some(Money::from_cents(100)));
        assert_eq!(Money::from_decimal(Decimal::new(-1005, 3)), Some(Money::from_cents(-101)));

        // Out of i64 cents, or out of Decimal range once scaled to cents
        assert_eq!(Money::from_decimal(Decimal::new(i64::MAX, 0)), None);
        assert_eq!(Money::from_decimal(Decimal::MAX), None);

        assert_eq!(Money::from_cents(1119).to_decimal(), Decimal::new(1119, 2));
        assert!((Money::from_cents(1119).to_f64() - 11.19).abs() < 1e-9);
    }

    #[test]
    fn test_apply_rate_rounds_half_up() {
        // $100.00 × 2.5% = $2.50
        assert_eq!(Money::from_cents(10000).apply_rate(SurchargeRate::from_bps(250)).cents(), 250);
        // $10.10 × 2.5% = $0.2525 → $0.25
        assert_eq!(Money::from_cents(1010).apply_rate(SurchargeRate::from_bps(250)).cents(), 25);
        // $0.30 × 2.5% = $0.0075 → $0.01
        assert_eq!(Money::from_cents(30).apply_rate(SurchargeRate::from_bps(250)).cents(), 1);
        // $0.20 × 2.5% = $0.005 → $0.01 (half goes up)
        assert_eq!(Money::from_cents(20).apply_rate(SurchargeRate::from_bps(250)).cents(), 1);
    }

    #[test]
    fn test_inclusive_tax_extraction() {
        assert_eq!(Money::from_cents(11500).inclusive_tax(TaxRate::NZ_GST).cents(), 1500);
        // $10.00 incl. → 130.43 cents → $1.30
        assert_eq!(Money::from_cents(1000).inclusive_tax(TaxRate::NZ_GST).cents(), 130);
        // $23.00 incl. → exactly $3.00
        assert_eq!(Money::from_cents(2300).inclusive_tax(TaxRate::NZ_GST).cents(), 300);
        assert_eq!(Money::from_cents(1000).inclusive_tax(TaxRate::zero()).cents(), 0);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().cents(), 100);
    }
}
