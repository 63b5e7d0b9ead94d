//! # Order Pricing Engine
//!
//! Computes the surcharge, total and GST portion for an order.
//!
//! ## Pricing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Order Total Assembly                             │
//! │                                                                         │
//! │   subtotal ─────────────┐                                               │
//! │                         ├──► base = subtotal + delivery_fee             │
//! │   delivery_fee ─────────┘        │     (delivery only, else 0)          │
//! │                                  │                                      │
//! │   card AND surcharge enabled? ───┤                                      │
//! │                                  ▼                                      │
//! │                      surcharge = base × rate (2 dp, half-up)            │
//! │                                  │                                      │
//! │   total_price = subtotal + delivery_fee + surcharge                     │
//! │                                  │                                      │
//! │   tax = total_price × 3/23   (GST already inside, NEVER added)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All arithmetic is on integer cents; nothing here touches floating point.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{
    Order, OrderLine, OrderStatus, PaymentMethod, PaymentStatus, PricingSettings, ServiceType,
    SurchargeRate, TaxRate,
};
use crate::validation::{validate_order_amount, ValidationResult};
use crate::MAX_ORDER_AMOUNT;

// =============================================================================
// Primitive Calculations
// =============================================================================

/// Card surcharge on `base` (normally subtotal + delivery fee).
///
/// Zero when either the base or the rate is not positive.
///
/// ## Example
/// ```rust
/// use smart_menu_core::money::Money;
/// use smart_menu_core::pricing::calculate_surcharge;
/// use smart_menu_core::types::SurchargeRate;
///
/// let surcharge = calculate_surcharge(Money::from_cents(10000), SurchargeRate::from_bps(250));
/// assert_eq!(surcharge.cents(), 250);
/// ```
pub fn calculate_surcharge(base: Money, rate: SurchargeRate) -> Money {
    if !base.is_positive() || rate.is_zero() {
        return Money::zero();
    }

    base.apply_rate(rate)
}

/// GST contained in a GST-inclusive total (NZ 15%, i.e. `total × 3/23`).
///
/// Zero when the restaurant is not GST registered or the total is not
/// positive. The result is informational and never added to a total.
pub fn calculate_gst(total_inclusive: Money, gst_registered: bool) -> Money {
    if !gst_registered || !total_inclusive.is_positive() {
        return Money::zero();
    }

    total_inclusive.inclusive_tax(TaxRate::NZ_GST)
}

/// Subtotal of an order's lines.
///
/// Rejects a subtotal above [`MAX_ORDER_AMOUNT`], including one that would
/// overflow on the way there.
pub fn sum_lines(lines: &[OrderLine]) -> ValidationResult<Money> {
    lines.iter().try_fold(Money::zero(), |subtotal, line| {
        line.line_total()
            .and_then(|total| subtotal.checked_add(total))
            .filter(|sum| *sum <= MAX_ORDER_AMOUNT)
            .ok_or_else(|| ValidationError::out_of_range("subtotal", Money::zero(), MAX_ORDER_AMOUNT))
    })
}

fn add_amounts(field: &str, a: Money, b: Money) -> ValidationResult<Money> {
    a.checked_add(b).ok_or_else(|| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "is not a representable amount".to_string(),
    })
}

// =============================================================================
// Order Pricing
// =============================================================================

/// What the caller knows when an order is priced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderPricingInput {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub payment_method: PaymentMethod,
    pub service_type: ServiceType,
}

/// The priced fields persisted on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderPricing {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub surcharge_amount: Money,
    pub tax: Money,
    pub total_price: Money,
}

impl OrderPricing {
    /// `total_price == subtotal + delivery_fee + surcharge_amount`.
    pub fn is_consistent(&self) -> bool {
        self.total_price == self.subtotal + self.delivery_fee + self.surcharge_amount
    }
}

/// Prices an order.
///
/// ## Rules
/// - Subtotal and delivery fee must be within 0..=[`MAX_ORDER_AMOUNT`]
/// - Delivery fee only applies to delivery orders
/// - Surcharge only for card payments when the restaurant enabled it,
///   charged on subtotal + delivery fee
/// - GST computed last, from the final total
///
/// ## Example
/// ```rust
/// use smart_menu_core::money::Money;
/// use smart_menu_core::pricing::{price_order, OrderPricingInput};
/// use smart_menu_core::types::{PaymentMethod, PricingSettings, ServiceType};
///
/// let settings = PricingSettings {
///     credit_card_surcharge_enabled: true,
///     ..PricingSettings::default()
/// };
/// let pricing = price_order(
///     &OrderPricingInput {
///         subtotal: Money::from_cents(4000),
///         delivery_fee: Money::from_cents(1119),
///         payment_method: PaymentMethod::Card,
///         service_type: ServiceType::Delivery,
///     },
///     &settings,
/// )
/// .unwrap();
///
/// assert_eq!(pricing.surcharge_amount.cents(), 128); // 2.5% of $51.19
/// assert_eq!(pricing.total_price.cents(), 5247);
/// ```
pub fn price_order(
    input: &OrderPricingInput,
    settings: &PricingSettings,
) -> ValidationResult<OrderPricing> {
    validate_order_amount("subtotal", input.subtotal)?;
    validate_order_amount("delivery_fee", input.delivery_fee)?;

    let delivery_fee = if input.service_type == ServiceType::Delivery {
        input.delivery_fee
    } else {
        Money::zero()
    };

    let base = add_amounts("total_price", input.subtotal, delivery_fee)?;
    let surcharge_amount = if input.payment_method == PaymentMethod::Card
        && settings.credit_card_surcharge_enabled
    {
        calculate_surcharge(base, settings.credit_card_surcharge_rate)
    } else {
        Money::zero()
    };

    let total_price = add_amounts("total_price", base, surcharge_amount)?;
    let tax = calculate_gst(total_price, settings.gst_registered);

    Ok(OrderPricing {
        subtotal: input.subtotal,
        delivery_fee,
        surcharge_amount,
        tax,
        total_price,
    })
}

/// Re-prices a stored order when the payment method is chosen after the
/// order was captured (e.g. a card surcharge added at payment-intent time).
///
/// Refuses paid and cancelled orders; their pricing is frozen.
pub fn reprice_for_payment(
    order: &Order,
    payment_method: PaymentMethod,
    settings: &PricingSettings,
) -> CoreResult<OrderPricing> {
    if order.payment_status == PaymentStatus::Paid {
        return Err(CoreError::InvalidOrderState {
            order_id: order.id.clone(),
            state: order.payment_status.as_str().to_string(),
            operation: "recompute pricing".to_string(),
        });
    }

    if order.status == OrderStatus::Cancelled {
        return Err(CoreError::InvalidOrderState {
            order_id: order.id.clone(),
            state: order.status.as_str().to_string(),
            operation: "recompute pricing".to_string(),
        });
    }

    let pricing = price_order(
        &OrderPricingInput {
            subtotal: order.subtotal,
            delivery_fee: order.delivery_fee,
            payment_method,
            service_type: order.service_type,
        },
        settings,
    )?;

    Ok(pricing)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn surcharging() -> PricingSettings {
        PricingSettings {
            credit_card_surcharge_enabled: true,
            credit_card_surcharge_rate: SurchargeRate::from_bps(250),
            ..PricingSettings::default()
        }
    }

    fn input(subtotal: i64, delivery: i64, method: PaymentMethod) -> OrderPricingInput {
        OrderPricingInput {
            subtotal: Money::from_cents(subtotal),
            delivery_fee: Money::from_cents(delivery),
            payment_method: method,
            service_type: ServiceType::Delivery,
        }
    }

    fn stored_order(payment_status: PaymentStatus, status: OrderStatus) -> Order {
        let now = Utc::now();
        Order {
            id: "order-1".to_string(),
            restaurant_id: "r-1".to_string(),
            status,
            payment_status,
            payment_method: PaymentMethod::BankTransfer,
            service_type: ServiceType::Pickup,
            subtotal: Money::from_cents(10000),
            delivery_fee: Money::zero(),
            surcharge_amount: Money::zero(),
            tax: Money::from_cents(1304),
            total_price: Money::from_cents(10000),
            payment_intent_id: None,
            customer_name: None,
            customer_phone: None,
            table_no: None,
            special_instructions: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_gst_extraction() {
        assert_eq!(calculate_gst(Money::from_cents(11500), true).cents(), 1500);
        assert_eq!(calculate_gst(Money::from_cents(11500), false).cents(), 0);
        assert_eq!(calculate_gst(Money::zero(), true).cents(), 0);
        assert_eq!(calculate_gst(Money::from_cents(-100), true).cents(), 0);
        // $10.00 × 3/23 = 1.3043… → $1.30
        assert_eq!(calculate_gst(Money::from_cents(1000), true).cents(), 130);
    }

    #[test]
    fn test_gst_round_trip_within_a_cent() {
        for total in [1, 99, 1000, 1999, 11500, 12345, 99999, 1_000_001] {
            let total = Money::from_cents(total);
            let gst = calculate_gst(total, true);
            let net = total - gst;
            // net × 1.15 ≈ total, within one cent of rounding
            let rebuilt = net.cents() as f64 * 1.15;
            assert!(
                (rebuilt - total.cents() as f64).abs() <= 1.0,
                "total {} gst {}",
                total,
                gst
            );
        }
    }

    #[test]
    fn test_surcharge() {
        let rate = SurchargeRate::from_bps(250);
        assert_eq!(calculate_surcharge(Money::from_cents(10000), rate).cents(), 250);
        assert_eq!(calculate_surcharge(Money::zero(), rate).cents(), 0);
        assert_eq!(calculate_surcharge(Money::from_cents(-500), rate).cents(), 0);
        assert_eq!(
            calculate_surcharge(Money::from_cents(10000), SurchargeRate::from_bps(0)).cents(),
            0
        );
        // $10.10 × 2.5% = 0.2525 → $0.25
        assert_eq!(calculate_surcharge(Money::from_cents(1010), rate).cents(), 25);
        // $10.30 × 2.5% = 0.2575 → $0.26
        assert_eq!(calculate_surcharge(Money::from_cents(1030), rate).cents(), 26);
    }

    #[test]
    fn test_total_additivity_for_all_zero_combinations() {
        let settings = surcharging();
        for subtotal in [0, 2350] {
            for delivery in [0, 1119] {
                for method in [PaymentMethod::Card, PaymentMethod::CashAtCounter] {
                    let pricing = price_order(&input(subtotal, delivery, method), &settings).unwrap();
                    assert!(pricing.is_consistent(), "{:?}", pricing);
                    assert_eq!(
                        pricing.tax,
                        calculate_gst(pricing.total_price, true),
                        "tax derived from the total"
                    );
                }
            }
        }
    }

    #[test]
    fn test_surcharge_only_for_enabled_card() {
        let pricing = price_order(&input(10000, 0, PaymentMethod::Card), &surcharging()).unwrap();
        assert_eq!(pricing.surcharge_amount.cents(), 250);
        assert_eq!(pricing.total_price.cents(), 10250);

        let pricing =
            price_order(&input(10000, 0, PaymentMethod::BankTransfer), &surcharging()).unwrap();
        assert_eq!(pricing.surcharge_amount.cents(), 0);

        let pricing =
            price_order(&input(10000, 0, PaymentMethod::Card), &PricingSettings::default()).unwrap();
        assert_eq!(pricing.surcharge_amount.cents(), 0);
        assert_eq!(pricing.total_price.cents(), 10000);
    }

    #[test]
    fn test_surcharge_base_includes_delivery_but_not_itself() {
        let pricing = price_order(&input(4000, 1119, PaymentMethod::Card), &surcharging()).unwrap();
        // 2.5% of $51.19 = 1.27975 → $1.28
        assert_eq!(pricing.surcharge_amount.cents(), 128);
        assert_eq!(pricing.total_price.cents(), 5247);
        assert_eq!(pricing.tax.cents(), 684);
    }

    #[test]
    fn test_delivery_fee_ignored_for_non_delivery() {
        let mut pickup = input(2000, 500, PaymentMethod::CashAtCounter);
        pickup.service_type = ServiceType::Pickup;

        let pricing = price_order(&pickup, &PricingSettings::default()).unwrap();
        assert_eq!(pricing.delivery_fee, Money::zero());
        assert_eq!(pricing.total_price.cents(), 2000);
    }

    #[test]
    fn test_negative_inputs_rejected() {
        let settings = PricingSettings::default();
        assert!(price_order(&input(-1, 0, PaymentMethod::Card), &settings).is_err());
        assert!(price_order(&input(100, -1, PaymentMethod::Card), &settings).is_err());
    }

    #[test]
    fn test_amounts_above_ceiling_rejected() {
        let settings = surcharging();
        let max = MAX_ORDER_AMOUNT.cents();

        // At the ceiling everything still prices, surcharge included
        let pricing = price_order(&input(max, max, PaymentMethod::Card), &settings).unwrap();
        assert!(pricing.is_consistent());

        let err = price_order(&input(i64::MAX, 100, PaymentMethod::Card), &settings).unwrap_err();
        assert_eq!(err.field(), "subtotal");
        let err = price_order(&input(100, max + 1, PaymentMethod::Card), &settings).unwrap_err();
        assert_eq!(err.field(), "delivery_fee");
    }

    #[test]
    fn test_sum_lines() {
        let line = |quantity: i64, cents: i64| OrderLine {
            menu_id: None,
            name: "Kai".to_string(),
            name_en: None,
            quantity,
            unit_price: Money::from_cents(cents),
        };

        assert_eq!(
            sum_lines(&[line(2, 1500), line(1, 450)]).unwrap(),
            Money::from_cents(3450)
        );
        assert_eq!(sum_lines(&[]).unwrap(), Money::zero());

        // Overflowing line total
        let err = sum_lines(&[line(999, 100_000_000_000_000_000)]).unwrap_err();
        assert_eq!(err.field(), "subtotal");

        // Each line fits, the sum passes the ceiling
        let half = MAX_ORDER_AMOUNT.cents() / 2 + 1;
        assert!(sum_lines(&[line(1, half), line(1, half)]).is_err());
    }

    #[test]
    fn test_reprice_adds_surcharge_before_payment() {
        let order = stored_order(PaymentStatus::Pending, OrderStatus::PendingPayment);
        let pricing = reprice_for_payment(&order, PaymentMethod::Card, &surcharging()).unwrap();

        assert_eq!(pricing.surcharge_amount.cents(), 250);
        assert_eq!(pricing.total_price.cents(), 10250);
        assert_eq!(pricing.tax.cents(), 1337);
    }

    #[test]
    fn test_reprice_refuses_paid_and_cancelled() {
        let paid = stored_order(PaymentStatus::Paid, OrderStatus::Confirmed);
        let err = reprice_for_payment(&paid, PaymentMethod::Card, &surcharging()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidOrderState { .. }));

        let cancelled = stored_order(PaymentStatus::Pending, OrderStatus::Cancelled);
        assert!(reprice_for_payment(&cancelled, PaymentMethod::Card, &surcharging()).is_err());
    }
}
