//! # Orders Summary
//!
//! Revenue, GST and count breakdowns over a filtered set of orders.
//!
//! Revenue and tax only count paid orders. Payment method counts skip
//! cancelled orders; status and service type counts include everything
//! that passed the filter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Order, OrderStatus, PaymentMethod, PaymentStatus, ServiceType};

/// Narrows the orders a summary covers. Dates are inclusive whole days (UTC).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SummaryFilter {
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    pub payment_status: Option<PaymentStatus>,
    pub service_type: Option<ServiceType>,
}

impl SummaryFilter {
    pub fn matches(&self, order: &Order) -> bool {
        let day = order.created_at.date_naive();

        self.start_date.map_or(true, |start| day >= start)
            && self.end_date.map_or(true, |end| day <= end)
            && self.payment_status.map_or(true, |s| order.payment_status == s)
            && self.service_type.map_or(true, |s| order.service_type == s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentStatusCounts {
    pub paid: u64,
    pub pending: u64,
    pub processing: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceTypeCounts {
    pub dine_in: u64,
    pub pickup: u64,
    pub delivery: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MethodTotals {
    pub count: u64,
    pub revenue: Money,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentMethodTotals {
    pub card: MethodTotals,
    pub bank_transfer: MethodTotals,
    pub cash_at_counter: MethodTotals,
}

impl PaymentMethodTotals {
    fn slot(&mut self, method: PaymentMethod) -> &mut MethodTotals {
        match method {
            PaymentMethod::Card => &mut self.card,
            PaymentMethod::BankTransfer => &mut self.bank_transfer,
            PaymentMethod::CashAtCounter => &mut self.cash_at_counter,
        }
    }
}

/// Aggregate figures for a restaurant's orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrdersSummary {
    pub total_orders: u64,
    pub total_revenue: Money,
    pub total_tax: Money,
    pub payment_status: PaymentStatusCounts,
    pub service_type: ServiceTypeCounts,
    pub payment_method: PaymentMethodTotals,
}

/// Summarises the orders that pass `filter`.
pub fn summarize_orders<'a>(
    orders: impl IntoIterator<Item = &'a Order>,
    filter: &SummaryFilter,
) -> OrdersSummary {
    let mut summary = OrdersSummary::default();

    for order in orders.into_iter().filter(|o| filter.matches(o)) {
        summary.total_orders += 1;
        let paid = order.payment_status == PaymentStatus::Paid;

        match order.payment_status {
            PaymentStatus::Paid => summary.payment_status.paid += 1,
            PaymentStatus::Pending => summary.payment_status.pending += 1,
            PaymentStatus::Processing => summary.payment_status.processing += 1,
            PaymentStatus::Failed => summary.payment_status.failed += 1,
        }

        match order.service_type {
            ServiceType::DineIn => summary.service_type.dine_in += 1,
            ServiceType::Pickup => summary.service_type.pickup += 1,
            ServiceType::Delivery => summary.service_type.delivery += 1,
        }

        let method = summary.payment_method.slot(order.payment_method);
        if order.status != OrderStatus::Cancelled {
            method.count += 1;
        }
        if paid {
            method.revenue += order.total_price;
            summary.total_revenue += order.total_price;
            if order.status != OrderStatus::Cancelled {
                summary.total_tax += order.tax;
            }
        }
    }

    summary
}

// =============================================================================
// Unit Tests
// =============================================================================
