//! Order service.
//!
//! Prices orders with the restaurant's GST and surcharge settings, re-prices
//! them when a payment intent is created, and reports order summaries.
//!
//! ## Payment Intent Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_order ─► price_order ─► orders (pending_payment / pending)     │
//! │                                                                         │
//! │  create_payment_intent(amount, method)                                 │
//! │       │                                                                 │
//! │       ├── amount <= 0? ──────────► Validation error, nothing written    │
//! │       ├── order paid/cancelled? ─► INVALID_ORDER_STATE                  │
//! │       ▼                                                                 │
//! │  reprice_for_payment (server-side, client amount is only compared)     │
//! │       ▼                                                                 │
//! │  record_payment_intent (pricing and intent id, one UPDATE)             │
//! │                                                                         │
//! │  confirm_payment ─► mark_paid (pending_payment → pending)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use smart_menu_core::pricing::{
    price_order, reprice_for_payment, sum_lines, OrderPricing, OrderPricingInput,
};
use smart_menu_core::summary::{summarize_orders, OrdersSummary, SummaryFilter};
use smart_menu_core::validation::{
    validate_dollars, validate_non_negative, validate_payment_amount, validate_quantity,
    validate_uuid, ValidationResult,
};
use smart_menu_core::{
    Money, Order, OrderLine, OrderStatus, PaymentMethod, PaymentStatus, ServiceType,
    ValidationError,
};

use crate::error::{ServiceError, ServiceResult};
use crate::services::load_restaurant;
use crate::AppState;

// =============================================================================
// Contracts
// =============================================================================

/// One line of a new order. Prices are dollars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    #[serde(default)]
    pub menu_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub name_en: Option<String>,
    pub quantity: i64,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub restaurant_id: String,
    pub items: Vec<OrderItemRequest>,
    /// Ignored unless `service_type` is delivery.
    #[serde(default)]
    pub delivery_fee: Decimal,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub service_type: ServiceType,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub table_no: Option<String>,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    pub order_id: String,
    pub restaurant_id: String,
    /// What the client believes it owes, in dollars.
    pub amount: Decimal,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Checkout preview inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingPreviewRequest {
    pub restaurant_id: String,
    pub subtotal: Decimal,
    #[serde(default)]
    pub delivery_fee: Decimal,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub service_type: ServiceType,
}

/// Order pricing in dollars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricingBreakdown {
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub surcharge_amount: f64,
    pub tax: f64,
    pub total_price: f64,
}

impl From<&OrderPricing> for PricingBreakdown {
    fn from(pricing: &OrderPricing) -> Self {
        PricingBreakdown {
            subtotal: pricing.subtotal.to_f64(),
            delivery_fee: pricing.delivery_fee.to_f64(),
            surcharge_amount: pricing.surcharge_amount.to_f64(),
            tax: pricing.tax.to_f64(),
            total_price: pricing.total_price.to_f64(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderCreated {
    pub success: bool,
    pub order_id: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(flatten)]
    pub pricing: PricingBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentIntentCreated {
    pub success: bool,
    pub order_id: String,
    pub payment_intent_id: String,
    /// Amount to charge, in cents.
    pub amount_cents: i64,
    #[serde(flatten)]
    pub pricing: PricingBreakdown,
}

/// Summary body. Money inside `summary` is in cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrdersSummaryResponse {
    pub success: bool,
    pub restaurant_id: String,
    pub filter: SummaryFilter,
    pub summary: OrdersSummary,
}

// =============================================================================
// Service
// =============================================================================

/// Order service implementation.
pub struct OrderService {
    state: Arc<AppState>,
}

impl OrderService {
    /// Create a new order service.
    pub fn new(state: Arc<AppState>) -> Self {
        OrderService { state }
    }

    /// Validates, prices and stores a new order.
    ///
    /// The subtotal is the sum of the lines; the caller never supplies it.
    pub async fn create_order(&self, request: &CreateOrderRequest) -> ServiceResult<OrderCreated> {
        let restaurant = load_restaurant(&self.state, &request.restaurant_id).await?;

        if request.items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }

        let lines = request
            .items
            .iter()
            .map(to_order_line)
            .collect::<ValidationResult<Vec<OrderLine>>>()?;

        let subtotal = sum_lines(&lines)?;
        let pricing = price_order(
            &OrderPricingInput {
                subtotal,
                delivery_fee: dollars("delivery_fee", request.delivery_fee)?,
                payment_method: request.payment_method,
                service_type: request.service_type,
            },
            &restaurant.pricing,
        )?;

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            restaurant_id: restaurant.id.clone(),
            status: OrderStatus::PendingPayment,
            payment_status: PaymentStatus::Pending,
            payment_method: request.payment_method,
            service_type: request.service_type,
            subtotal: pricing.subtotal,
            delivery_fee: pricing.delivery_fee,
            surcharge_amount: pricing.surcharge_amount,
            tax: pricing.tax,
            total_price: pricing.total_price,
            payment_intent_id: None,
            customer_name: non_blank(&request.customer_name),
            customer_phone: non_blank(&request.customer_phone),
            table_no: non_blank(&request.table_no),
            special_instructions: non_blank(&request.special_instructions),
            created_at: now,
            updated_at: now,
        };

        self.state.db.orders().insert(&order, &lines).await?;

        info!(
            order_id = %order.id,
            restaurant_id = %order.restaurant_id,
            service_type = order.service_type.as_str(),
            total = %order.total_price,
            "Order created"
        );

        Ok(OrderCreated {
            success: true,
            order_id: order.id,
            status: order.status,
            payment_status: order.payment_status,
            pricing: PricingBreakdown::from(&pricing),
        })
    }

    /// Re-prices an unpaid order for the chosen payment method and records
    /// a payment intent for it.
    ///
    /// The charged amount is always the server-side total; a differing
    /// client `amount` is logged, not trusted.
    pub async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> ServiceResult<PaymentIntentCreated> {
        validate_uuid("order_id", &request.order_id)?;
        let amount = dollars("amount", request.amount)?;
        validate_payment_amount(amount)?;

        let restaurant = load_restaurant(&self.state, &request.restaurant_id).await?;
        let order_id = request.order_id.trim();

        let order = self
            .state
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .filter(|order| order.restaurant_id == restaurant.id)
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;

        let pricing = reprice_for_payment(&order, request.payment_method, &restaurant.pricing)?;

        if pricing.total_price != amount {
            warn!(
                order_id = %order.id,
                client_amount = %amount,
                server_amount = %pricing.total_price,
                "Client amount differs from server pricing"
            );
        }

        let payment_intent_id = format!("pi_{}", Uuid::new_v4().simple());
        self.state
            .db
            .orders()
            .record_payment_intent(
                &order.id,
                request.payment_method,
                &pricing,
                &payment_intent_id,
            )
            .await?;

        info!(
            order_id = %order.id,
            payment_intent_id = %payment_intent_id,
            payment_method = request.payment_method.as_str(),
            surcharge = %pricing.surcharge_amount,
            total = %pricing.total_price,
            "Payment intent created"
        );

        Ok(PaymentIntentCreated {
            success: true,
            order_id: order.id,
            payment_intent_id,
            amount_cents: pricing.total_price.cents(),
            pricing: PricingBreakdown::from(&pricing),
        })
    }

    /// Marks an order paid once the payment provider confirms it.
    pub async fn confirm_payment(&self, order_id: &str) -> ServiceResult<()> {
        validate_uuid("order_id", order_id)?;
        self.state.db.orders().mark_paid(order_id.trim()).await?;
        Ok(())
    }

    /// Prices a prospective order without storing anything.
    pub async fn preview_pricing(
        &self,
        request: &PricingPreviewRequest,
    ) -> ServiceResult<PricingBreakdown> {
        let restaurant = load_restaurant(&self.state, &request.restaurant_id).await?;

        let pricing = price_order(
            &OrderPricingInput {
                subtotal: dollars("subtotal", request.subtotal)?,
                delivery_fee: dollars("delivery_fee", request.delivery_fee)?,
                payment_method: request.payment_method,
                service_type: request.service_type,
            },
            &restaurant.pricing,
        )?;

        Ok(PricingBreakdown::from(&pricing))
    }

    /// Revenue, GST and count breakdowns over a restaurant's orders.
    pub async fn orders_summary(
        &self,
        restaurant_id: &str,
        filter: SummaryFilter,
    ) -> ServiceResult<OrdersSummaryResponse> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if end < start {
                return Err(ValidationError::InvalidFormat {
                    field: "end_date".to_string(),
                    reason: "must not be before start_date".to_string(),
                }
                .into());
            }
        }

        let restaurant = load_restaurant(&self.state, restaurant_id).await?;
        let orders = self
            .state
            .db
            .orders()
            .list_for_restaurant(&restaurant.id)
            .await?;

        let summary = summarize_orders(&orders, &filter);

        info!(
            restaurant_id = %restaurant.id,
            total_orders = summary.total_orders,
            "Orders summary computed"
        );

        Ok(OrdersSummaryResponse {
            success: true,
            restaurant_id: restaurant.id,
            filter,
            summary,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Converts a dollar amount to non-negative money.
fn dollars(field: &str, amount: Decimal) -> ValidationResult<Money> {
    let money = validate_dollars(field, amount)?;
    validate_non_negative(field, money)?;
    Ok(money)
}

fn to_order_line(item: &OrderItemRequest) -> ValidationResult<OrderLine> {
    if item.name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }
    if let Some(menu_id) = &item.menu_id {
        validate_uuid("menu_id", menu_id)?;
    }
    validate_quantity(item.quantity)?;

    Ok(OrderLine {
        menu_id: item.menu_id.as_ref().map(|id| id.trim().to_string()),
        name: item.name.trim().to_string(),
        name_en: non_blank(&item.name_en),
        quantity: item.quantity,
        unit_price: dollars("unit_price", item.unit_price)?,
    })
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
