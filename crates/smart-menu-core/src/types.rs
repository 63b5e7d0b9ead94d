//! # Domain Types
//!
//! Core domain types used throughout Smart Menu.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌─────────────────┐   ┌─────────────────┐      │
//! │  │   Restaurant     │   │    MenuItem     │   │     Order       │      │
//! │  │  ──────────────  │   │  ─────────────  │   │  ─────────────  │      │
//! │  │  location        │   │  price          │   │  subtotal       │      │
//! │  │  PricingSettings │   │  is_best_seller │   │  delivery_fee   │      │
//! │  │  DeliverySettings│   │  pinned         │   │  surcharge      │      │
//! │  │  DeliveryRate[]  │   └─────────────────┘   │  tax / total    │      │
//! │  └──────────────────┘                         └─────────────────┘      │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │ SurchargeRate   │   │ PaymentMethod   │       │
//! │  │  1500 bps (GST) │   │  250 bps = 2.5% │   │  card / bank /  │       │
//! │  └─────────────────┘   └─────────────────┘   │  cash_at_counter│       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::DEFAULT_CATEGORY;

// =============================================================================
// Rates
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%. New Zealand GST is 1500 bps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// New Zealand Goods and Services Tax, 15%.
    pub const NZ_GST: TaxRate = TaxRate(1500);

    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::NZ_GST
    }
}

/// Credit card surcharge rate in basis points (250 = 2.50%).
///
/// Construct from owner input through
/// [`crate::validation::validate_surcharge_rate_percent`], which rejects
/// anything outside 0–10%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SurchargeRate(u32);

impl SurchargeRate {
    /// Rate applied when a restaurant enables surcharging without choosing one.
    pub const DEFAULT: SurchargeRate = SurchargeRate(250);

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        SurchargeRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (e.g. `2.50`).
    pub fn percent(&self) -> Decimal {
        Decimal::new(self.0 as i64, 2)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for SurchargeRate {
    fn default() -> Self {
        SurchargeRate::DEFAULT
    }
}

// =============================================================================
// Enums
// =============================================================================

/// How the customer pays for an order.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment through the payment processor. Only method that
    /// can attract a surcharge.
    Card,
    /// Direct bank transfer.
    BankTransfer,
    /// Cash paid at the counter. Older clients send `"cash"`.
    #[serde(alias = "cash")]
    CashAtCounter,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::CashAtCounter => "cash_at_counter",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Card
    }
}

/// How the order reaches the customer.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    DineIn,
    Pickup,
    Delivery,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::DineIn => "dine_in",
            ServiceType::Pickup => "pickup",
            ServiceType::Delivery => "delivery",
        }
    }
}

impl Default for ServiceType {
    fn default() -> Self {
        ServiceType::DineIn
    }
}

/// Kitchen-facing status of an order.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, waiting for the customer to pay.
    PendingPayment,
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Completed,
    /// Excluded from best-seller counts.
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::PendingPayment
    }
}

/// Payment progress of an order.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    /// A payment intent exists and the processor is working on it.
    Processing,
    /// Pricing fields are frozen from here on.
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

/// Delivery pricing strategy chosen by the restaurant.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPricingMode {
    /// `base_fee + distance × price_per_km`, capped by `max_distance_km`.
    PerKm,
    /// Flat price per distance bracket.
    Tier,
}

impl DeliveryPricingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryPricingMode::PerKm => "per_km",
            DeliveryPricingMode::Tier => "tier",
        }
    }

    /// Parses the stored/wire representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "per_km" => Some(DeliveryPricingMode::PerKm),
            "tier" => Some(DeliveryPricingMode::Tier),
            _ => None,
        }
    }
}

// =============================================================================
// Location
// =============================================================================

/// A WGS84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    #[inline]
    pub const fn new(lat: f64, lng: f64) -> Self {
        GeoPoint { lat, lng }
    }
}

// =============================================================================
// Restaurant Settings
// =============================================================================

/// Tax and surcharge settings used by the order pricing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingSettings {
    /// Whether GST is reported on orders. Defaults to true.
    pub gst_registered: bool,
    pub gst_number: Option<String>,
    pub credit_card_surcharge_enabled: bool,
    pub credit_card_surcharge_rate: SurchargeRate,
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            gst_registered: true,
            gst_number: None,
            credit_card_surcharge_enabled: false,
            credit_card_surcharge_rate: SurchargeRate::DEFAULT,
        }
    }
}

/// Per-restaurant delivery pricing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeliverySettings {
    pub pricing_mode: DeliveryPricingMode,
    pub base_fee: Money,
    pub price_per_km: Money,
    /// Upper bound for per-km pricing. Tier pricing uses its largest tier.
    pub max_distance_km: f64,
    /// Order value above which the restaurant advertises free delivery.
    /// Zero means none. Reported alongside quotes, never applied to fees.
    pub free_delivery_above: Money,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        DeliverySettings {
            pricing_mode: DeliveryPricingMode::PerKm,
            base_fee: Money::from_cents(300),
            price_per_km: Money::from_cents(150),
            max_distance_km: 15.0,
            free_delivery_above: Money::zero(),
        }
    }
}

/// One delivery bracket: orders up to `distance_km` cost `price`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeliveryRate {
    pub distance_km: f64,
    pub price: Money,
}

impl DeliveryRate {
    #[inline]
    pub const fn new(distance_km: f64, price: Money) -> Self {
        DeliveryRate { distance_km, price }
    }
}

/// A restaurant together with everything the pricing core needs.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    /// Fixed pickup point. Required for delivery quotes.
    pub location: Option<GeoPoint>,
    pub pricing: PricingSettings,
    /// `None` when the owner never configured delivery pricing.
    pub delivery_settings: Option<DeliverySettings>,
    pub delivery_rates: Vec<DeliveryRate>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Menu
// =============================================================================

/// A menu item as stored.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MenuItem {
    pub id: String,
    pub restaurant_id: String,
    pub name_original: String,
    pub name_english: Option<String>,
    pub image_url: Option<String>,
    pub price: Money,
    pub category: String,
    pub is_active: bool,
    /// Persisted "show as bestseller" flag, maintained by reconciliation.
    pub is_best_seller: bool,
    /// Owner's manual pin. Reconciliation never clears a pinned item.
    pub best_seller_pinned: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    /// Category for display, falling back to the default.
    pub fn category_or_default(&self) -> &str {
        if self.category.trim().is_empty() {
            DEFAULT_CATEGORY
        } else {
            &self.category
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// A line on an order.
/// Name and price are frozen at order time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    /// Missing for free-form lines; those never count towards best sellers.
    pub menu_id: Option<String>,
    pub name: String,
    pub name_en: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
}

impl OrderLine {
    /// `unit_price × quantity`; `None` when it overflows.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// A customer order with its pricing fields.
///
/// Invariant: `total_price == subtotal + delivery_fee + surcharge_amount`.
/// `tax` is the GST contained in `total_price`, never added to it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub restaurant_id: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub service_type: ServiceType,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub surcharge_amount: Money,
    pub tax: Money,
    pub total_price: Money,
    pub payment_intent_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub table_no: Option<String>,
    pub special_instructions: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the pricing fields as one value.
    pub fn pricing(&self) -> crate::pricing::OrderPricing {
        crate::pricing::OrderPricing {
            subtotal: self.subtotal,
            delivery_fee: self.delivery_fee,
            surcharge_amount: self.surcharge_amount,
            tax: self.tax,
            total_price: self.total_price,
        }
    }

    /// Voided/cancelled orders drop out of counts and best sellers.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.status == OrderStatus::Cancelled
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
