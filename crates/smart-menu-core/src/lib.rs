//! # smart-menu-core: Pure Business Logic for Smart Menu
//!
//! The money-handling heart of the platform: everything that computes a
//! number a customer pays or an owner reports lives here, as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Smart Menu Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              smart-menu-service (orchestration)                 │   │
//! │  │   delivery quote, order creation, best sellers, usage limits    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ smart-menu-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │  ┌────────┐ ┌──────────┐ ┌─────────┐ ┌─────────────┐ ┌───────┐ │   │
//! │  │  │  geo   │ │ delivery │ │ pricing │ │ bestsellers │ │ money │ │   │
//! │  │  │Haversine│ │ per-km / │ │ GST 3/23│ │ rank + flag │ │ cents │ │   │
//! │  │  │ road ×  │ │ tiers    │ │surcharge│ │ reconcile   │ │       │ │   │
//! │  │  └────────┘ └──────────┘ └─────────┘ └─────────────┘ └───────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                smart-menu-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer cents (no floating point!)
//! - [`types`] - Domain types (Restaurant, MenuItem, Order, rates)
//! - [`geo`] - Haversine distance, road distance and duration estimates
//! - [`delivery`] - Delivery fee calculator (per-km and tiered)
//! - [`pricing`] - Surcharge, GST extraction and order total assembly
//! - [`bestsellers`] - Best-seller ranking and flag reconciliation
//! - [`summary`] - Orders summary report
//! - [`usage`] - Plan usage limits
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use smart_menu_core::money::Money;
//! use smart_menu_core::pricing::calculate_gst;
//!
//! // $115.00 GST-inclusive contains $15.00 of GST
//! let gst = calculate_gst(Money::from_cents(11500), true);
//! assert_eq!(gst.cents(), 1500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bestsellers;
pub mod delivery;
pub mod error;
pub mod geo;
pub mod money;
pub mod pricing;
pub mod summary;
pub mod types;
pub mod usage;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default category for menu items that have none.
pub const DEFAULT_CATEGORY: &str = "Main Course";

/// Maximum quantity of a single menu item on one order line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest subtotal or delivery fee an order may carry ($1,000,000.00).
///
/// Keeps every derived amount (surcharge, total, GST) far inside `i64` cents.
pub const MAX_ORDER_AMOUNT: Money = Money::from_cents(100_000_000);

/// Largest configurable credit card surcharge, in basis points (10%).
pub const MAX_SURCHARGE_BPS: u32 = 1000;

/// Longest best-seller lookback window accepted, in days.
pub const MAX_LOOKBACK_DAYS: i64 = 365;

/// Largest best-seller list a caller may request.
pub const MAX_BEST_SELLER_LIMIT: usize = 50;
