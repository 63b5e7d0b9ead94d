//! # Smart Menu Service
//!
//! Orchestration layer: loads restaurant data, calls the pure engine in
//! `smart-menu-core`, persists through `smart-menu-db` and shapes the JSON
//! contracts an HTTP layer (or the `smart-menu` CLI) returns.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Smart Menu Services                             │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │DeliveryService │  │  OrderService  │  │  BestSellerService         ││
//! │  │                │  │                │  │                            ││
//! │  │ • quote        │  │ • create       │  │ • get_best_sellers         ││
//! │  │                │  │ • payment      │  │ • update_bestseller_flags  ││
//! │  │                │  │   intent       │  │ • update_all_restaurants   ││
//! │  │                │  │ • summary      │  │ • pin_menu_item            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │SettingsService │  │  UsageService  │                                │
//! │  │                │  │                │                                │
//! │  │ • surcharge/GST│  │ • check_and_   │                                │
//! │  │ • location     │  │   consume      │                                │
//! │  │ • delivery     │  │                │                                │
//! │  └────────────────┘  └────────────────┘                                │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────────────┐                      │  │
//! │  │  │   SQLite     │  │  Geocoder            │                      │  │
//! │  │  │              │  │                      │                      │  │
//! │  │  │ Primary data │  │ Nominatim (reqwest)  │                      │  │
//! │  │  │ store        │  │ behind a trait       │                      │  │
//! │  │  └──────────────┘  └──────────────────────┘                      │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`] for the environment variables and their defaults.

pub mod config;
pub mod error;
pub mod geocoder;
pub mod services;

use std::sync::Arc;

// Re-exports
pub use config::ServiceConfig;
pub use error::{ServiceError, ServiceResult};
pub use geocoder::{Geocoder, NominatimGeocoder};
pub use smart_menu_db::Database;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub geocoder: Arc<dyn Geocoder>,
    pub config: ServiceConfig,
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the service tests.

    use std::sync::Arc;

    use chrono::{DateTime, Utc};
    use smart_menu_core::{
        GeoPoint, MenuItem, Money, Order, OrderLine, OrderStatus, PaymentMethod, PaymentStatus,
        PricingSettings, Restaurant, ServiceType,
    };
    use smart_menu_db::{Database, DbConfig};
    use uuid::Uuid;

    use crate::geocoder::testing::ScriptedGeocoder;
    use crate::{AppState, ServiceConfig};

    pub const AUCKLAND: GeoPoint = GeoPoint::new(-36.8485, 174.7633);

    pub async fn state_with(geocoder: ScriptedGeocoder) -> Arc<AppState> {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Arc::new(AppState {
            db,
            geocoder: Arc::new(geocoder),
            config: ServiceConfig::default(),
        })
    }

    pub async fn state() -> Arc<AppState> {
        state_with(ScriptedGeocoder::new()).await
    }

    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn restaurant(name: &str) -> Restaurant {
        let now = Utc::now();
        Restaurant {
            id: new_id(),
            name: name.to_string(),
            location: Some(AUCKLAND),
            pricing: PricingSettings::default(),
            delivery_settings: None,
            delivery_rates: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn menu_item(restaurant_id: &str, name: &str, pinned: bool) -> MenuItem {
        let now = Utc::now();
        MenuItem {
            id: new_id(),
            restaurant_id: restaurant_id.to_string(),
            name_original: name.to_string(),
            name_english: None,
            image_url: Some(format!("https://img.example/{}.jpg", name)),
            price: Money::from_cents(1500),
            category: "Mains".to_string(),
            is_active: true,
            is_best_seller: pinned,
            best_seller_pinned: pinned,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn line(item: &MenuItem, quantity: i64) -> OrderLine {
        OrderLine {
            menu_id: Some(item.id.clone()),
            name: item.name_original.clone(),
            name_en: item.name_english.clone(),
            quantity,
            unit_price: item.price,
        }
    }

    /// A paid dine-in order whose subtotal matches `lines`.
    pub fn order(restaurant_id: &str, lines: &[OrderLine], created_at: DateTime<Utc>) -> Order {
        let subtotal = smart_menu_core::pricing::sum_lines(lines).unwrap();
        Order {
            id: new_id(),
            restaurant_id: restaurant_id.to_string(),
            status: OrderStatus::Completed,
            payment_status: PaymentStatus::Paid,
            payment_method: PaymentMethod::CashAtCounter,
            service_type: ServiceType::DineIn,
            subtotal,
            delivery_fee: Money::zero(),
            surcharge_amount: Money::zero(),
            tax: Money::zero(),
            total_price: subtotal,
            payment_intent_id: None,
            customer_name: None,
            customer_phone: None,
            table_no: None,
            special_instructions: None,
            created_at,
            updated_at: created_at,
        }
    }
}
