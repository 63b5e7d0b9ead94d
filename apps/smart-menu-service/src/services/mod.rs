//! Service implementations.
//!
//! Each service holds the shared [`crate::AppState`] and returns
//! serde-serializable response contracts.

pub mod best_sellers_service;
pub mod delivery_service;
pub mod order_service;
pub mod settings_service;
pub mod usage_service;

pub use best_sellers_service::BestSellerService;
pub use delivery_service::DeliveryService;
pub use order_service::OrderService;
pub use settings_service::SettingsService;
pub use usage_service::UsageService;

use smart_menu_core::validation::validate_uuid;
use smart_menu_core::Restaurant;

use crate::error::{ServiceError, ServiceResult};
use crate::AppState;

/// Validates `restaurant_id` and loads the restaurant.
pub(crate) async fn load_restaurant(state: &AppState, restaurant_id: &str) -> ServiceResult<Restaurant> {
    validate_uuid("restaurant_id", restaurant_id)?;

    state
        .db
        .restaurants()
        .get_by_id(restaurant_id.trim())
        .await?
        .ok_or_else(|| ServiceError::not_found("Restaurant", restaurant_id))
}
