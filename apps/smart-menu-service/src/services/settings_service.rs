//! Restaurant settings service.
//!
//! The validation boundary for everything an owner configures that pricing
//! or delivery quotes later depend on. Out-of-range values are rejected,
//! never clamped.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use smart_menu_core::validation::{
    validate_coordinates, validate_delivery_rates, validate_delivery_settings, validate_dollars,
    validate_surcharge_rate_percent, ValidationResult,
};
use smart_menu_core::{
    DeliveryPricingMode, DeliveryRate, DeliverySettings, GeoPoint, Restaurant,
    ValidationError,
};

use crate::error::ServiceResult;
use crate::services::load_restaurant;
use crate::AppState;

// =============================================================================
// Contracts
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurchargeSettingsRequest {
    pub credit_card_surcharge_enabled: bool,
    /// Percent, 0 to 10.
    pub credit_card_surcharge_rate: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GstSettingsRequest {
    pub gst_registered: bool,
    #[serde(default)]
    pub gst_number: Option<String>,
}

/// Both coordinates set the location; both absent clear it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRequest {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRateRequest {
    pub distance_km: f64,
    pub price: Decimal,
}

/// `pricing_mode: None` marks delivery pricing as not configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfigRequest {
    pub pricing_mode: Option<DeliveryPricingMode>,
    pub base_fee: Decimal,
    pub price_per_km: Decimal,
    pub max_distance_km: f64,
    #[serde(default)]
    pub free_delivery_above: Decimal,
    #[serde(default)]
    pub delivery_rates: Vec<DeliveryRateRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryRateView {
    pub distance_km: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliverySettingsView {
    pub pricing_mode: DeliveryPricingMode,
    pub base_fee: f64,
    pub price_per_km: f64,
    pub max_distance_km: f64,
    pub free_delivery_above: f64,
}

/// Everything pricing-related a restaurant has configured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestaurantSettings {
    pub success: bool,
    pub restaurant_id: String,
    pub name: String,
    pub gst_registered: bool,
    pub gst_number: Option<String>,
    pub credit_card_surcharge_enabled: bool,
    /// Percent.
    pub credit_card_surcharge_rate: Decimal,
    pub location: Option<GeoPoint>,
    pub delivery_settings: Option<DeliverySettingsView>,
    pub delivery_rates: Vec<DeliveryRateView>,
}

impl From<Restaurant> for RestaurantSettings {
    fn from(restaurant: Restaurant) -> Self {
        RestaurantSettings {
            success: true,
            restaurant_id: restaurant.id,
            name: restaurant.name,
            gst_registered: restaurant.pricing.gst_registered,
            gst_number: restaurant.pricing.gst_number,
            credit_card_surcharge_enabled: restaurant.pricing.credit_card_surcharge_enabled,
            credit_card_surcharge_rate: restaurant.pricing.credit_card_surcharge_rate.percent(),
            location: restaurant.location,
            delivery_settings: restaurant.delivery_settings.map(|s| DeliverySettingsView {
                pricing_mode: s.pricing_mode,
                base_fee: s.base_fee.to_f64(),
                price_per_km: s.price_per_km.to_f64(),
                max_distance_km: s.max_distance_km,
                free_delivery_above: s.free_delivery_above.to_f64(),
            }),
            delivery_rates: restaurant
                .delivery_rates
                .iter()
                .map(|r| DeliveryRateView {
                    distance_km: r.distance_km,
                    price: r.price.to_f64(),
                })
                .collect(),
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Settings service implementation.
pub struct SettingsService {
    state: Arc<AppState>,
}

impl SettingsService {
    /// Create a new settings service.
    pub fn new(state: Arc<AppState>) -> Self {
        SettingsService { state }
    }

    pub async fn get_settings(&self, restaurant_id: &str) -> ServiceResult<RestaurantSettings> {
        let restaurant = load_restaurant(&self.state, restaurant_id).await?;
        Ok(restaurant.into())
    }

    /// Enables or disables the card surcharge and sets its rate.
    pub async fn update_surcharge(
        &self,
        restaurant_id: &str,
        request: &SurchargeSettingsRequest,
    ) -> ServiceResult<RestaurantSettings> {
        let rate = validate_surcharge_rate_percent(request.credit_card_surcharge_rate)?;
        let restaurant = load_restaurant(&self.state, restaurant_id).await?;

        let mut pricing = restaurant.pricing;
        pricing.credit_card_surcharge_enabled = request.credit_card_surcharge_enabled;
        pricing.credit_card_surcharge_rate = rate;

        self.state
            .db
            .restaurants()
            .update_pricing_settings(&restaurant.id, &pricing)
            .await?;

        self.get_settings(&restaurant.id).await
    }

    /// Sets GST registration. Unregistered restaurants report zero GST.
    pub async fn update_gst(
        &self,
        restaurant_id: &str,
        request: &GstSettingsRequest,
    ) -> ServiceResult<RestaurantSettings> {
        let restaurant = load_restaurant(&self.state, restaurant_id).await?;

        let mut pricing = restaurant.pricing;
        pricing.gst_registered = request.gst_registered;
        pricing.gst_number = request
            .gst_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        self.state
            .db
            .restaurants()
            .update_pricing_settings(&restaurant.id, &pricing)
            .await?;

        info!(
            restaurant_id = %restaurant.id,
            gst_registered = pricing.gst_registered,
            "GST settings updated"
        );

        self.get_settings(&restaurant.id).await
    }

    /// Sets or clears the pickup location delivery quotes start from.
    pub async fn update_location(
        &self,
        restaurant_id: &str,
        request: &LocationRequest,
    ) -> ServiceResult<RestaurantSettings> {
        let location = match (request.latitude, request.longitude) {
            (Some(lat), Some(lng)) => Some(validate_coordinates(lat, lng)?),
            (None, None) => None,
            (Some(_), None) => return Err(required("longitude").into()),
            (None, Some(_)) => return Err(required("latitude").into()),
        };

        let restaurant = load_restaurant(&self.state, restaurant_id).await?;
        self.state
            .db
            .restaurants()
            .update_location(&restaurant.id, location)
            .await?;

        info!(restaurant_id = %restaurant.id, ?location, "Restaurant location updated");
        self.get_settings(&restaurant.id).await
    }

    /// Replaces the delivery pricing mode, per-km settings and tiers.
    pub async fn update_delivery(
        &self,
        restaurant_id: &str,
        request: &DeliveryConfigRequest,
    ) -> ServiceResult<RestaurantSettings> {
        let (settings, rates) = delivery_config(request)?;
        let restaurant = load_restaurant(&self.state, restaurant_id).await?;

        self.state
            .db
            .restaurants()
            .replace_delivery_config(&restaurant.id, settings.as_ref(), &rates)
            .await?;

        self.get_settings(&restaurant.id).await
    }
}

fn required(field: &str) -> ValidationError {
    ValidationError::Required {
        field: field.to_string(),
    }
}

fn delivery_config(
    request: &DeliveryConfigRequest,
) -> ValidationResult<(Option<DeliverySettings>, Vec<DeliveryRate>)> {
    let settings = match request.pricing_mode {
        Some(pricing_mode) => {
            let settings = DeliverySettings {
                pricing_mode,
                base_fee: validate_dollars("base_fee", request.base_fee)?,
                price_per_km: validate_dollars("price_per_km", request.price_per_km)?,
                max_distance_km: request.max_distance_km,
                free_delivery_above: validate_dollars(
                    "free_delivery_above",
                    request.free_delivery_above,
                )?,
            };
            validate_delivery_settings(&settings)?;
            Some(settings)
        }
        None => None,
    };

    let rates = request
        .delivery_rates
        .iter()
        .map(|r| -> ValidationResult<DeliveryRate> {
            Ok(DeliveryRate::new(r.distance_km, validate_dollars("price", r.price)?))
        })
        .collect::<ValidationResult<Vec<_>>>()?;
    validate_delivery_rates(&rates)?;

    Ok((settings, rates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    async fn setup() -> (SettingsService, String) {
        let state = test_support::state().await;
        let restaurant = test_support::restaurant("Settings Kai");
        state.db.restaurants().insert(&restaurant).await.unwrap();
        (SettingsService::new(state), restaurant.id)
    }

    fn tiers(rates: &[(f64, i64)]) -> DeliveryConfigRequest {
        DeliveryConfigRequest {
            pricing_mode: Some(DeliveryPricingMode::Tier),
            base_fee: Decimal::new(300, 2),
            price_per_km: Decimal::new(150, 2),
            max_distance_km: 15.0,
            free_delivery_above: Decimal::ZERO,
            delivery_rates: rates
                .iter()
                .map(|(km, cents)| DeliveryRateRequest {
                    distance_km: *km,
                    price: Decimal::new(*cents, 2),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_surcharge_rate_is_validated_not_clamped() {
        let (service, id) = setup().await;

        let settings = service
            .update_surcharge(
                &id,
                &SurchargeSettingsRequest {
                    credit_card_surcharge_enabled: true,
                    credit_card_surcharge_rate: Decimal::new(35, 1),
                },
            )
            .await
            .unwrap();
        assert!(settings.credit_card_surcharge_enabled);
        assert_eq!(settings.credit_card_surcharge_rate, Decimal::new(350, 2));

        for bad in [Decimal::new(105, 1), Decimal::new(-1, 0)] {
            let err = service
                .update_surcharge(
                    &id,
                    &SurchargeSettingsRequest {
                        credit_card_surcharge_enabled: true,
                        credit_card_surcharge_rate: bad,
                    },
                )
                .await
                .unwrap_err();
            assert_eq!(err.error_code(), "VALIDATION_ERROR");
        }

        let unchanged = service.get_settings(&id).await.unwrap();
        assert_eq!(unchanged.credit_card_surcharge_rate, Decimal::new(350, 2));
    }

    #[tokio::test]
    async fn test_sub_unit_precision_is_rejected() {
        let (service, id) = setup().await;

        let err = service
            .update_surcharge(
                &id,
                &SurchargeSettingsRequest {
                    credit_card_surcharge_enabled: true,
                    credit_card_surcharge_rate: Decimal::new(2505, 3),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(
            err.to_string(),
            "credit_card_surcharge_rate has invalid format: must have at most 2 decimal places"
        );

        service.update_delivery(&id, &tiers(&[(3.0, 500)])).await.unwrap();

        let err = service
            .update_delivery(
                &id,
                &DeliveryConfigRequest {
                    price_per_km: Decimal::new(1505, 3),
                    ..tiers(&[(3.0, 500)])
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "price_per_km has invalid format: must have at most 2 decimal places"
        );

        let err = service
            .update_delivery(
                &id,
                &DeliveryConfigRequest {
                    delivery_rates: vec![DeliveryRateRequest {
                        distance_km: 3.0,
                        price: Decimal::new(5001, 3),
                    }],
                    ..tiers(&[])
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let unchanged = service.get_settings(&id).await.unwrap();
        assert!(!unchanged.credit_card_surcharge_enabled);
        assert_eq!(unchanged.delivery_rates.len(), 1);
        assert_eq!(unchanged.delivery_rates[0].price, 5.0);
    }

    #[tokio::test]
    async fn test_gst_settings() {
        let (service, id) = setup().await;

        let settings = service
            .update_gst(
                &id,
                &GstSettingsRequest {
                    gst_registered: false,
                    gst_number: Some("  ".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(!settings.gst_registered);
        assert_eq!(settings.gst_number, None);

        let settings = service
            .update_gst(
                &id,
                &GstSettingsRequest {
                    gst_registered: true,
                    gst_number: Some(" 123-456-789 ".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(settings.gst_registered);
        assert_eq!(settings.gst_number.as_deref(), Some("123-456-789"));
    }

    #[tokio::test]
    async fn test_location_updates() {
        let (service, id) = setup().await;

        let settings = service
            .update_location(
                &id,
                &LocationRequest {
                    latitude: Some(-41.2865),
                    longitude: Some(174.7762),
                },
            )
            .await
            .unwrap();
        assert_eq!(settings.location, Some(GeoPoint::new(-41.2865, 174.7762)));

        let err = service
            .update_location(
                &id,
                &LocationRequest {
                    latitude: Some(-95.0),
                    longitude: Some(174.0),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err = service
            .update_location(
                &id,
                &LocationRequest {
                    latitude: Some(-41.0),
                    longitude: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "longitude is required");

        let cleared = service
            .update_location(
                &id,
                &LocationRequest {
                    latitude: None,
                    longitude: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.location, None);
    }

    #[tokio::test]
    async fn test_delivery_config_replace_and_clear() {
        let (service, id) = setup().await;

        let settings = service
            .update_delivery(&id, &tiers(&[(8.0, 1000), (3.0, 500), (5.0, 750)]))
            .await
            .unwrap();
        let view = settings.delivery_settings.unwrap();
        assert_eq!(view.pricing_mode, DeliveryPricingMode::Tier);
        let distances: Vec<f64> = settings.delivery_rates.iter().map(|r| r.distance_km).collect();
        assert_eq!(distances, vec![3.0, 5.0, 8.0]);
        assert_eq!(settings.delivery_rates[1].price, 7.5);

        let err = service
            .update_delivery(&id, &tiers(&[(3.0, 500), (3.0, 600)]))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err = service
            .update_delivery(
                &id,
                &DeliveryConfigRequest {
                    pricing_mode: Some(DeliveryPricingMode::PerKm),
                    max_distance_km: 0.0,
                    ..tiers(&[])
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let cleared = service
            .update_delivery(
                &id,
                &DeliveryConfigRequest {
                    pricing_mode: None,
                    ..tiers(&[])
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.delivery_settings, None);
        assert!(cleared.delivery_rates.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_restaurant() {
        let (service, _) = setup().await;
        let err = service
            .get_settings(&test_support::new_id())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }
}
