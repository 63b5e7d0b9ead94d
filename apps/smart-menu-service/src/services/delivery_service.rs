//! Delivery quote service.
//!
//! ```text
//! request ─► validate ─► restaurant (needs coordinates)
//!                              │
//!              customer coordinates given? ── yes ──┐
//!                              │ no                 │
//!                          geocode ─────────────────┤
//!                                                   ▼
//!                      Haversine × road factor ─► fee calculator ─► quote
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use smart_menu_core::delivery::{calculate_delivery_fee, DeliveryFee, MissingConfig};
use smart_menu_core::geo::RouteEstimate;
use smart_menu_core::validation::{validate_address, validate_coordinates};
use smart_menu_core::{DeliveryPricingMode, ValidationError};

use crate::error::{ServiceError, ServiceResult};
use crate::geocoder::GeocodedAddress;
use crate::services::load_restaurant;
use crate::AppState;

/// `POST /delivery/calculate` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryQuoteRequest {
    pub restaurant_id: String,
    pub customer_address: String,
    /// Customer coordinates already known to the caller; skips geocoding.
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Successful delivery answer. Out of range is still a success.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeliveryQuote {
    Deliverable(DeliverableQuote),
    OutOfRange(OutOfRangeQuote),
}

impl DeliveryQuote {
    pub fn is_within_range(&self) -> bool {
        matches!(self, DeliveryQuote::Deliverable(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliverableQuote {
    pub success: bool,
    pub is_within_range: bool,
    pub customer_location: GeocodedAddress,
    /// Road distance, 1 dp.
    pub distance_km: f64,
    pub distance_text: String,
    pub duration_minutes: u32,
    pub duration_text: String,
    pub delivery_fee: f64,
    /// `None` when the restaurant never configured delivery pricing.
    pub pricing_mode: Option<DeliveryPricingMode>,
    pub free_delivery_above: f64,
    pub formatted_address: String,
    pub max_distance_km: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutOfRangeQuote {
    pub success: bool,
    pub is_within_range: bool,
    /// Always null.
    pub delivery_fee: Option<f64>,
    pub distance_km: f64,
    pub max_distance_km: f64,
    pub message: String,
    pub formatted_address: String,
}

/// Delivery quote service.
pub struct DeliveryService {
    state: Arc<AppState>,
}

impl DeliveryService {
    /// Create a new delivery service.
    pub fn new(state: Arc<AppState>) -> Self {
        DeliveryService { state }
    }

    /// Quotes delivery from the restaurant to the customer's address.
    ///
    /// ## Errors
    /// - `Validation` - bad restaurant id, empty address, bad coordinates
    /// - `NotFound` - unknown restaurant
    /// - `MissingConfiguration(Coordinates)` - restaurant has no location
    /// - `AddressNotFound` - the geocoder could not resolve the address
    pub async fn quote(&self, request: &DeliveryQuoteRequest) -> ServiceResult<DeliveryQuote> {
        let address = validate_address(&request.customer_address)?;
        let restaurant = load_restaurant(&self.state, &request.restaurant_id).await?;

        let Some(origin) = restaurant.location else {
            warn!(restaurant_id = %restaurant.id, "Delivery quote for restaurant without location");
            return Err(ServiceError::MissingConfiguration(MissingConfig::Coordinates));
        };

        let customer = self.locate_customer(request, &address).await?;

        let route = self
            .state
            .config
            .distance_model
            .estimate_route(&origin, &customer.location);

        let fee = calculate_delivery_fee(
            route.distance_km,
            restaurant.delivery_settings.as_ref(),
            &restaurant.delivery_rates,
        )?;

        info!(
            restaurant_id = %restaurant.id,
            distance_km = route.distance_km,
            within_range = fee.is_within_range(),
            fee = ?fee.fee().map(|f| f.cents()),
            "Delivery quoted"
        );

        let free_delivery_above = restaurant
            .delivery_settings
            .as_ref()
            .map(|s| s.free_delivery_above.to_f64())
            .unwrap_or_default();

        Ok(build_quote(&fee, &route, customer, free_delivery_above))
    }

    async fn locate_customer(
        &self,
        request: &DeliveryQuoteRequest,
        address: &str,
    ) -> ServiceResult<GeocodedAddress> {
        match (request.latitude, request.longitude) {
            (Some(lat), Some(lng)) => Ok(GeocodedAddress {
                location: validate_coordinates(lat, lng)?,
                formatted_address: address.to_string(),
            }),
            (None, None) => self.state.geocoder.geocode(address).await.map_err(|e| {
                warn!(error = %e, "Customer address could not be geocoded");
                ServiceError::AddressNotFound(e)
            }),
            (Some(_), None) => Err(ValidationError::Required {
                field: "longitude".to_string(),
            }
            .into()),
            (None, Some(_)) => Err(ValidationError::Required {
                field: "latitude".to_string(),
            }
            .into()),
        }
    }
}

fn build_quote(
    fee: &DeliveryFee,
    route: &RouteEstimate,
    customer: GeocodedAddress,
    free_delivery_above: f64,
) -> DeliveryQuote {
    let distance_km = route.display_distance_km();
    let quote = fee.to_quote();

    let pricing_mode = match fee {
        DeliveryFee::WithinRange { pricing_mode, .. } => Some(*pricing_mode),
        DeliveryFee::OutOfRange { .. } | DeliveryFee::NotConfigured { .. } => None,
    };

    match quote.fee {
        Some(delivery_fee) => DeliveryQuote::Deliverable(DeliverableQuote {
            success: true,
            is_within_range: true,
            formatted_address: customer.formatted_address.clone(),
            customer_location: customer,
            distance_km,
            distance_text: format!("{} km", distance_km),
            duration_minutes: route.duration_minutes,
            duration_text: format!("{} mins", route.duration_minutes),
            delivery_fee,
            pricing_mode,
            free_delivery_above,
            max_distance_km: quote.max_distance_km,
            message: quote.message,
        }),
        None => DeliveryQuote::OutOfRange(OutOfRangeQuote {
            success: true,
            is_within_range: false,
            delivery_fee: None,
            distance_km,
            max_distance_km: quote.max_distance_km,
            message: quote.message,
            formatted_address: customer.formatted_address,
        }),
    }
}
