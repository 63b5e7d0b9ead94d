//! # Geocoder
//!
//! Free-text address → coordinates.
//!
//! ```text
//! DeliveryService ──► dyn Geocoder ──┬── NominatimGeocoder (reqwest, production)
//!                                    └── ScriptedGeocoder  (tests)
//! ```
//!
//! Every failure (no match, timeout, HTTP status, transport, malformed body)
//! comes back as a [`GeocodeError`]; the delivery service reports all of them
//! to the customer as "address not found".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use smart_menu_core::validation::validate_coordinates;
use smart_menu_core::GeoPoint;

use crate::config::GeocoderConfig;

/// A resolved address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedAddress {
    #[serde(flatten)]
    pub location: GeoPoint,
    pub formatted_address: String,
}

/// Why an address could not be resolved.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("No results for '{query}'")]
    NoMatch { query: String },

    #[error("Geocoder timed out")]
    Timeout,

    #[error("Geocoder returned HTTP {0}")]
    Status(u16),

    #[error("Geocoder request failed: {0}")]
    Transport(String),

    #[error("Geocoder response malformed: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeocodeError::Timeout
        } else if err.is_decode() {
            GeocodeError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            GeocodeError::Status(status.as_u16())
        } else {
            GeocodeError::Transport(err.to_string())
        }
    }
}

/// Resolves free-text addresses.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeocodeError>;
}

// =============================================================================
// Nominatim
// =============================================================================

/// One entry of a Nominatim `format=json` response. Coordinates are strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

/// Geocoder backed by a Nominatim-compatible `search` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    config: GeocoderConfig,
}

impl NominatimGeocoder {
    pub fn new(config: GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        Ok(NominatimGeocoder { client, config })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeocodeError> {
        debug!(address = %address, "Geocoding address");

        let response = self
            .client
            .get(&self.config.url)
            .query(&[
                ("q", address),
                ("format", "json"),
                ("limit", "1"),
                ("countrycodes", self.config.country.as_str()),
                ("addressdetails", "1"),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Geocoding request failed");
                GeocodeError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Geocoder returned an error status");
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let places: Vec<NominatimPlace> = response.json().await?;
        first_match(places, address)
    }
}

fn first_match(places: Vec<NominatimPlace>, query: &str) -> Result<GeocodedAddress, GeocodeError> {
    let Some(place) = places.into_iter().next() else {
        warn!(address = %query, "Geocoding found no results");
        return Err(GeocodeError::NoMatch {
            query: query.to_string(),
        });
    };

    let parse = |field: &str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| GeocodeError::MalformedResponse(format!("{} '{}'", field, value)))
    };
    let lat = parse("lat", &place.lat)?;
    let lng = parse("lon", &place.lon)?;
    let location =
        validate_coordinates(lat, lng).map_err(|e| GeocodeError::MalformedResponse(e.to_string()))?;

    Ok(GeocodedAddress {
        location,
        formatted_address: place.display_name.unwrap_or_else(|| query.to_string()),
    })
}

// =============================================================================
// Test Double
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers from a fixed table; unknown addresses are `NoMatch`.
    #[derive(Debug, Default)]
    pub struct ScriptedGeocoder {
        answers: HashMap<String, GeocodedAddress>,
        calls: AtomicUsize,
    }

    impl ScriptedGeocoder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, address: &str, lat: f64, lng: f64) -> Self {
            self.answers.insert(
                address.to_string(),
                GeocodedAddress {
                    location: GeoPoint::new(lat, lng),
                    formatted_address: format!("{}, New Zealand", address),
                },
            );
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Geocoder for ScriptedGeocoder {
        async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answers
                .get(address)
                .cloned()
                .ok_or_else(|| GeocodeError::NoMatch {
                    query: address.to_string(),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn places(json: &str) -> Vec<NominatimPlace> {
        serde_json::from_str(json).unwrap()
    }

    /// Geocoder pointed at a local listener.
    async fn local_geocoder(timeout: Duration) -> (NominatimGeocoder, TcpListener) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let geocoder = NominatimGeocoder::new(GeocoderConfig {
            url: format!("http://{}/search", addr),
            country: "nz".to_string(),
            user_agent: "smart-menu-tests".to_string(),
            timeout,
        })
        .unwrap();
        (geocoder, listener)
    }

    /// Answers one request with a raw HTTP response.
    fn respond_once(listener: TcpListener, response: String) {
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (geocoder, listener) = local_geocoder(Duration::from_secs(5)).await;
        respond_once(
            listener,
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                .to_string(),
        );

        let err = geocoder.geocode("1 Queen Street").await.unwrap_err();
        assert!(matches!(err, GeocodeError::Status(503)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_unresponsive_server_times_out() {
        let (geocoder, listener) = local_geocoder(Duration::from_secs(1)).await;
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let err = geocoder.geocode("1 Queen Street").await.unwrap_err();
        assert!(matches!(err, GeocodeError::Timeout), "{:?}", err);
    }

    #[tokio::test]
    async fn test_successful_lookup_over_http() {
        let (geocoder, listener) = local_geocoder(Duration::from_secs(5)).await;
        let body = r#"[{"lat": "-36.8485", "lon": "174.7633", "display_name": "Queen Street, Auckland"}]"#;
        respond_once(
            listener,
            format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            ),
        );

        let result = geocoder.geocode("1 Queen Street").await.unwrap();
        assert_eq!(result.location, GeoPoint::new(-36.8485, 174.7633));
        assert_eq!(result.formatted_address, "Queen Street, Auckland");
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let (geocoder, listener) = local_geocoder(Duration::from_secs(5)).await;
        respond_once(
            listener,
            "HTTP/1.1 200 OK\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot json!".to_string(),
        );

        let err = geocoder.geocode("1 Queen Street").await.unwrap_err();
        assert!(matches!(err, GeocodeError::MalformedResponse(_)), "{:?}", err);
    }

    #[test]
    fn test_first_match_parses_string_coordinates() {
        let result = first_match(
            places(r#"[{"lat": "-36.8485", "lon": "174.7633", "display_name": "Queen Street, Auckland"}]"#),
            "1 Queen St",
        )
        .unwrap();

        assert_eq!(result.location, GeoPoint::new(-36.8485, 174.7633));
        assert_eq!(result.formatted_address, "Queen Street, Auckland");
    }

    #[test]
    fn test_missing_display_name_falls_back_to_query() {
        let result = first_match(
            places(r#"[{"lat": "-41.2865", "lon": "174.7762"}]"#),
            "Lambton Quay",
        )
        .unwrap();
        assert_eq!(result.formatted_address, "Lambton Quay");
    }

    #[test]
    fn test_empty_result_is_no_match() {
        let err = first_match(places("[]"), "Atlantis").unwrap_err();
        assert!(matches!(err, GeocodeError::NoMatch { query } if query == "Atlantis"));
    }

    #[test]
    fn test_bad_coordinates_are_malformed() {
        let err = first_match(places(r#"[{"lat": "north", "lon": "174.7"}]"#), "x").unwrap_err();
        assert!(matches!(err, GeocodeError::MalformedResponse(_)));

        let err = first_match(places(r#"[{"lat": "95.0", "lon": "174.7"}]"#), "x").unwrap_err();
        assert!(matches!(err, GeocodeError::MalformedResponse(_)));
    }

    #[test]
    fn test_geocoded_address_wire_shape() {
        let value = serde_json::to_value(GeocodedAddress {
            location: GeoPoint::new(-36.85, 174.76),
            formatted_address: "Auckland".to_string(),
        })
        .unwrap();
        assert_eq!(value["lat"], -36.85);
        assert_eq!(value["lng"], 174.76);
        assert_eq!(value["formatted_address"], "Auckland");
    }
}
