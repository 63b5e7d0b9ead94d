//! Service configuration module.
//!
//! Configuration is loaded once from environment variables (after `.env`,
//! if present) with documented defaults. A variable that is set but does
//! not parse is an error, never silently replaced by its default.
//!
//! | Variable                       | Default                                       |
//! |--------------------------------|-----------------------------------------------|
//! | `DATABASE_PATH`                | `./smart_menu.db`                             |
//! | `GEOCODER_URL`                 | `https://nominatim.openstreetmap.org/search`  |
//! | `GEOCODER_COUNTRY`             | `nz`                                          |
//! | `GEOCODER_USER_AGENT`          | `SmartMenuNZ/1.0 (contact@smartmenu.co.nz)`   |
//! | `GEOCODER_TIMEOUT_SECS`        | `10`                                          |
//! | `ROAD_DISTANCE_FACTOR`         | `1.3`                                         |
//! | `AVERAGE_SPEED_KMH`            | `35`                                          |
//! | `MIN_DURATION_MINUTES`         | `5`                                           |
//! | `BESTSELLER_THRESHOLD`         | `20`                                          |
//! | `BESTSELLER_LIMIT`             | `5`                                           |
//! | `BESTSELLER_LOOKBACK_DAYS`     | `14`                                          |
//! | `BESTSELLER_BATCH_CONCURRENCY` | `4`                                           |

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use smart_menu_core::bestsellers::BestSellerPolicy;
use smart_menu_core::geo::DistanceModel;
use smart_menu_core::{MAX_BEST_SELLER_LIMIT, MAX_LOOKBACK_DAYS};

/// Nominatim asks every client to identify itself.
pub const DEFAULT_USER_AGENT: &str = "SmartMenuNZ/1.0 (contact@smartmenu.co.nz)";

/// Geocoder endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Nominatim-compatible `search` endpoint
    pub url: String,

    /// ISO country code results are restricted to
    pub country: String,

    /// User-Agent sent with every lookup
    pub user_agent: String,

    /// Whole-request timeout
    pub timeout: Duration,
}

/// Smart Menu service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// SQLite database file
    pub database_path: String,

    pub geocoder: GeocoderConfig,

    /// Road factor, speed and duration floor for delivery estimates
    pub distance_model: DistanceModel,

    /// Threshold and top-N size for best sellers
    pub best_sellers: BestSellerPolicy,

    /// Window used by flag reconciliation, in days
    pub reconcile_lookback_days: i64,

    /// Restaurants reconciled at once by the batch job
    pub batch_concurrency: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            database_path: "./smart_menu.db".to_string(),
            geocoder: GeocoderConfig {
                url: "https://nominatim.openstreetmap.org/search".to_string(),
                country: "nz".to_string(),
                user_agent: DEFAULT_USER_AGENT.to_string(),
                timeout: Duration::from_secs(10),
            },
            distance_model: DistanceModel::default(),
            best_sellers: BestSellerPolicy::default(),
            reconcile_lookback_days: 14,
            batch_concurrency: 4,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Load configuration from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let source = VarSource { vars };
        let defaults = ServiceConfig::default();

        let config = ServiceConfig {
            database_path: source.string("DATABASE_PATH", defaults.database_path),

            geocoder: GeocoderConfig {
                url: source.string("GEOCODER_URL", defaults.geocoder.url),
                country: source.string("GEOCODER_COUNTRY", defaults.geocoder.country),
                user_agent: source.string("GEOCODER_USER_AGENT", defaults.geocoder.user_agent),
                timeout: Duration::from_secs(
                    source.parse("GEOCODER_TIMEOUT_SECS", defaults.geocoder.timeout.as_secs())?,
                ),
            },

            distance_model: DistanceModel {
                road_factor: source
                    .parse("ROAD_DISTANCE_FACTOR", defaults.distance_model.road_factor)?,
                average_speed_kmh: source
                    .parse("AVERAGE_SPEED_KMH", defaults.distance_model.average_speed_kmh)?,
                min_duration_minutes: source.parse(
                    "MIN_DURATION_MINUTES",
                    defaults.distance_model.min_duration_minutes,
                )?,
            },

            best_sellers: BestSellerPolicy {
                threshold: source.parse("BESTSELLER_THRESHOLD", defaults.best_sellers.threshold)?,
                limit: source.parse("BESTSELLER_LIMIT", defaults.best_sellers.limit)?,
            },

            reconcile_lookback_days: source
                .parse("BESTSELLER_LOOKBACK_DAYS", defaults.reconcile_lookback_days)?,

            batch_concurrency: source
                .parse("BESTSELLER_BATCH_CONCURRENCY", defaults.batch_concurrency)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name: &str| Err(ConfigError::InvalidValue(name.to_string()));

        if !(self.distance_model.road_factor.is_finite() && self.distance_model.road_factor >= 1.0) {
            return invalid("ROAD_DISTANCE_FACTOR");
        }
        if !(self.distance_model.average_speed_kmh.is_finite()
            && self.distance_model.average_speed_kmh > 0.0)
        {
            return invalid("AVERAGE_SPEED_KMH");
        }
        if self.geocoder.timeout.is_zero() {
            return invalid("GEOCODER_TIMEOUT_SECS");
        }
        if self.best_sellers.limit == 0 || self.best_sellers.limit > MAX_BEST_SELLER_LIMIT {
            return invalid("BESTSELLER_LIMIT");
        }
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.reconcile_lookback_days) {
            return invalid("BESTSELLER_LOOKBACK_DAYS");
        }
        if self.batch_concurrency == 0 {
            return invalid("BESTSELLER_BATCH_CONCURRENCY");
        }
        Ok(())
    }
}

struct VarSource<'a> {
    vars: &'a HashMap<String, String>,
}

impl VarSource<'_> {
    fn raw(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn string(&self, name: &str, default: String) -> String {
        match self.raw(name) {
            Some(value) => value.to_string(),
            None => {
                debug!(variable = name, default = %default, "Using default");
                default
            }
        }
    }

    fn parse<T>(&self, name: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + std::fmt::Display,
    {
        match self.raw(name) {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidValue(name.to_string())),
            None => {
                debug!(variable = name, default = %default, "Using default");
                Ok(default)
            }
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config.database_path, "./smart_menu.db");
        assert_eq!(config.geocoder.country, "nz");
        assert_eq!(config.geocoder.timeout, Duration::from_secs(10));
        assert_eq!(config.distance_model, DistanceModel::default());
        assert_eq!(config.best_sellers.threshold, 20);
        assert_eq!(config.best_sellers.limit, 5);
        assert_eq!(config.reconcile_lookback_days, 14);
        assert_eq!(config.batch_concurrency, 4);
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_vars(&vars(&[
            ("DATABASE_PATH", "/data/menu.db"),
            ("ROAD_DISTANCE_FACTOR", "1.4"),
            ("BESTSELLER_LIMIT", "10"),
            ("GEOCODER_COUNTRY", " au "),
        ]))
        .unwrap();

        assert_eq!(config.database_path, "/data/menu.db");
        assert_eq!(config.distance_model.road_factor, 1.4);
        assert_eq!(config.best_sellers.limit, 10);
        assert_eq!(config.geocoder.country, "au");
    }

    #[test]
    fn test_unparseable_value_is_an_error() {
        let err = ServiceConfig::from_vars(&vars(&[("AVERAGE_SPEED_KMH", "fast")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for AVERAGE_SPEED_KMH");
    }

    #[test]
    fn test_out_of_range_value_is_an_error() {
        let err = ServiceConfig::from_vars(&vars(&[("BESTSELLER_LIMIT", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name) if name == "BESTSELLER_LIMIT"));

        let err = ServiceConfig::from_vars(&vars(&[("ROAD_DISTANCE_FACTOR", "0.5")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name) if name == "ROAD_DISTANCE_FACTOR"));
    }
}
