//! # Restaurant Repository
//!
//! Restaurants with their pricing settings, pickup location and delivery
//! configuration.
//!
//! ## Storage Layout
//! ```text
//! restaurants                         delivery_rates
//! ┌──────────────────────────────┐    ┌─────────────────────────────┐
//! │ id, name                     │    │ restaurant_id ──────────────┼──► restaurants.id
//! │ latitude, longitude          │    │ distance_km (unique per r.) │
//! │ gst_*, credit_card_*         │    │ price_cents                 │
//! │ delivery_pricing_mode (NULL  │    └─────────────────────────────┘
//! │   = never configured)        │
//! │ delivery_*_cents, max km     │
//! └──────────────────────────────┘
//! ```
//!
//! Delivery settings and tiers are always replaced together in one
//! transaction, so a reader never sees half a configuration.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use super::{parse_timestamp, to_db_timestamp};
use crate::error::{DbError, DbResult};
use smart_menu_core::{
    DeliveryPricingMode, DeliveryRate, DeliverySettings, GeoPoint, Money, PricingSettings,
    Restaurant, SurchargeRate,
};

/// Id and display name, used to drive batch jobs.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RestaurantRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct RestaurantRow {
    id: String,
    name: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    gst_registered: bool,
    gst_number: Option<String>,
    credit_card_surcharge_enabled: bool,
    credit_card_surcharge_bps: i64,
    delivery_pricing_mode: Option<DeliveryPricingMode>,
    delivery_base_fee_cents: i64,
    delivery_price_per_km_cents: i64,
    delivery_max_distance_km: f64,
    free_delivery_above_cents: i64,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, sqlx::FromRow)]
struct DeliveryRateRow {
    distance_km: f64,
    price_cents: i64,
}

impl RestaurantRow {
    fn into_restaurant(self, delivery_rates: Vec<DeliveryRate>) -> DbResult<Restaurant> {
        let bps = u32::try_from(self.credit_card_surcharge_bps).map_err(|_| {
            DbError::InvalidData(format!(
                "credit_card_surcharge_bps {} for restaurant {}",
                self.credit_card_surcharge_bps, self.id
            ))
        })?;

        let location = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        };

        let delivery_settings = self.delivery_pricing_mode.map(|pricing_mode| DeliverySettings {
            pricing_mode,
            base_fee: Money::from_cents(self.delivery_base_fee_cents),
            price_per_km: Money::from_cents(self.delivery_price_per_km_cents),
            max_distance_km: self.delivery_max_distance_km,
            free_delivery_above: Money::from_cents(self.free_delivery_above_cents),
        });

        Ok(Restaurant {
            location,
            pricing: PricingSettings {
                gst_registered: self.gst_registered,
                gst_number: self.gst_number,
                credit_card_surcharge_enabled: self.credit_card_surcharge_enabled,
                credit_card_surcharge_rate: SurchargeRate::from_bps(bps),
            },
            delivery_settings,
            delivery_rates,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            id: self.id,
            name: self.name,
        })
    }
}

/// Repository for restaurant database operations.
#[derive(Debug, Clone)]
pub struct RestaurantRepository {
    pool: SqlitePool,
}

impl RestaurantRepository {
    /// Creates a new RestaurantRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RestaurantRepository { pool }
    }

    /// Gets a restaurant with its delivery tiers (ascending distance).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Restaurant>> {
        let row: Option<RestaurantRow> = sqlx::query_as(
            r#"
            SELECT
                id, name, latitude, longitude,
                gst_registered, gst_number,
                credit_card_surcharge_enabled, credit_card_surcharge_bps,
                delivery_pricing_mode, delivery_base_fee_cents,
                delivery_price_per_km_cents, delivery_max_distance_km,
                free_delivery_above_cents,
                created_at, updated_at
            FROM restaurants
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let rates = self.delivery_rates(id).await?;
        row.into_restaurant(rates).map(Some)
    }

    /// Gets a restaurant's delivery tiers, ascending by distance.
    pub async fn delivery_rates(&self, restaurant_id: &str) -> DbResult<Vec<DeliveryRate>> {
        let rows: Vec<DeliveryRateRow> = sqlx::query_as(
            r#"
            SELECT distance_km, price_cents
            FROM delivery_rates
            WHERE restaurant_id = ?1
            ORDER BY distance_km ASC
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| DeliveryRate::new(row.distance_km, Money::from_cents(row.price_cents)))
            .collect())
    }

    /// Lists every restaurant by name.
    pub async fn list_all(&self) -> DbResult<Vec<RestaurantRef>> {
        let rows: Vec<RestaurantRef> =
            sqlx::query_as("SELECT id, name FROM restaurants ORDER BY name, id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows)
    }

    /// Counts restaurants.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM restaurants")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Inserts a restaurant and its delivery tiers in one transaction.
    pub async fn insert(&self, restaurant: &Restaurant) -> DbResult<()> {
        debug!(id = %restaurant.id, name = %restaurant.name, "Inserting restaurant");

        let defaults = DeliverySettings::default();
        let delivery = restaurant.delivery_settings.as_ref();
        let settings = delivery.unwrap_or(&defaults);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO restaurants (
                id, name, latitude, longitude,
                gst_registered, gst_number,
                credit_card_surcharge_enabled, credit_card_surcharge_bps,
                delivery_pricing_mode, delivery_base_fee_cents,
                delivery_price_per_km_cents, delivery_max_distance_km,
                free_delivery_above_cents,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6,
                ?7, ?8,
                ?9, ?10,
                ?11, ?12,
                ?13,
                ?14, ?15
            )
            "#,
        )
        .bind(&restaurant.id)
        .bind(&restaurant.name)
        .bind(restaurant.location.map(|p| p.lat))
        .bind(restaurant.location.map(|p| p.lng))
        .bind(restaurant.pricing.gst_registered)
        .bind(&restaurant.pricing.gst_number)
        .bind(restaurant.pricing.credit_card_surcharge_enabled)
        .bind(restaurant.pricing.credit_card_surcharge_rate.bps() as i64)
        .bind(delivery.map(|d| d.pricing_mode))
        .bind(settings.base_fee.cents())
        .bind(settings.price_per_km.cents())
        .bind(settings.max_distance_km)
        .bind(settings.free_delivery_above.cents())
        .bind(to_db_timestamp(restaurant.created_at))
        .bind(to_db_timestamp(restaurant.updated_at))
        .execute(&mut *tx)
        .await?;

        insert_rates(&mut tx, &restaurant.id, &restaurant.delivery_rates).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Updates GST registration and card surcharge settings.
    ///
    /// The surcharge rate must already be validated (0–10%).
    pub async fn update_pricing_settings(
        &self,
        id: &str,
        settings: &PricingSettings,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE restaurants SET
                gst_registered = ?2,
                gst_number = ?3,
                credit_card_surcharge_enabled = ?4,
                credit_card_surcharge_bps = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(settings.gst_registered)
        .bind(&settings.gst_number)
        .bind(settings.credit_card_surcharge_enabled)
        .bind(settings.credit_card_surcharge_rate.bps() as i64)
        .bind(to_db_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Restaurant", id));
        }

        info!(
            restaurant_id = %id,
            surcharge_enabled = settings.credit_card_surcharge_enabled,
            surcharge_bps = settings.credit_card_surcharge_rate.bps(),
            "Pricing settings updated"
        );

        Ok(())
    }

    /// Sets or clears the pickup location.
    pub async fn update_location(&self, id: &str, location: Option<GeoPoint>) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE restaurants SET
                latitude = ?2,
                longitude = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(location.map(|p| p.lat))
        .bind(location.map(|p| p.lng))
        .bind(to_db_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Restaurant", id));
        }

        Ok(())
    }

    /// Replaces delivery settings and tiers atomically.
    ///
    /// `None` settings marks delivery pricing as unconfigured; the numeric
    /// columns keep their previous values but are no longer read.
    pub async fn replace_delivery_config(
        &self,
        id: &str,
        settings: Option<&DeliverySettings>,
        rates: &[DeliveryRate],
    ) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let now = to_db_timestamp(Utc::now());

        let result = match settings {
            Some(settings) => {
                sqlx::query(
                    r#"
                    UPDATE restaurants SET
                        delivery_pricing_mode = ?2,
                        delivery_base_fee_cents = ?3,
                        delivery_price_per_km_cents = ?4,
                        delivery_max_distance_km = ?5,
                        free_delivery_above_cents = ?6,
                        updated_at = ?7
                    WHERE id = ?1
                    "#,
                )
                .bind(id)
                .bind(settings.pricing_mode)
                .bind(settings.base_fee.cents())
                .bind(settings.price_per_km.cents())
                .bind(settings.max_distance_km)
                .bind(settings.free_delivery_above.cents())
                .bind(&now)
                .execute(&mut *tx)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    UPDATE restaurants SET
                        delivery_pricing_mode = NULL,
                        updated_at = ?2
                    WHERE id = ?1
                    "#,
                )
                .bind(id)
                .bind(&now)
                .execute(&mut *tx)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Restaurant", id));
        }

        sqlx::query("DELETE FROM delivery_rates WHERE restaurant_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_rates(&mut tx, id, rates).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            restaurant_id = %id,
            mode = settings.map(|s| s.pricing_mode.as_str()).unwrap_or("unconfigured"),
            tiers = rates.len(),
            "Delivery configuration replaced"
        );

        Ok(())
    }
}

async fn insert_rates(
    tx: &mut Transaction<'_, Sqlite>,
    restaurant_id: &str,
    rates: &[DeliveryRate],
) -> DbResult<()> {
    for rate in rates {
        sqlx::query(
            r#"
            INSERT INTO delivery_rates (restaurant_id, distance_km, price_cents)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(restaurant_id)
        .bind(rate.distance_km)
        .bind(rate.price.cents())
        .execute(&mut **tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                DbError::duplicate(field, rate.distance_km.to_string())
            }
            other => other,
        })?;
    }
    Ok(())
}

// =============================================================================
// Test Helpers
// =============================================================================


#[cfg(test)]
mod tests {
    use super::fixtures::restaurant;
    use super::*;
    use crate::pool::{Database, DbConfig};

    const RID: &str = "6f1f2b8e-7a43-4d39-9d55-0f4c3f7f2a10";

    #[tokio::test]
    async fn test_insert_and_get_defaults() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.restaurants().insert(&restaurant(RID, "Kai Corner")).await.unwrap();

        let loaded = db.restaurants().get_by_id(RID).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Kai Corner");
        assert!(loaded.pricing.gst_registered);
        assert!(!loaded.pricing.credit_card_surcharge_enabled);
        assert_eq!(loaded.pricing.credit_card_surcharge_rate.bps(), 250);
        assert!(loaded.delivery_settings.is_none());
        assert!(loaded.delivery_rates.is_empty());
        assert_eq!(loaded.location, Some(GeoPoint::new(-36.8485, 174.7633)));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.restaurants().get_by_id(RID).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_delivery_config_orders_tiers() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.restaurants();
        repo.insert(&restaurant(RID, "Kai Corner")).await.unwrap();

        let settings = DeliverySettings {
            pricing_mode: DeliveryPricingMode::Tier,
            ..DeliverySettings::default()
        };
        let rates = vec![
            DeliveryRate::new(8.0, Money::from_cents(1000)),
            DeliveryRate::new(3.0, Money::from_cents(500)),
            DeliveryRate::new(5.0, Money::from_cents(750)),
        ];
        repo.replace_delivery_config(RID, Some(&settings), &rates)
            .await
            .unwrap();

        let loaded = repo.get_by_id(RID).await.unwrap().unwrap();
        assert_eq!(loaded.delivery_settings.unwrap().pricing_mode, DeliveryPricingMode::Tier);
        let distances: Vec<f64> = loaded.delivery_rates.iter().map(|r| r.distance_km).collect();
        assert_eq!(distances, vec![3.0, 5.0, 8.0]);

        // Replacing again drops the old tiers
        repo.replace_delivery_config(RID, None, &[]).await.unwrap();
        let loaded = repo.get_by_id(RID).await.unwrap().unwrap();
        assert!(loaded.delivery_settings.is_none());
        assert!(loaded.delivery_rates.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_tier_rolls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.restaurants();
        repo.insert(&restaurant(RID, "Kai Corner")).await.unwrap();
        repo.replace_delivery_config(RID, None, &[DeliveryRate::new(3.0, Money::from_cents(500))])
            .await
            .unwrap();

        let settings = DeliverySettings {
            pricing_mode: DeliveryPricingMode::Tier,
            ..DeliverySettings::default()
        };
        let rates = vec![
            DeliveryRate::new(5.0, Money::from_cents(700)),
            DeliveryRate::new(5.0, Money::from_cents(750)),
        ];
        let err = repo
            .replace_delivery_config(RID, Some(&settings), &rates)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let loaded = repo.get_by_id(RID).await.unwrap().unwrap();
        assert!(loaded.delivery_settings.is_none());
        assert_eq!(loaded.delivery_rates.len(), 1);
    }

    #[tokio::test]
    async fn test_update_pricing_settings() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.restaurants();
        repo.insert(&restaurant(RID, "Kai Corner")).await.unwrap();

        let settings = PricingSettings {
            gst_registered: false,
            gst_number: Some("123-456-789".to_string()),
            credit_card_surcharge_enabled: true,
            credit_card_surcharge_rate: SurchargeRate::from_bps(300),
        };
        repo.update_pricing_settings(RID, &settings).await.unwrap();

        let loaded = repo.get_by_id(RID).await.unwrap().unwrap();
        assert_eq!(loaded.pricing, settings);

        let err = repo
            .update_pricing_settings("missing", &settings)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_location_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.restaurants();
        repo.insert(&restaurant(RID, "Kai Corner")).await.unwrap();
        repo.insert(&restaurant("b2", "Aroha Eats")).await.unwrap();

        repo.update_location(RID, None).await.unwrap();
        let loaded = repo.get_by_id(RID).await.unwrap().unwrap();
        assert!(loaded.location.is_none());

        let all = repo.list_all().await.unwrap();
        let names: Vec<&str> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Aroha Eats", "Kai Corner"]);
        assert_eq!(repo.count().await.unwrap(), 2);
    }
}
