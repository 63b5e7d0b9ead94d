//! Best-seller service.
//!
//! ## Ranking and Reconciliation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  pinned items (qty 0) ──┐                                               │
//! │                         ├──► SalesTally ──► rank(threshold, limit)      │
//! │  order lines in window ─┘                        │                      │
//! │  (cancelled excluded)                            │                      │
//! │                 get_best_sellers ◄───────────────┤ + batch details      │
//! │                                                  │                      │
//! │                 update_bestseller_flags ◄────────┘                      │
//! │                    flag = top ∪ pinned, write only differences          │
//! │                                                                         │
//! │  update_all_restaurants: every restaurant, bounded concurrency,        │
//! │  failures captured per restaurant                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{error, info};

use smart_menu_core::bestsellers::{
    apply_details, ids_needing_details, plan_flag_updates, BatchReconcileReport,
    BestSellerPolicy, RankedItem, ReconcileSummary, RestaurantReconcileResult, SalesTally,
};
use smart_menu_core::validation::{validate_limit, validate_lookback_days, validate_uuid};

use crate::error::{ServiceError, ServiceResult};
use crate::services::load_restaurant;
use crate::AppState;

/// Lookback of the public best-seller list.
pub const DEFAULT_DISPLAY_LOOKBACK_DAYS: i64 = 7;

/// One entry of the public list. Prices are dollars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestSellerView {
    pub rank: u32,
    pub menu_id: String,
    pub name: String,
    pub name_en: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub total_quantity: i64,
    pub order_count: i64,
    pub is_pinned: bool,
}

impl From<RankedItem> for BestSellerView {
    fn from(item: RankedItem) -> Self {
        BestSellerView {
            rank: item.rank,
            menu_id: item.menu_id,
            name: item.name,
            name_en: item.name_en,
            image_url: item.image_url,
            price: item.price.map(|p| p.to_f64()),
            category: item.category,
            total_quantity: item.total_quantity,
            order_count: item.order_count,
            is_pinned: item.is_pinned,
        }
    }
}

/// `GET /best-sellers` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestSellersResponse {
    pub success: bool,
    pub count: usize,
    pub best_sellers: Vec<BestSellerView>,
    pub period_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PinUpdated {
    pub success: bool,
    pub menu_id: String,
    pub best_seller_pinned: bool,
    pub is_best_seller: bool,
}

/// Best-seller service implementation.
pub struct BestSellerService {
    state: Arc<AppState>,
}

impl BestSellerService {
    /// Create a new best-seller service.
    pub fn new(state: Arc<AppState>) -> Self {
        BestSellerService { state }
    }

    /// Ranked best sellers over the last `lookback_days` (default 7).
    pub async fn get_best_sellers(
        &self,
        restaurant_id: &str,
        lookback_days: Option<i64>,
        limit: Option<i64>,
    ) -> ServiceResult<BestSellersResponse> {
        let lookback_days = lookback_days.unwrap_or(DEFAULT_DISPLAY_LOOKBACK_DAYS);
        validate_lookback_days(lookback_days)?;
        let limit = match limit {
            Some(limit) => validate_limit(limit)?,
            None => self.state.config.best_sellers.limit,
        };

        let restaurant = load_restaurant(&self.state, restaurant_id).await?;
        let mut ranked = self.rank(&restaurant.id, lookback_days, limit).await?;

        let missing = ids_needing_details(&ranked);
        if !missing.is_empty() {
            let details = self.state.db.menus().get_details_batch(&missing).await?;
            apply_details(&mut ranked, &details);
        }

        info!(
            restaurant_id = %restaurant.id,
            lookback_days,
            count = ranked.len(),
            "Best sellers computed"
        );

        Ok(BestSellersResponse {
            success: true,
            count: ranked.len(),
            best_sellers: ranked.into_iter().map(BestSellerView::from).collect(),
            period_days: lookback_days,
        })
    }

    /// Brings every menu item's `is_best_seller` flag in line with the
    /// current top list. Pinned items stay flagged. Idempotent.
    pub async fn update_bestseller_flags(
        &self,
        restaurant_id: &str,
        lookback_days: Option<i64>,
    ) -> ServiceResult<ReconcileSummary> {
        let lookback_days = lookback_days.unwrap_or(self.state.config.reconcile_lookback_days);
        validate_lookback_days(lookback_days)?;

        let restaurant = load_restaurant(&self.state, restaurant_id).await?;
        self.reconcile(&restaurant.id, lookback_days).await
    }

    /// Reconciles every restaurant. One restaurant failing never stops the
    /// others; its error is recorded in the report.
    pub async fn update_all_restaurants(
        &self,
        lookback_days: Option<i64>,
    ) -> ServiceResult<BatchReconcileReport> {
        let lookback_days = lookback_days.unwrap_or(self.state.config.reconcile_lookback_days);
        validate_lookback_days(lookback_days)?;

        let restaurants = self.state.db.restaurants().list_all().await?;
        info!(
            restaurants = restaurants.len(),
            lookback_days,
            "Reconciling best-seller flags for all restaurants"
        );

        let results: Vec<RestaurantReconcileResult> = stream::iter(restaurants)
            .map(|restaurant| async move {
                let outcome: ServiceResult<ReconcileSummary> = async {
                    validate_uuid("restaurant_id", &restaurant.id)?;
                    self.reconcile(&restaurant.id, lookback_days).await
                }
                .await;

                match outcome {
                    Ok(summary) => RestaurantReconcileResult::succeeded(restaurant.name, summary),
                    Err(e) => {
                        error!(
                            restaurant_id = %restaurant.id,
                            error = %e,
                            "Best-seller reconciliation failed"
                        );
                        RestaurantReconcileResult::failed(restaurant.id, restaurant.name, e)
                    }
                }
            })
            .buffered(self.state.config.batch_concurrency)
            .collect()
            .await;

        let report = BatchReconcileReport::from_results(results);
        info!(
            total = report.total_restaurants,
            succeeded = report.success_count,
            "Best-seller reconciliation finished"
        );

        Ok(report)
    }

    /// Sets the owner pin on a menu item of `restaurant_id`.
    pub async fn pin_menu_item(
        &self,
        restaurant_id: &str,
        menu_id: &str,
        pinned: bool,
    ) -> ServiceResult<PinUpdated> {
        validate_uuid("menu_id", menu_id)?;
        let restaurant = load_restaurant(&self.state, restaurant_id).await?;
        let menu_id = menu_id.trim();

        let menus = self.state.db.menus();
        let belongs = menus
            .get_by_id(menu_id)
            .await?
            .is_some_and(|item| item.restaurant_id == restaurant.id);
        if !belongs {
            return Err(ServiceError::not_found("MenuItem", menu_id));
        }

        menus.set_pinned(menu_id, pinned).await?;

        let item = menus
            .get_by_id(menu_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("MenuItem", menu_id))?;

        Ok(PinUpdated {
            success: true,
            menu_id: item.id,
            best_seller_pinned: item.best_seller_pinned,
            is_best_seller: item.is_best_seller,
        })
    }

    async fn rank(
        &self,
        restaurant_id: &str,
        lookback_days: i64,
        limit: usize,
    ) -> ServiceResult<Vec<RankedItem>> {
        let pinned = self.state.db.menus().list_pinned(restaurant_id).await?;

        let until = Utc::now();
        let since = until - Duration::days(lookback_days);
        let lines = self
            .state
            .db
            .orders()
            .lines_in_window(restaurant_id, since, until)
            .await?;

        let mut tally = SalesTally::seeded(&pinned);
        tally.record_all(&lines);

        let policy = BestSellerPolicy {
            threshold: self.state.config.best_sellers.threshold,
            limit,
        };
        Ok(tally.rank(&policy))
    }

    async fn reconcile(&self, restaurant_id: &str, lookback_days: i64) -> ServiceResult<ReconcileSummary> {
        let ranked = self
            .rank(restaurant_id, lookback_days, self.state.config.best_sellers.limit)
            .await?;
        let bestsellers: Vec<String> = ranked.into_iter().map(|item| item.menu_id).collect();
        let top: HashSet<String> = bestsellers.iter().cloned().collect();

        let menus = self.state.db.menus();
        let states = menus.flag_states(restaurant_id).await?;
        let updates = plan_flag_updates(&states, &top);
        let updated_count = menus.apply_flag_updates(&updates).await?;
        let pinned_count = states.iter().filter(|s| s.best_seller_pinned).count() as u64;

        info!(
            restaurant_id = %restaurant_id,
            updated = updated_count,
            pinned = pinned_count,
            "Best-seller flags reconciled"
        );

        Ok(ReconcileSummary {
            restaurant_id: restaurant_id.to_string(),
            updated_count,
            bestsellers,
            pinned_count,
        })
    }
}
