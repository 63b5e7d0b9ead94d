//! # Best Sellers
//!
//! Ranks a restaurant's menu items by recent sales and plans the
//! reconciliation of the persisted `is_best_seller` flag.
//!
//! ## Ranking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. seed:   every pinned item → qty 0, orders 0, pinned                 │
//! │  2. tally:  each order line with a menu_id → qty += n, orders += 1      │
//! │  3. sort:   priority 0  qty >= threshold (organic best sellers)         │
//! │             priority 1  pinned                                          │
//! │             priority 2  everything else                                 │
//! │             then qty desc, orders desc, first seen                      │
//! │  4. cut:    top `limit`, rank 1..N                                      │
//! │  5. enrich: one batch lookup for items without display details         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A high-volume organic seller always outranks a manual pin; a pin always
//! outranks a low-volume item.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{MenuItem, OrderLine};
use crate::DEFAULT_CATEGORY;

// =============================================================================
// Policy
// =============================================================================

/// Tunables for ranking and reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestSellerPolicy {
    /// Quantity at which an item outranks manual pins.
    pub threshold: i64,
    /// Size of the best-seller list.
    pub limit: usize,
}

impl Default for BestSellerPolicy {
    fn default() -> Self {
        BestSellerPolicy {
            threshold: 20,
            limit: 5,
        }
    }
}

// =============================================================================
// Ranked Items
// =============================================================================

/// Display metadata for a menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemDetails {
    pub name: String,
    pub name_en: Option<String>,
    pub image_url: Option<String>,
    pub price: Money,
    pub category: String,
}

impl From<&MenuItem> for ItemDetails {
    fn from(item: &MenuItem) -> Self {
        ItemDetails {
            name: item.name_original.clone(),
            name_en: item.name_english.clone(),
            image_url: item.image_url.clone(),
            price: item.price,
            category: item.category_or_default().to_string(),
        }
    }
}

/// One entry of a best-seller list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RankedItem {
    /// 1-based; 0 until the list is cut.
    pub rank: u32,
    pub menu_id: String,
    pub name: String,
    pub name_en: Option<String>,
    pub image_url: Option<String>,
    /// `None` until enriched.
    pub price: Option<Money>,
    pub category: Option<String>,
    pub total_quantity: i64,
    pub order_count: i64,
    pub is_pinned: bool,
}

impl RankedItem {
    /// Whether display details still need a lookup.
    #[inline]
    pub fn needs_details(&self) -> bool {
        self.price.is_none()
    }

    /// Fills display details, keeping names already known from order lines.
    pub fn apply_details(&mut self, details: &ItemDetails) {
        self.image_url = details.image_url.clone();
        self.price = Some(details.price);
        self.category = Some(if details.category.trim().is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            details.category.clone()
        });

        if self.name.trim().is_empty() {
            self.name = details.name.clone();
        }
        if self.name_en.as_deref().map_or(true, |n| n.trim().is_empty()) {
            self.name_en = details.name_en.clone();
        }
    }
}

// =============================================================================
// Sales Tally
// =============================================================================

/// Sales accumulated over a lookback window, in first-seen order.
#[derive(Debug, Default)]
pub struct SalesTally {
    entries: Vec<RankedItem>,
    index: HashMap<String, usize>,
}

impl SalesTally {
    /// Starts a tally with every pinned item at zero sales.
    ///
    /// Pinned items arrive enriched and never need a details lookup.
    pub fn seeded<'a>(pinned: impl IntoIterator<Item = &'a MenuItem>) -> Self {
        let mut tally = SalesTally::default();

        for item in pinned {
            if tally.index.contains_key(&item.id) {
                continue;
            }
            let details = ItemDetails::from(item);
            let mut entry = RankedItem {
                rank: 0,
                menu_id: item.id.clone(),
                name: String::new(),
                name_en: None,
                image_url: None,
                price: None,
                category: None,
                total_quantity: 0,
                order_count: 0,
                is_pinned: true,
            };
            entry.apply_details(&details);
            tally.push(entry);
        }

        tally
    }

    fn push(&mut self, entry: RankedItem) {
        self.index.insert(entry.menu_id.clone(), self.entries.len());
        self.entries.push(entry);
    }

    /// Records one order line. Lines without a menu id are ignored.
    pub fn record(&mut self, line: &OrderLine) {
        let Some(menu_id) = line.menu_id.as_deref().filter(|id| !id.is_empty()) else {
            return;
        };

        let position = match self.index.get(menu_id) {
            Some(&position) => position,
            None => {
                self.push(RankedItem {
                    rank: 0,
                    menu_id: menu_id.to_string(),
                    name: line.name.clone(),
                    name_en: line.name_en.clone(),
                    image_url: None,
                    price: None,
                    category: None,
                    total_quantity: 0,
                    order_count: 0,
                    is_pinned: false,
                });
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[position];
        entry.total_quantity += line.quantity;
        entry.order_count += 1;
    }

    /// Records every line of an order.
    pub fn record_all<'a>(&mut self, lines: impl IntoIterator<Item = &'a OrderLine>) {
        for line in lines {
            self.record(line);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorts, cuts to `policy.limit` and assigns ranks.
    pub fn rank(self, policy: &BestSellerPolicy) -> Vec<RankedItem> {
        let mut items = self.entries;

        // Stable: ties keep first-seen order.
        items.sort_by_key(|item| {
            let priority = if item.total_quantity >= policy.threshold {
                0u8
            } else if item.is_pinned {
                1
            } else {
                2
            };
            (
                priority,
                std::cmp::Reverse(item.total_quantity),
                std::cmp::Reverse(item.order_count),
            )
        });

        items.truncate(policy.limit);
        for (position, item) in items.iter_mut().enumerate() {
            item.rank = position as u32 + 1;
        }

        items
    }
}

/// Menu ids in `items` that still need display details.
pub fn ids_needing_details(items: &[RankedItem]) -> Vec<String> {
    items
        .iter()
        .filter(|item| item.needs_details())
        .map(|item| item.menu_id.clone())
        .collect()
}

/// Applies a batch of looked-up details. Items missing from `details`
/// (e.g. deleted menu items) are left as they are.
pub fn apply_details(items: &mut [RankedItem], details: &HashMap<String, ItemDetails>) {
    for item in items.iter_mut().filter(|item| item.needs_details()) {
        if let Some(found) = details.get(&item.menu_id) {
            item.apply_details(found);
        }
    }
}

// =============================================================================
// Flag Reconciliation
// =============================================================================

/// Persisted flag state of one menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagState {
    pub menu_id: String,
    pub is_best_seller: bool,
    pub best_seller_pinned: bool,
}

/// A flag write the reconciliation wants to make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagUpdate {
    pub menu_id: String,
    pub is_best_seller: bool,
}

/// Plans the flag writes that bring `items` in line with `top`.
///
/// ## Rules
/// - Flag if in the top list or pinned
/// - A pinned item is never set to false
/// - Only items whose flag differs produce an update
///
/// Applying the plan and planning again with the same `top` yields nothing.
pub fn plan_flag_updates(items: &[FlagState], top: &HashSet<String>) -> Vec<FlagUpdate> {
    items
        .iter()
        .filter_map(|item| {
            let should_flag = item.best_seller_pinned || top.contains(&item.menu_id);
            (item.is_best_seller != should_flag).then(|| FlagUpdate {
                menu_id: item.menu_id.clone(),
                is_best_seller: should_flag,
            })
        })
        .collect()
}

/// Outcome of reconciling one restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReconcileSummary {
    pub restaurant_id: String,
    pub updated_count: u64,
    /// Menu ids of the current top list, in rank order.
    pub bestsellers: Vec<String>,
    pub pinned_count: u64,
}

/// Per-restaurant line of a batch reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RestaurantReconcileResult {
    pub restaurant_id: String,
    pub restaurant_name: String,
    pub success: bool,
    pub updated_count: Option<u64>,
    pub bestsellers: Option<Vec<String>>,
    pub pinned_count: Option<u64>,
    pub error: Option<String>,
}

impl RestaurantReconcileResult {
    pub fn succeeded(restaurant_name: impl Into<String>, summary: ReconcileSummary) -> Self {
        RestaurantReconcileResult {
            restaurant_id: summary.restaurant_id,
            restaurant_name: restaurant_name.into(),
            success: true,
            updated_count: Some(summary.updated_count),
            bestsellers: Some(summary.bestsellers),
            pinned_count: Some(summary.pinned_count),
            error: None,
        }
    }

    pub fn failed(
        restaurant_id: impl Into<String>,
        restaurant_name: impl Into<String>,
        error: impl ToString,
    ) -> Self {
        RestaurantReconcileResult {
            restaurant_id: restaurant_id.into(),
            restaurant_name: restaurant_name.into(),
            success: false,
            updated_count: None,
            bestsellers: None,
            pinned_count: None,
            error: Some(error.to_string()),
        }
    }
}

/// Result of reconciling every restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BatchReconcileReport {
    pub total_restaurants: usize,
    pub success_count: usize,
    pub results: Vec<RestaurantReconcileResult>,
}

impl BatchReconcileReport {
    pub fn from_results(results: Vec<RestaurantReconcileResult>) -> Self {
        BatchReconcileReport {
            total_restaurants: results.len(),
            success_count: results.iter().filter(|r| r.success).count(),
            results,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn menu_item(id: &str, pinned: bool) -> MenuItem {
        let now = Utc::now();
        MenuItem {
            id: id.to_string(),
            restaurant_id: "r-1".to_string(),
            name_original: format!("Dish {}", id),
            name_english: Some(format!("Dish {} (EN)", id)),
            image_url: Some(format!("https://img.example/{}.jpg", id)),
            price: Money::from_cents(1500),
            category: String::new(),
            is_active: true,
            is_best_seller: pinned,
            best_seller_pinned: pinned,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(menu_id: &str, quantity: i64) -> OrderLine {
        OrderLine {
            menu_id: Some(menu_id.to_string()),
            name: format!("Line {}", menu_id),
            name_en: None,
            quantity,
            unit_price: Money::from_cents(1000),
        }
    }

    fn ids(items: &[RankedItem]) -> Vec<&str> {
        items.iter().map(|i| i.menu_id.as_str()).collect()
    }

    #[test]
    fn test_pinned_item_without_sales_appears() {
        let pinned = vec![menu_item("pin", true)];
        let tally = SalesTally::seeded(&pinned);
        let ranked = tally.rank(&BestSellerPolicy::default());

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].menu_id, "pin");
        assert_eq!(ranked[0].total_quantity, 0);
        assert_eq!(ranked[0].rank, 1);
        assert!(ranked[0].is_pinned);
        assert_eq!(ranked[0].category.as_deref(), Some("Main Course"));
        assert!(!ranked[0].needs_details());
    }

    #[test]
    fn test_organic_seller_outranks_pins() {
        let pinned = vec![menu_item("pin-a", true), menu_item("pin-b", true)];
        let mut tally = SalesTally::seeded(&pinned);
        tally.record(&line("pin-a", 19));
        tally.record(&line("hot", 25));
        tally.record(&line("meh", 3));

        let ranked = tally.rank(&BestSellerPolicy::default());
        assert_eq!(ids(&ranked), vec!["hot", "pin-a", "pin-b", "meh"]);
        assert_eq!(
            ranked.iter().map(|i| i.rank).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn test_pinned_item_reaching_threshold_competes_organically() {
        let pinned = vec![menu_item("pin", true)];
        let mut tally = SalesTally::seeded(&pinned);
        tally.record(&line("pin", 30));
        tally.record(&line("hot", 25));

        let ranked = tally.rank(&BestSellerPolicy::default());
        assert_eq!(ids(&ranked), vec!["pin", "hot"]);
    }

    #[test]
    fn test_order_count_and_first_seen_break_ties() {
        let mut tally = SalesTally::default();
        tally.record(&line("a", 4));
        tally.record(&line("b", 2));
        tally.record(&line("b", 2));
        tally.record(&line("c", 4));

        let ranked = tally.rank(&BestSellerPolicy::default());
        // b: 4 over two lines; a and c: 4 over one line, a seen first
        assert_eq!(ids(&ranked), vec!["b", "a", "c"]);
        assert_eq!(ranked[0].order_count, 2);
    }

    #[test]
    fn test_limit_and_lines_without_menu_id() {
        let mut tally = SalesTally::default();
        for (i, qty) in [9, 8, 7, 6, 5, 4, 3].iter().enumerate() {
            tally.record(&line(&format!("m{}", i), *qty));
        }
        tally.record(&OrderLine {
            menu_id: None,
            name: "Custom".to_string(),
            name_en: None,
            quantity: 100,
            unit_price: Money::from_cents(100),
        });
        assert_eq!(tally.len(), 7);

        let ranked = tally.rank(&BestSellerPolicy {
            threshold: 20,
            limit: 3,
        });
        assert_eq!(ids(&ranked), vec!["m0", "m1", "m2"]);
    }

    #[test]
    fn test_details_backfill() {
        let mut tally = SalesTally::seeded(&[menu_item("pin", true)]);
        tally.record(&line("sold", 3));
        tally.record(&line("gone", 2));
        let mut ranked = tally.rank(&BestSellerPolicy::default());

        assert_eq!(ids_needing_details(&ranked), vec!["sold", "gone"]);

        let mut details = HashMap::new();
        details.insert("sold".to_string(), ItemDetails::from(&menu_item("sold", false)));
        apply_details(&mut ranked, &details);

        let sold = &ranked[1];
        assert_eq!(sold.menu_id, "sold");
        assert_eq!(sold.price, Some(Money::from_cents(1500)));
        // Name from the order line is kept; empty English name is filled
        assert_eq!(sold.name, "Line sold");
        assert_eq!(sold.name_en.as_deref(), Some("Dish sold (EN)"));

        assert!(ranked[2].needs_details());
    }

    #[test]
    fn test_plan_flag_updates() {
        let items = vec![
            FlagState { menu_id: "top".into(), is_best_seller: false, best_seller_pinned: false },
            FlagState { menu_id: "stale".into(), is_best_seller: true, best_seller_pinned: false },
            FlagState { menu_id: "pin".into(), is_best_seller: true, best_seller_pinned: true },
            FlagState { menu_id: "quiet".into(), is_best_seller: false, best_seller_pinned: false },
        ];
        let top: HashSet<String> = ["top".to_string()].into_iter().collect();

        let updates = plan_flag_updates(&items, &top);
        assert_eq!(
            updates,
            vec![
                FlagUpdate { menu_id: "top".into(), is_best_seller: true },
                FlagUpdate { menu_id: "stale".into(), is_best_seller: false },
            ]
        );
    }

    #[test]
    fn test_reconciliation_is_idempotent_and_keeps_pins() {
        let mut items = vec![
            FlagState { menu_id: "a".into(), is_best_seller: false, best_seller_pinned: false },
            FlagState { menu_id: "b".into(), is_best_seller: true, best_seller_pinned: false },
            FlagState { menu_id: "pin".into(), is_best_seller: true, best_seller_pinned: true },
        ];
        let top: HashSet<String> = HashSet::from(["a".to_string()]);

        for update in plan_flag_updates(&items, &top) {
            assert!(update.menu_id != "pin" || update.is_best_seller);
            if let Some(item) = items.iter_mut().find(|i| i.menu_id == update.menu_id) {
                item.is_best_seller = update.is_best_seller;
            }
        }

        assert!(plan_flag_updates(&items, &top).is_empty());
        assert!(items.iter().find(|i| i.menu_id == "pin").map_or(false, |i| i.is_best_seller));

        // A pin outside the top list is still never cleared
        assert!(plan_flag_updates(&items, &HashSet::new())
            .iter()
            .all(|u| u.menu_id != "pin"));
    }

    #[test]
    fn test_batch_report_counts_successes() {
        let ok = RestaurantReconcileResult::succeeded(
            "Kai Corner",
            ReconcileSummary {
                restaurant_id: "r-1".into(),
                updated_count: 2,
                bestsellers: vec!["m-1".into()],
                pinned_count: 1,
            },
        );
        let failed = RestaurantReconcileResult::failed("r-2", "Broken Bistro", "database is locked");

        let report = BatchReconcileReport::from_results(vec![ok, failed]);
        assert_eq!(report.total_restaurants, 2);
        assert_eq!(report.success_count, 1);
        assert_eq!(report.results[1].error.as_deref(), Some("database is locked"));
    }
}
