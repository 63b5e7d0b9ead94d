//! # Menu Repository
//!
//! Menu items and the two best-seller columns.
//!
//! ## Best-Seller Columns
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  best_seller_pinned   owner's choice, written only by set_pinned()      │
//! │  is_best_seller       what the menu shows, written by reconciliation    │
//! │                       (apply_flag_updates) and by pinning               │
//! │                                                                         │
//! │  Invariant: best_seller_pinned = 1  ⇒  is_best_seller = 1              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use super::{parse_timestamp, to_db_timestamp};
use crate::error::{DbError, DbResult};
use smart_menu_core::bestsellers::{FlagState, FlagUpdate, ItemDetails};
use smart_menu_core::{MenuItem, Money};

const MENU_COLUMNS: &str = r#"
    id, restaurant_id, name_original, name_english, image_url,
    price_cents, category, is_active, is_best_seller, best_seller_pinned,
    created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct MenuRow {
    id: String,
    restaurant_id: String,
    name_original: String,
    name_english: Option<String>,
    image_url: Option<String>,
    price_cents: i64,
    category: String,
    is_active: bool,
    is_best_seller: bool,
    best_seller_pinned: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<MenuRow> for MenuItem {
    type Error = DbError;

    fn try_from(row: MenuRow) -> DbResult<Self> {
        Ok(MenuItem {
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            id: row.id,
            restaurant_id: row.restaurant_id,
            name_original: row.name_original,
            name_english: row.name_english,
            image_url: row.image_url,
            price: Money::from_cents(row.price_cents),
            category: row.category,
            is_active: row.is_active,
            is_best_seller: row.is_best_seller,
            best_seller_pinned: row.best_seller_pinned,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FlagRow {
    id: String,
    is_best_seller: bool,
    best_seller_pinned: bool,
}

/// Repository for menu item database operations.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    /// Creates a new MenuRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    /// Inserts a menu item.
    pub async fn insert(&self, item: &MenuItem) -> DbResult<()> {
        debug!(id = %item.id, restaurant_id = %item.restaurant_id, "Inserting menu item");

        sqlx::query(
            r#"
            INSERT INTO menus (
                id, restaurant_id, name_original, name_english, image_url,
                price_cents, category, is_active, is_best_seller, best_seller_pinned,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&item.id)
        .bind(&item.restaurant_id)
        .bind(&item.name_original)
        .bind(&item.name_english)
        .bind(&item.image_url)
        .bind(item.price.cents())
        .bind(item.category_or_default())
        .bind(item.is_active)
        // A pinned item is always shown as a best seller
        .bind(item.is_best_seller || item.best_seller_pinned)
        .bind(item.best_seller_pinned)
        .bind(to_db_timestamp(item.created_at))
        .bind(to_db_timestamp(item.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a menu item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<MenuItem>> {
        let sql = format!("SELECT {} FROM menus WHERE id = ?1", MENU_COLUMNS);
        let row: Option<MenuRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(MenuItem::try_from).transpose()
    }

    /// Lists a restaurant's menu items, oldest first.
    pub async fn list_by_restaurant(&self, restaurant_id: &str) -> DbResult<Vec<MenuItem>> {
        let sql = format!(
            "SELECT {} FROM menus WHERE restaurant_id = ?1 ORDER BY created_at, id",
            MENU_COLUMNS
        );
        let rows: Vec<MenuRow> = sqlx::query_as(&sql)
            .bind(restaurant_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(MenuItem::try_from).collect()
    }

    /// Lists active, owner-pinned items in a stable order (oldest first).
    ///
    /// This order is the tie-break order of pinned items in the ranking.
    pub async fn list_pinned(&self, restaurant_id: &str) -> DbResult<Vec<MenuItem>> {
        let sql = format!(
            r#"
            SELECT {} FROM menus
            WHERE restaurant_id = ?1
              AND is_active = 1
              AND best_seller_pinned = 1
            ORDER BY created_at, id
            "#,
            MENU_COLUMNS
        );
        let rows: Vec<MenuRow> = sqlx::query_as(&sql)
            .bind(restaurant_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(MenuItem::try_from).collect()
    }

    /// Loads display details for many items in one query.
    ///
    /// Unknown ids are simply absent from the map.
    pub async fn get_details_batch(&self, ids: &[String]) -> DbResult<HashMap<String, ItemDetails>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM menus WHERE id IN (",
            MENU_COLUMNS
        ));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        let rows: Vec<MenuRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|row| {
                let item = MenuItem::try_from(row)?;
                Ok((item.id.clone(), ItemDetails::from(&item)))
            })
            .collect()
    }

    /// Reads the flag state of every item of a restaurant.
    pub async fn flag_states(&self, restaurant_id: &str) -> DbResult<Vec<FlagState>> {
        let rows: Vec<FlagRow> = sqlx::query_as(
            r#"
            SELECT id, is_best_seller, best_seller_pinned
            FROM menus
            WHERE restaurant_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| FlagState {
                menu_id: row.id,
                is_best_seller: row.is_best_seller,
                best_seller_pinned: row.best_seller_pinned,
            })
            .collect())
    }

    /// Applies planned flag writes in one transaction.
    ///
    /// Each write is conditional: it only touches rows whose flag differs,
    /// and never clears the flag of a pinned item. Returns the number of rows
    /// actually changed.
    pub async fn apply_flag_updates(&self, updates: &[FlagUpdate]) -> DbResult<u64> {
        if updates.is_empty() {
            return Ok(0);
        }

        let now = to_db_timestamp(Utc::now());
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut changed = 0;
        for update in updates {
            let result = sqlx::query(
                r#"
                UPDATE menus SET
                    is_best_seller = ?2,
                    updated_at = ?3
                WHERE id = ?1
                  AND is_best_seller != ?2
                  AND (?2 = 1 OR best_seller_pinned = 0)
                "#,
            )
            .bind(&update.menu_id)
            .bind(update.is_best_seller)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

            changed += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(planned = updates.len(), changed, "Best-seller flags applied");
        Ok(changed)
    }

    /// Sets or clears the owner pin.
    ///
    /// Pinning also shows the item as a best seller. Unpinning leaves
    /// `is_best_seller` for the next reconciliation.
    pub async fn set_pinned(&self, id: &str, pinned: bool) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE menus SET
                best_seller_pinned = ?2,
                is_best_seller = CASE WHEN ?2 = 1 THEN 1 ELSE is_best_seller END,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(pinned)
        .bind(to_db_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("MenuItem", id));
        }

        info!(menu_id = %id, pinned, "Menu item pin updated");
        Ok(())
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::Duration;

    /// An active item; `age_secs` makes creation order deterministic.
    pub fn menu_item(id: &str, restaurant_id: &str, name: &str, age_secs: i64) -> MenuItem {
        let created = Utc::now() - Duration::seconds(age_secs);
        MenuItem {
            id: id.to_string(),
            restaurant_id: restaurant_id.to_string(),
            name_original: name.to_string(),
            name_english: None,
            image_url: Some(format!("https://img.example/{}.png", id)),
            price: Money::from_cents(1850),
            category: "Mains".to_string(),
            is_active: true,
            is_best_seller: false,
            best_seller_pinned: false,
            created_at: created,
            updated_at: created,
        }
    }
}
