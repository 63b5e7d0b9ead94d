//! # Order Repository
//!
//! Orders, their lines, and the pricing columns.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── insert(order, lines) → order + order_items in one transaction  │
//! │                                                                         │
//! │  2. PAYMENT INTENT                                                     │
//! │     └── record_payment_intent() → surcharge/tax/total rewritten and    │
//! │         intent id stored in one UPDATE, payment_status 'processing'    │
//! │         (refused once paid or cancelled)                               │
//! │                                                                         │
//! │  3. PAID                                                               │
//! │     └── mark_paid() → payment_status 'paid', status 'pending'          │
//! │                                                                         │
//! │  4. KITCHEN                                                            │
//! │     └── update_status() → confirmed / preparing / ready / completed    │
//! │                            or cancelled                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::{parse_timestamp, to_db_timestamp};
use crate::error::{DbError, DbResult};
use smart_menu_core::pricing::OrderPricing;
use smart_menu_core::{
    Money, Order, OrderLine, OrderStatus, PaymentMethod, PaymentStatus, ServiceType,
};

const ORDER_COLUMNS: &str = r#"
    id, restaurant_id, status, payment_status, payment_method, service_type,
    subtotal_cents, delivery_fee_cents, surcharge_cents, tax_cents, total_cents,
    payment_intent_id, customer_name, customer_phone, table_no, special_instructions,
    created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    restaurant_id: String,
    status: OrderStatus,
    payment_status: PaymentStatus,
    payment_method: PaymentMethod,
    service_type: ServiceType,
    subtotal_cents: i64,
    delivery_fee_cents: i64,
    surcharge_cents: i64,
    tax_cents: i64,
    total_cents: i64,
    payment_intent_id: Option<String>,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    table_no: Option<String>,
    special_instructions: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> DbResult<Self> {
        Ok(Order {
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            id: row.id,
            restaurant_id: row.restaurant_id,
            status: row.status,
            payment_status: row.payment_status,
            payment_method: row.payment_method,
            service_type: row.service_type,
            subtotal: Money::from_cents(row.subtotal_cents),
            delivery_fee: Money::from_cents(row.delivery_fee_cents),
            surcharge_amount: Money::from_cents(row.surcharge_cents),
            tax: Money::from_cents(row.tax_cents),
            total_price: Money::from_cents(row.total_cents),
            payment_intent_id: row.payment_intent_id,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            table_no: row.table_no,
            special_instructions: row.special_instructions,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    menu_id: Option<String>,
    name: String,
    name_en: Option<String>,
    quantity: i64,
    unit_price_cents: i64,
}

impl From<LineRow> for OrderLine {
    fn from(row: LineRow) -> Self {
        OrderLine {
            menu_id: row.menu_id,
            name: row.name,
            name_en: row.name_en,
            quantity: row.quantity,
            unit_price: Money::from_cents(row.unit_price_cents),
        }
    }
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order and its lines in one transaction.
    ///
    /// ## Snapshot Pattern
    /// Line names and prices are copied from the menu at order time, so
    /// later menu edits never rewrite history.
    pub async fn insert(&self, order: &Order, lines: &[OrderLine]) -> DbResult<()> {
        debug!(
            id = %order.id,
            restaurant_id = %order.restaurant_id,
            total = %order.total_price,
            lines = lines.len(),
            "Inserting order"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, restaurant_id, status, payment_status, payment_method, service_type,
                subtotal_cents, delivery_fee_cents, surcharge_cents, tax_cents, total_cents,
                payment_intent_id, customer_name, customer_phone, table_no, special_instructions,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16,
                ?17, ?18
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.restaurant_id)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(order.payment_method)
        .bind(order.service_type)
        .bind(order.subtotal.cents())
        .bind(order.delivery_fee.cents())
        .bind(order.surcharge_amount.cents())
        .bind(order.tax.cents())
        .bind(order.total_price.cents())
        .bind(&order.payment_intent_id)
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(&order.table_no)
        .bind(&order.special_instructions)
        .bind(to_db_timestamp(order.created_at))
        .bind(to_db_timestamp(order.updated_at))
        .execute(&mut *tx)
        .await?;

        for (position, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, position, menu_id, name, name_en, quantity, unit_price_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&order.id)
            .bind(position as i64)
            .bind(&line.menu_id)
            .bind(&line.name)
            .bind(&line.name_en)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS);
        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    /// Gets the lines of an order in entry order.
    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let rows: Vec<LineRow> = sqlx::query_as(
            r#"
            SELECT menu_id, name, name_en, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderLine::from).collect())
    }

    /// Lines of every non-cancelled order created in `[since, until]`.
    ///
    /// Ordered by order creation, then line position; the best-seller
    /// ranking uses this as its first-seen order.
    pub async fn lines_in_window(
        &self,
        restaurant_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DbResult<Vec<OrderLine>> {
        let rows: Vec<LineRow> = sqlx::query_as(
            r#"
            SELECT oi.menu_id, oi.name, oi.name_en, oi.quantity, oi.unit_price_cents
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.restaurant_id = ?1
              AND o.status != 'cancelled'
              AND julianday(o.created_at) >= julianday(?2)
              AND julianday(o.created_at) <= julianday(?3)
            ORDER BY o.created_at, o.id, oi.position
            "#,
        )
        .bind(restaurant_id)
        .bind(to_db_timestamp(since))
        .bind(to_db_timestamp(until))
        .fetch_all(&self.pool)
        .await?;

        debug!(restaurant_id = %restaurant_id, lines = rows.len(), "Loaded order lines");
        Ok(rows.into_iter().map(OrderLine::from).collect())
    }

    /// Lists a restaurant's orders, newest first.
    pub async fn list_for_restaurant(&self, restaurant_id: &str) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {} FROM orders WHERE restaurant_id = ?1 ORDER BY created_at DESC, id",
            ORDER_COLUMNS
        );
        let rows: Vec<OrderRow> = sqlx::query_as(&sql)
            .bind(restaurant_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Reprices an unpaid order for its payment method and records the
    /// payment provider's intent id, moving payment to `processing`.
    ///
    /// Pricing and intent land together or not at all.
    ///
    /// ## Errors
    /// `NotFound("Order (unpaid)")` if the order is missing, paid or
    /// cancelled. The condition is checked in the UPDATE itself.
    pub async fn record_payment_intent(
        &self,
        order_id: &str,
        payment_method: PaymentMethod,
        pricing: &OrderPricing,
        intent_id: &str,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                payment_method = ?2,
                subtotal_cents = ?3,
                delivery_fee_cents = ?4,
                surcharge_cents = ?5,
                tax_cents = ?6,
                total_cents = ?7,
                payment_intent_id = ?8,
                payment_status = 'processing',
                updated_at = ?9
            WHERE id = ?1
              AND payment_status != 'paid'
              AND status != 'cancelled'
            "#,
        )
        .bind(order_id)
        .bind(payment_method)
        .bind(pricing.subtotal.cents())
        .bind(pricing.delivery_fee.cents())
        .bind(pricing.surcharge_amount.cents())
        .bind(pricing.tax.cents())
        .bind(pricing.total_price.cents())
        .bind(intent_id)
        .bind(to_db_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (unpaid)", order_id));
        }

        debug!(
            order_id = %order_id,
            intent_id = %intent_id,
            surcharge = %pricing.surcharge_amount,
            total = %pricing.total_price,
            "Payment intent recorded"
        );
        Ok(())
    }

    /// Marks an order as paid and releases it to the kitchen.
    pub async fn mark_paid(&self, order_id: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                payment_status = 'paid',
                status = CASE WHEN status = 'pending_payment' THEN 'pending' ELSE status END,
                updated_at = ?2
            WHERE id = ?1 AND payment_status != 'paid'
            "#,
        )
        .bind(order_id)
        .bind(to_db_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (unpaid)", order_id));
        }

        info!(order_id = %order_id, "Order paid");
        Ok(())
    }

    /// Sets the kitchen status.
    pub async fn update_status(&self, order_id: &str, status: OrderStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(order_id)
            .bind(status)
            .bind(to_db_timestamp(Utc::now()))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }
        Ok(())
    }
}

// =============================================================================
// Test Helpers
// =============================================================================


#[cfg(test)]
mod tests {
    use super::fixtures::{line, order};
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::restaurant::fixtures::restaurant;
    use chrono::Duration;

    const RID: &str = "r-1";

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.restaurants().insert(&restaurant(RID, "Kai Corner")).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let db = setup().await;
        let repo = db.orders();
        let now = Utc::now();

        let lines = vec![line(Some("m-1"), "Laksa", 2), line(None, "Extra rice", 1)];
        repo.insert(&order("o-1", RID, 3000, now), &lines).await.unwrap();

        let loaded = repo.get_by_id("o-1").await.unwrap().unwrap();
        assert_eq!(loaded.subtotal, Money::from_cents(3000));
        assert_eq!(loaded.status, OrderStatus::PendingPayment);
        assert_eq!(loaded.payment_method, PaymentMethod::Card);

        let stored = repo.get_lines("o-1").await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].menu_id.as_deref(), Some("m-1"));
        assert!(stored[1].menu_id.is_none());
    }

    #[tokio::test]
    async fn test_inconsistent_total_is_rejected() {
        let db = setup().await;
        let mut bad = order("o-1", RID, 3000, Utc::now());
        bad.total_price = Money::from_cents(2999);

        let err = db.orders().insert(&bad, &[]).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation(_)));
        assert!(db.orders().get_by_id("o-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lines_in_window_excludes_old_and_cancelled() {
        let db = setup().await;
        let repo = db.orders();
        let now = Utc::now();

        repo.insert(&order("o-old", RID, 1000, now - Duration::days(30)), &[line(Some("m-1"), "A", 1)])
            .await
            .unwrap();
        repo.insert(&order("o-1", RID, 1000, now - Duration::days(2)), &[line(Some("m-2"), "B", 3)])
            .await
            .unwrap();
        repo.insert(&order("o-2", RID, 1000, now - Duration::days(1)), &[line(Some("m-3"), "C", 1)])
            .await
            .unwrap();
        repo.update_status("o-2", OrderStatus::Cancelled).await.unwrap();

        let lines = repo
            .lines_in_window(RID, now - Duration::days(7), now)
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].menu_id.as_deref(), Some("m-2"));
        assert_eq!(lines[0].quantity, 3);
    }

    fn card_pricing() -> OrderPricing {
        OrderPricing {
            subtotal: Money::from_cents(4000),
            delivery_fee: Money::zero(),
            surcharge_amount: Money::from_cents(100),
            tax: Money::from_cents(535),
            total_price: Money::from_cents(4100),
        }
    }

    #[tokio::test]
    async fn test_payment_intent_refused_after_payment() {
        let db = setup().await;
        let repo = db.orders();
        repo.insert(&order("o-1", RID, 4000, Utc::now()), &[]).await.unwrap();

        let pricing = card_pricing();
        repo.record_payment_intent("o-1", PaymentMethod::Card, &pricing, "pi_123")
            .await
            .unwrap();
        let loaded = repo.get_by_id("o-1").await.unwrap().unwrap();
        assert_eq!(loaded.pricing(), pricing);
        assert_eq!(loaded.payment_status, PaymentStatus::Processing);
        assert_eq!(loaded.payment_intent_id.as_deref(), Some("pi_123"));

        repo.mark_paid("o-1").await.unwrap();
        let paid = repo.get_by_id("o-1").await.unwrap().unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.status, OrderStatus::Pending);

        let err = repo
            .record_payment_intent("o-1", PaymentMethod::Card, &pricing, "pi_456")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        let unchanged = repo.get_by_id("o-1").await.unwrap().unwrap();
        assert_eq!(unchanged.payment_intent_id.as_deref(), Some("pi_123"));
        assert!(repo.mark_paid("o-1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_cancelled_order_gets_neither_pricing_nor_intent() {
        let db = setup().await;
        let repo = db.orders();
        let original = order("o-1", RID, 4000, Utc::now());
        repo.insert(&original, &[]).await.unwrap();
        repo.update_status("o-1", OrderStatus::Cancelled).await.unwrap();

        let err = repo
            .record_payment_intent("o-1", PaymentMethod::Card, &card_pricing(), "pi_123")
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let stored = repo.get_by_id("o-1").await.unwrap().unwrap();
        assert_eq!(stored.pricing(), original.pricing());
        assert_eq!(stored.payment_status, PaymentStatus::Pending);
        assert_eq!(stored.payment_intent_id, None);
    }

    #[tokio::test]
    async fn test_list_for_restaurant_newest_first() {
        let db = setup().await;
        let repo = db.orders();
        let now = Utc::now();
        repo.insert(&order("o-1", RID, 1000, now - Duration::hours(2)), &[]).await.unwrap();
        repo.insert(&order("o-2", RID, 1000, now), &[]).await.unwrap();

        let orders = repo.list_for_restaurant(RID).await.unwrap();
        let ids: Vec<&str> = orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["o-2", "o-1"]);
    }
}
