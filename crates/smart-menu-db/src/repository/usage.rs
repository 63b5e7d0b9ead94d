//! # Usage Repository
//!
//! Subscription plans and metered usage counters.
//!
//! ## Atomic Consumption
//! ```text
//! try_consume(user, kind, period, cap)
//!       │
//!       ▼
//! INSERT ... count = 1                       ← first use in the period
//! ON CONFLICT DO UPDATE SET count = count + 1
//!     WHERE cap IS NULL OR count < cap       ← the limit check
//! RETURNING count
//!       │
//!       ├── row      → Some(new count)   allowed
//!       └── no row   → None              limit reached, nothing written
//! ```
//!
//! Check and increment are one statement, so two concurrent requests can
//! never both take the last unit.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use super::{parse_timestamp, to_db_timestamp};
use crate::error::{DbError, DbResult};
use smart_menu_core::usage::{Plan, UsageKind};

/// A user's plan record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPlan {
    pub user_id: String,
    pub plan: Plan,
    /// End of the free trial; `None` outside trials.
    pub trial_ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct UserPlanRow {
    user_id: String,
    plan: String,
    trial_ends_at: Option<String>,
}

impl TryFrom<UserPlanRow> for UserPlan {
    type Error = DbError;

    fn try_from(row: UserPlanRow) -> DbResult<Self> {
        let plan = Plan::parse(&row.plan).ok_or_else(|| {
            DbError::InvalidData(format!("plan '{}' for user {}", row.plan, row.user_id))
        })?;
        let trial_ends_at = row
            .trial_ends_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;

        Ok(UserPlan {
            user_id: row.user_id,
            plan,
            trial_ends_at,
        })
    }
}

/// Repository for plan and usage counter operations.
#[derive(Debug, Clone)]
pub struct UsageRepository {
    pool: SqlitePool,
}

impl UsageRepository {
    /// Creates a new UsageRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UsageRepository { pool }
    }

    /// Consumes one unit if the counter is below `cap`.
    ///
    /// ## Returns
    /// - `Some(count)` - the new count, this use included
    /// - `None` - the cap is reached; the counter is unchanged
    ///
    /// `cap = None` means unlimited.
    pub async fn try_consume(
        &self,
        user_id: &str,
        kind: UsageKind,
        period: &str,
        cap: Option<u32>,
    ) -> DbResult<Option<u32>> {
        if cap == Some(0) {
            return Ok(None);
        }

        let count: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO usage_counters (user_id, kind, period, count, updated_at)
            VALUES (?1, ?2, ?3, 1, ?5)
            ON CONFLICT (user_id, kind, period) DO UPDATE SET
                count = usage_counters.count + 1,
                updated_at = excluded.updated_at
            WHERE ?4 IS NULL OR usage_counters.count < ?4
            RETURNING count
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(period)
        .bind(cap.map(i64::from))
        .bind(to_db_timestamp(Utc::now()))
        .fetch_optional(&self.pool)
        .await?;

        match count {
            Some(count) => {
                debug!(user_id = %user_id, kind = kind.as_str(), period, count, "Usage consumed");
                Ok(Some(to_count(count)?))
            }
            None => {
                warn!(user_id = %user_id, kind = kind.as_str(), period, ?cap, "Usage limit reached");
                Ok(None)
            }
        }
    }

    /// Current count for a period; zero when nothing was used yet.
    pub async fn current(&self, user_id: &str, kind: UsageKind, period: &str) -> DbResult<u32> {
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT count FROM usage_counters
            WHERE user_id = ?1 AND kind = ?2 AND period = ?3
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(period)
        .fetch_optional(&self.pool)
        .await?;

        count.map(to_count).unwrap_or(Ok(0))
    }

    /// Gets a user's plan record.
    pub async fn get_plan(&self, user_id: &str) -> DbResult<Option<UserPlan>> {
        let row: Option<UserPlanRow> = sqlx::query_as(
            "SELECT user_id, plan, trial_ends_at FROM user_plans WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserPlan::try_from).transpose()
    }

    /// Creates or replaces a user's plan record.
    pub async fn set_plan(&self, plan: &UserPlan) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_plans (user_id, plan, trial_ends_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (user_id) DO UPDATE SET
                plan = excluded.plan,
                trial_ends_at = excluded.trial_ends_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&plan.user_id)
        .bind(plan.plan.as_str())
        .bind(plan.trial_ends_at.map(to_db_timestamp))
        .bind(to_db_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        debug!(user_id = %plan.user_id, plan = plan.plan.as_str(), "Plan saved");
        Ok(())
    }
}

fn to_count(value: i64) -> DbResult<u32> {
    u32::try_from(value).map_err(|_| DbError::InvalidData(format!("usage count {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;

    #[tokio::test]
    async fn test_try_consume_stops_at_cap() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.usage();

        for expected in 1..=3 {
            let count = repo
                .try_consume("u-1", UsageKind::ImageGeneration, "2026-10", Some(3))
                .await
                .unwrap();
            assert_eq!(count, Some(expected));
        }

        let denied = repo
            .try_consume("u-1", UsageKind::ImageGeneration, "2026-10", Some(3))
            .await
            .unwrap();
        assert_eq!(denied, None);
        assert_eq!(
            repo.current("u-1", UsageKind::ImageGeneration, "2026-10").await.unwrap(),
            3
        );

        // A new period starts from zero
        let next = repo
            .try_consume("u-1", UsageKind::ImageGeneration, "2026-11", Some(3))
            .await
            .unwrap();
        assert_eq!(next, Some(1));
    }

    #[tokio::test]
    async fn test_unlimited_and_zero_cap() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.usage();

        for _ in 0..5 {
            repo.try_consume("u-1", UsageKind::MenuItems, "lifetime", None)
                .await
                .unwrap();
        }
        assert_eq!(repo.current("u-1", UsageKind::MenuItems, "lifetime").await.unwrap(), 5);

        let denied = repo
            .try_consume("u-2", UsageKind::MenuItems, "lifetime", Some(0))
            .await
            .unwrap();
        assert_eq!(denied, None);
        assert_eq!(repo.current("u-2", UsageKind::MenuItems, "lifetime").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_plan_upsert() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.usage();
        assert!(repo.get_plan("u-1").await.unwrap().is_none());

        let trial = UserPlan {
            user_id: "u-1".to_string(),
            plan: Plan::Trial,
            trial_ends_at: Some(Utc::now() + Duration::days(14)),
        };
        repo.set_plan(&trial).await.unwrap();
        assert_eq!(repo.get_plan("u-1").await.unwrap().unwrap().plan, Plan::Trial);

        let pro = UserPlan {
            plan: Plan::Professional,
            trial_ends_at: None,
            ..trial
        };
        repo.set_plan(&pro).await.unwrap();
        let loaded = repo.get_plan("u-1").await.unwrap().unwrap();
        assert_eq!(loaded, pro);
    }
}
