//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  smart-menu startup                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(DATABASE_PATH) ← Configure pool settings                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       │ Batch reconciliation runs restaurants concurrently,            │
//! │       │ each unit borrowing its own connection                         │
//! │       ▼                                                                 │
//! │  db.restaurants() / db.menus() / db.orders() / db.usage()              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! WAL journaling lets the per-restaurant reconciliation units read while
//! another unit writes its flag updates. Writers that still collide wait up
//! to `busy_timeout` instead of failing with `SQLITE_BUSY`.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::menu::MenuRepository;
use crate::repository::order::OrderRepository;
use crate::repository::restaurant::RestaurantRepository;
use crate::repository::usage::UsageRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// SQLite file, created on first connect.
    File(PathBuf),
    /// Private in-memory database. Lives as long as its single connection.
    Memory,
}

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("./smart_menu.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: DbLocation,

    /// Pool size. Default: 5
    pub max_connections: u32,

    /// How long a caller waits for a free connection. Default: 30 seconds
    pub acquire_timeout: Duration,

    /// How long a writer waits on a locked database. Default: 5 seconds
    pub busy_timeout: Duration,

    /// Apply pending migrations on connect. Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Configuration for the database file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Isolated in-memory database, used by tests.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
            // a second connection would open a second, empty database
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            ..DbConfig::new(":memory:")
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.location {
            DbLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal),
            DbLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };

        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            // Off by default in SQLite; delivery_rates/menus/orders rely on it
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout);

        match self.location {
            // Closing the only connection would drop every table
            DbLocation::Memory => options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
            DbLocation::File(_) => options.idle_timeout(Some(Duration::from_secs(600))),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone; clones share the pool.
///
/// ## Usage
/// ```rust,ignore
/// let restaurant = db.restaurants().get_by_id(&id).await?;
/// let lines = db.orders().lines_in_window(&id, since, until).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and applies pending migrations when configured to.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(location = ?config.location, "Opening database");

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            max_connections = config.max_connections,
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Database pool ready"
        );

        let db = Database { pool };
        if config.run_migrations {
            migrations::run_migrations(&db.pool).await?;
        }

        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn restaurants(&self) -> RestaurantRepository {
        RestaurantRepository::new(self.pool.clone())
    }

    pub fn menus(&self) -> MenuRepository {
        MenuRepository::new(self.pool.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    pub fn usage(&self) -> UsageRepository {
        UsageRepository::new(self.pool.clone())
    }

    /// Round-trips a trivial query.
    pub async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_keeps_schema() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.ping().await.unwrap();

        // The schema survives across repository calls on the single connection
        assert_eq!(db.restaurants().count().await.unwrap(), 0);
        assert_eq!(db.restaurants().count().await.unwrap(), 0);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/smart_menu_test.db")
            .max_connections(10)
            .busy_timeout(Duration::from_secs(1))
            .run_migrations(false);

        assert_eq!(
            config.location,
            DbLocation::File(PathBuf::from("/tmp/smart_menu_test.db"))
        );
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.busy_timeout, Duration::from_secs(1));
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_in_memory_is_single_connection() {
        let config = DbConfig::in_memory();
        assert_eq!(config.location, DbLocation::Memory);
        assert_eq!(config.max_connections, 1);
    }
}
