//! # smart-menu-db: Database Layer for Smart Menu
//!
//! Persistence for restaurants, menus, orders and plan usage. SQLite via
//! sqlx, with every multi-row write in a transaction and every counter
//! incremented in SQL.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Smart Menu Data Flow                             │
//! │                                                                         │
//! │  smart-menu-service (quote_delivery, get_best_sellers, ...)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  smart-menu-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ RestaurantRepo │   │ 001_initial  │  │   │
//! │  │   │ SqlitePool    │◄───│ MenuRepo       │   │ _schema.sql  │  │   │
//! │  │   │               │    │ OrderRepo      │   │              │  │   │
//! │  │   │               │    │ UsageRepo      │   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (DATABASE_PATH)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use smart_menu_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./smart_menu.db")).await?;
//! let restaurant = db.restaurants().get_by_id(&restaurant_id).await?;
//! let pinned = db.menus().list_pinned(&restaurant_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbLocation};

// Repository re-exports for convenience
pub use repository::menu::MenuRepository;
pub use repository::order::OrderRepository;
pub use repository::restaurant::{RestaurantRef, RestaurantRepository};
pub use repository::usage::{UsageRepository, UserPlan};
