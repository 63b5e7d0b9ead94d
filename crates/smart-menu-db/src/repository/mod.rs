//! # Repository Module
//!
//! Database repository implementations for Smart Menu.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Service call                                                          │
//! │       │                                                                 │
//! │       │  db.menus().list_pinned(&restaurant_id)                        │
//! │       ▼                                                                 │
//! │  MenuRepository                                                        │
//! │  ├── list_pinned(&self, restaurant_id)                                 │
//! │  ├── get_details_batch(&self, ids)                                     │
//! │  ├── flag_states(&self, restaurant_id)                                 │
//! │  └── apply_flag_updates(&self, updates)                                │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Rows are read into `*Row` structs (FromRow) and converted into        │
//! │  smart-menu-core types; cents stay cents, timestamps stay UTC.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`restaurant::RestaurantRepository`] - Restaurants, pricing and delivery settings
//! - [`menu::MenuRepository`] - Menu items and best-seller flags
//! - [`order::OrderRepository`] - Orders, order lines and pricing updates
//! - [`usage::UsageRepository`] - Plans and atomic usage counters

pub mod menu;
pub mod order;
pub mod restaurant;
pub mod usage;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{DbError, DbResult};

/// Formats a timestamp the way every TEXT timestamp column stores it.
///
/// Fixed width (microseconds, `Z`), so text order is time order.
pub(crate) fn to_db_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored RFC 3339 timestamp.
pub(crate) fn parse_timestamp(value: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DbError::InvalidData(format!("timestamp '{}': {}", value, e)))
}
