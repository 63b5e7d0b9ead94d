use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;

use smart_menu_core::usage::UsageKind;
use smart_menu_core::{PaymentStatus, ServiceType};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Overrides DATABASE_PATH
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ranked best sellers of one restaurant
    BestSellers {
        restaurant_id: String,
        #[arg(long)]
        days: Option<i64>,
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Reconcile the stored best-seller flags of one restaurant
    UpdateBestsellers {
        restaurant_id: String,
        #[arg(long)]
        days: Option<i64>,
    },

    /// Reconcile every restaurant (the scheduled job)
    UpdateAllBestsellers {
        #[arg(long)]
        days: Option<i64>,
    },

    /// Pin or unpin a menu item as a best seller
    Pin {
        restaurant_id: String,
        menu_id: String,
        #[arg(long)]
        unpin: bool,
    },

    /// Delivery fee for a customer address
    QuoteDelivery {
        restaurant_id: String,
        address: String,
        #[arg(long, requires = "longitude")]
        latitude: Option<f64>,
        #[arg(long, requires = "latitude")]
        longitude: Option<f64>,
    },

    /// Order counts and totals for a restaurant
    OrdersSummary {
        restaurant_id: String,
        /// First day included, YYYY-MM-DD
        #[arg(long)]
        start_date: Option<NaiveDate>,
        /// Last day included, YYYY-MM-DD
        #[arg(long)]
        end_date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_wire::<PaymentStatus>)]
        payment_status: Option<PaymentStatus>,
        #[arg(long, value_parser = parse_wire::<ServiceType>)]
        service_type: Option<ServiceType>,
    },

    /// Pricing and delivery settings of a restaurant
    Settings { restaurant_id: String },

    /// Current usage counter of a user
    Usage {
        user_id: String,
        #[arg(value_parser = parse_wire::<UsageKind>)]
        kind: UsageKind,
    },
}

/// Parses a value by its JSON wire name, e.g. `dine_in` or `image_generation`.
fn parse_wire<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("unknown value '{}'", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_orders_summary() {
        let cli = Cli::parse_from([
            "smart-menu",
            "orders-summary",
            "r-1",
            "--start-date",
            "2026-10-01",
            "--payment-status",
            "paid",
            "--service-type",
            "dine_in",
        ]);

        match cli.command {
            Command::OrdersSummary {
                start_date,
                end_date,
                payment_status,
                service_type,
                ..
            } => {
                assert_eq!(start_date, NaiveDate::from_ymd_opt(2026, 10, 1));
                assert_eq!(end_date, None);
                assert_eq!(payment_status, Some(PaymentStatus::Paid));
                assert_eq!(service_type, Some(ServiceType::DineIn));
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_rejects_unknown_usage_kind() {
        let result = Cli::try_parse_from(["smart-menu", "usage", "u-1", "uploads"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_coordinates_come_in_pairs() {
        let result = Cli::try_parse_from([
            "smart-menu",
            "quote-delivery",
            "r-1",
            "1 Queen Street",
            "--latitude",
            "-36.8",
        ]);
        assert!(result.is_err());
    }
}
