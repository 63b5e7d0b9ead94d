//! `smart-menu` ops CLI.
//!
//! Runs service operations against the configured database and prints the
//! JSON a client would receive. The scheduled best-seller job runs
//! `smart-menu update-all-bestsellers`.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use serde::Serialize;
use tracing::error;
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use smart_menu_core::summary::SummaryFilter;
use smart_menu_db::DbConfig;
use smart_menu_service::services::delivery_service::DeliveryQuoteRequest;
use smart_menu_service::services::{
    BestSellerService, DeliveryService, OrderService, SettingsService, UsageService,
};
use smart_menu_service::{AppState, Database, NominatimGeocoder, ServiceConfig, ServiceResult};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv().ok();

    let cli = Cli::parse();

    let stderr_log = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        );

    tracing_subscriber::registry().with(stderr_log).init();

    let mut config = ServiceConfig::load()?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    let geocoder = Arc::new(NominatimGeocoder::new(config.geocoder.clone())?);
    let state = Arc::new(AppState {
        db,
        geocoder,
        config,
    });

    let code = match cli.command {
        Command::BestSellers {
            restaurant_id,
            days,
            limit,
        } => {
            let service = BestSellerService::new(state);
            print(service.get_best_sellers(&restaurant_id, days, limit).await)?
        }
        Command::UpdateBestsellers {
            restaurant_id,
            days,
        } => {
            let service = BestSellerService::new(state);
            print(service.update_bestseller_flags(&restaurant_id, days).await)?
        }
        Command::UpdateAllBestsellers { days } => {
            let service = BestSellerService::new(state);
            print(service.update_all_restaurants(days).await)?
        }
        Command::Pin {
            restaurant_id,
            menu_id,
            unpin,
        } => {
            let service = BestSellerService::new(state);
            print(service.pin_menu_item(&restaurant_id, &menu_id, !unpin).await)?
        }
        Command::QuoteDelivery {
            restaurant_id,
            address,
            latitude,
            longitude,
        } => {
            let service = DeliveryService::new(state);
            let request = DeliveryQuoteRequest {
                restaurant_id,
                customer_address: address,
                latitude,
                longitude,
            };
            print(service.quote(&request).await)?
        }
        Command::OrdersSummary {
            restaurant_id,
            start_date,
            end_date,
            payment_status,
            service_type,
        } => {
            let service = OrderService::new(state);
            let filter = SummaryFilter {
                start_date,
                end_date,
                payment_status,
                service_type,
            };
            print(service.orders_summary(&restaurant_id, filter).await)?
        }
        Command::Settings { restaurant_id } => {
            let service = SettingsService::new(state);
            print(service.get_settings(&restaurant_id).await)?
        }
        Command::Usage { user_id, kind } => {
            let service = UsageService::new(state);
            print(service.usage_status(&user_id, kind).await)?
        }
    };

    Ok(code)
}

/// Prints the success body or the error body, like an HTTP response would.
fn print<T: Serialize>(result: ServiceResult<T>) -> anyhow::Result<ExitCode> {
    match result {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(error = %err, code = err.error_code(), "Command failed");
            println!("{}", serde_json::to_string_pretty(&err.to_body())?);
            Ok(ExitCode::FAILURE)
        }
    }
}
