//! # Seed Data Generator
//!
//! Populates the database with a demo Auckland restaurant for development.
//!
//! ## Usage
//! ```bash
//! # Demo restaurant with 60 orders over the last two weeks (default)
//! cargo run -p smart-menu-db --bin seed
//!
//! # More order history
//! cargo run -p smart-menu-db --bin seed -- --orders 400
//!
//! # Specify database path
//! cargo run -p smart-menu-db --bin seed -- --db ./data/smart_menu.db
//! ```
//!
//! ## Generated Data
//! - One GST-registered restaurant on Queen Street with a 2.5% card
//!   surcharge and per-km delivery (base $3.00, $1.50/km, 15 km)
//! - A menu of NZ takeaway favourites, two of them pinned as best sellers
//! - Orders spread over 14 days mixing dine-in, pickup and delivery,
//!   priced through the same engine the service uses

use chrono::{Duration, Utc};
use smart_menu_core::pricing::{price_order, sum_lines, OrderPricingInput};
use smart_menu_core::validation::ValidationResult;
use smart_menu_core::{
    DeliveryPricingMode, DeliverySettings, GeoPoint, MenuItem, Money, Order, OrderLine,
    OrderStatus, PaymentMethod, PaymentStatus, PricingSettings, Restaurant, ServiceType,
    SurchargeRate,
};
use smart_menu_db::{Database, DbConfig};
use std::env;
use uuid::Uuid;

/// Menu: (name, english name, category, price in cents, pinned)
const MENU: &[(&str, Option<&str>, &str, i64, bool)] = &[
    ("Fish & Chips", None, "Main Course", 1650, false),
    ("Kūmara Fries", Some("Sweet Potato Fries"), "Sides", 750, false),
    ("Hāngī Pie", Some("Earth Oven Pie"), "Main Course", 1200, true),
    ("Pāua Fritter", Some("Abalone Fritter"), "Starters", 1400, false),
    ("Lamb Shank", None, "Main Course", 2800, false),
    ("Green-lipped Mussels", None, "Starters", 1800, false),
    ("Pavlova", None, "Desserts", 1100, true),
    ("Hokey Pokey Sundae", None, "Desserts", 900, false),
    ("Flat White", None, "Drinks", 550, false),
    ("L&P", None, "Drinks", 450, false),
];

const PAYMENT_METHODS: &[PaymentMethod] = &[
    PaymentMethod::Card,
    PaymentMethod::Card,
    PaymentMethod::BankTransfer,
    PaymentMethod::CashAtCounter,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut order_count: usize = 60;
    let mut db_path = String::from("./smart_menu.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--orders" | "-o" => {
                if i + 1 < args.len() {
                    order_count = args[i + 1].parse().unwrap_or(60);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Smart Menu Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -o, --orders <N>   Number of orders to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./smart_menu.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Smart Menu Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!("Orders:   {}", order_count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.restaurants().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} restaurants", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Restaurant
    let now = Utc::now();
    let restaurant = Restaurant {
        id: Uuid::new_v4().to_string(),
        name: "Queen Street Kai".to_string(),
        location: Some(GeoPoint::new(-36.8485, 174.7633)),
        pricing: PricingSettings {
            gst_registered: true,
            gst_number: Some("123-456-789".to_string()),
            credit_card_surcharge_enabled: true,
            credit_card_surcharge_rate: SurchargeRate::DEFAULT,
        },
        delivery_settings: Some(DeliverySettings {
            pricing_mode: DeliveryPricingMode::PerKm,
            ..DeliverySettings::default()
        }),
        delivery_rates: Vec::new(),
        created_at: now - Duration::days(30),
        updated_at: now - Duration::days(30),
    };
    db.restaurants().insert(&restaurant).await?;
    println!("✓ Restaurant {} ({})", restaurant.name, restaurant.id);

    // Menu
    let mut menu = Vec::with_capacity(MENU.len());
    for (idx, (name, name_en, category, price_cents, pinned)) in MENU.iter().enumerate() {
        let created = restaurant.created_at + Duration::minutes(idx as i64);
        let item = MenuItem {
            id: Uuid::new_v4().to_string(),
            restaurant_id: restaurant.id.clone(),
            name_original: name.to_string(),
            name_english: name_en.map(str::to_string),
            image_url: None,
            price: Money::from_cents(*price_cents),
            category: category.to_string(),
            is_active: true,
            is_best_seller: *pinned,
            best_seller_pinned: *pinned,
            created_at: created,
            updated_at: created,
        };
        db.menus().insert(&item).await?;
        menu.push(item);
    }
    println!("✓ {} menu items", menu.len());

    // Orders
    let start = std::time::Instant::now();
    let mut generated = 0;
    for seed in 0..order_count {
        let (order, lines) = generate_order(&restaurant, &menu, seed)?;
        if let Err(e) = db.orders().insert(&order, &lines).await {
            eprintln!("Failed to insert order {}: {}", order.id, e);
            continue;
        }
        generated += 1;
    }

    println!(
        "✓ Generated {} orders in {:?}",
        generated,
        start.elapsed()
    );
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one priced order with 1-3 lines. Deterministic per `seed`.
fn generate_order(
    restaurant: &Restaurant,
    menu: &[MenuItem],
    seed: usize,
) -> ValidationResult<(Order, Vec<OrderLine>)> {
    let line_count = 1 + seed % 3;
    let lines: Vec<OrderLine> = (0..line_count)
        .map(|n| {
            // Skew towards the first few items so a ranking emerges
            let item = &menu[(seed * 7 + n * 3) % menu.len().min(4 + n * 3)];
            OrderLine {
                menu_id: Some(item.id.clone()),
                name: item.name_original.clone(),
                name_en: item.name_english.clone(),
                quantity: 1 + ((seed + n) % 3) as i64,
                unit_price: item.price,
            }
        })
        .collect();

    let subtotal = sum_lines(&lines)?;
    let payment_method = PAYMENT_METHODS[seed % PAYMENT_METHODS.len()];
    let service_type = match seed % 3 {
        0 => ServiceType::Delivery,
        1 => ServiceType::Pickup,
        _ => ServiceType::DineIn,
    };
    let delivery_fee = Money::from_cents(300 + 150 * (seed % 8) as i64);

    let pricing = price_order(
        &OrderPricingInput {
            subtotal,
            delivery_fee,
            payment_method,
            service_type,
        },
        &restaurant.pricing,
    )?;

    let created = Utc::now() - Duration::minutes((seed as i64 * 331) % (14 * 24 * 60));
    let (status, payment_status) = match seed % 10 {
        0 => (OrderStatus::Cancelled, PaymentStatus::Failed),
        1 | 2 => (OrderStatus::PendingPayment, PaymentStatus::Pending),
        _ => (OrderStatus::Completed, PaymentStatus::Paid),
    };

    let order = Order {
        id: Uuid::new_v4().to_string(),
        restaurant_id: restaurant.id.clone(),
        status,
        payment_status,
        payment_method,
        service_type,
        subtotal: pricing.subtotal,
        delivery_fee: pricing.delivery_fee,
        surcharge_amount: pricing.surcharge_amount,
        tax: pricing.tax,
        total_price: pricing.total_price,
        payment_intent_id: None,
        customer_name: Some(format!("Customer {}", seed + 1)),
        customer_phone: None,
        table_no: (service_type == ServiceType::DineIn).then(|| format!("{}", 1 + seed % 12)),
        special_instructions: None,
        created_at: created,
        updated_at: created,
    };

    Ok((order, lines))
}
