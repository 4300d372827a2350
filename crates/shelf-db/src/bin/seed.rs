//! # Seed Data Generator
//!
//! Fills an empty database with a small demo inventory and one sale.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by SHELF_DB_PATH (default: ./shelf.db)
//! cargo run -p shelf-db --bin seed
//!
//! # Seed a specific file
//! cargo run -p shelf-db --bin seed -- --db ./data/demo.db
//! ```
//!
//! Every delivery goes through the stock ledger, so the demo data carries
//! real batch numbers and a matching audit trail.

use std::env;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use shelf_core::{
    apply_sale, recent_sales_total, sellable_lines, Actor, AuditEntry, Cart, InventorySummary,
    Product, Restock, StockLedger, UserRole, Variation, RECENTLY_ADDED_DAYS,
};
use shelf_db::{AppConfig, Database};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// `(name, category, price, cost, alert, stock, expires in days)`
const PRODUCTS: &[(&str, &str, i64, i64, i64, i64, Option<i64>)] = &[
    ("Jasmine Rice 5kg", "Grocery", 32_000, 25_500, 5, 40, None),
    ("Fresh Milk 1L", "Dairy", 9_500, 7_800, 10, 24, Some(10)),
    ("Cheddar Cheese", "Dairy", 18_500, 14_000, 4, 3, Some(45)),
    ("Instant Noodles", "Grocery", 1_500, 1_100, 20, 120, Some(240)),
    ("Dish Soap", "Household", 6_500, 4_800, 6, 0, None),
];

/// `(product, category, [(variation, price, cost, alert, stock)])`
const VARIED_PRODUCTS: &[(&str, &str, &[(&str, i64, i64, i64, i64)])] = &[
    (
        "Shampoo",
        "Personal Care",
        &[("100ml", 8_500, 6_000, 5, 18), ("400ml", 24_000, 17_500, 3, 6)],
    ),
    (
        "Cola",
        "Beverages",
        &[("330ml Can", 3_500, 2_400, 24, 96), ("1.5L Bottle", 8_000, 5_900, 6, 4)],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::from_env()?;
    init_tracing(&config.log_filter);

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if let Some(path) = args.get(i + 1) {
                    config.database_path = PathBuf::from(path);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shelf Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $SHELF_DB_PATH or ./shelf.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let db = Database::new(config.db_config()).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let now = Utc::now();
    let admin = Actor {
        id: "seed-admin".to_string(),
        name: "Seed Admin".to_string(),
        email: "admin@shelf.local".to_string(),
        role: UserRole::Admin,
    };

    let ledger = StockLedger::new(db.products());
    let mut audit = Vec::new();

    for &(name, category, price, cost, alert, stock, expires_in) in PRODUCTS {
        let mut product = Product::new(name, category, price, cost, alert, now);
        product.description = format!("Demo {} item", category.to_lowercase());
        // an empty product still needs to exist when nothing is received
        if stock == 0 {
            db.products().save(&product).await?;
            continue;
        }
        let restock = Restock::product(stock, expiry_after(now, expires_in));
        audit.extend(ledger.restock(&mut product, &restock, &admin, now).await?);
    }

    for &(name, category, variations) in VARIED_PRODUCTS {
        let first = variations.first().map(|v| (v.1, v.2)).unwrap_or_default();
        let mut product = Product::new(name, category, first.0, first.1, 0, now);

        let mut quantities = Vec::new();
        for &(label, price, cost, alert, stock) in variations {
            let variation = Variation::new(label, price, cost, alert);
            quantities.push((variation.id.clone(), stock));
            product.variations.push(variation);
        }

        let restock = Restock::variations(quantities, None);
        audit.extend(ledger.restock(&mut product, &restock, &admin, now).await?);
    }

    db.audit_log().record_all(&audit).await?;
    info!(batches = audit.len(), "Stock received");

    record_demo_sale(&db, &admin, now).await?;

    let products = db.products().list_all().await?;
    let summary = InventorySummary::with_warning_days(&products, now, config.expiry_warning_days);
    let sales = db.transactions().list_recent(100).await?;

    info!(
        products = products.len(),
        lines = summary.line_count,
        categories = summary.category_count,
        low_stock = summary.low_stock_count,
        out_of_stock = summary.out_of_stock_count,
        expiring_soon = summary.expiring_soon_count,
        cost_value = %summary.cost_value,
        retail_value = %summary.retail_value,
        potential_profit = %summary.potential_profit(),
        weekly_sales = %recent_sales_total(&sales, now, RECENTLY_ADDED_DAYS),
        "Seed complete"
    );

    db.close().await;
    Ok(())
}

/// Sells one unit of the first two sellable lines.
async fn record_demo_sale(
    db: &Database,
    cashier: &Actor,
    now: DateTime<Utc>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut products = db.products().list_visible().await?;

    let mut cart = Cart::new();
    for line in sellable_lines(&products, now)
        .into_iter()
        .filter(|l| l.available > 0)
        .take(2)
    {
        cart.add(line)?;
    }

    if cart.is_empty() {
        warn!("Nothing in stock to sell");
        return Ok(());
    }

    let tx = cart.checkout(cashier, now)?;
    apply_sale(&mut products, &tx)?;

    for product in products
        .iter()
        .filter(|p| tx.lines.iter().any(|l| l.product_id == p.id))
    {
        db.products().save(product).await?;
    }
    db.transactions().insert(&tx).await?;
    db.audit_log()
        .record(&AuditEntry::order_confirmed(cashier, now))
        .await?;

    info!(id = %tx.id, subtotal = %tx.subtotal, items = tx.total_quantity(), "Demo sale recorded");
    Ok(())
}

fn expiry_after(now: DateTime<Utc>, days: Option<i64>) -> Option<DateTime<Utc>> {
    days.map(|d| now + Duration::days(d))
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
