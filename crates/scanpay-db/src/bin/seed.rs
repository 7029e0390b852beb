//! # Seed Data Generator
//!
//! Populates a catalog database with sellable products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p scanpay-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p scanpay-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p scanpay-db --bin seed -- --db ./data/catalog.db
//! ```
//!
//! Every product gets a valid EAN-13 (`590…` prefix + check digit), so a
//! printed sheet of the seeded codes scans cleanly with a camera decoder.

use std::env;

use scanpay_core::{Money, NewProduct, ProductDraft};
use scanpay_db::{Database, DbConfig, ProductFilter};

/// Product families for realistic test data
const FAMILIES: &[(&str, &[&str])] = &[
    (
        "Beverages",
        &[
            "Sparkling Water",
            "Orange Juice",
            "Apple Juice",
            "Cola",
            "Lemonade",
            "Iced Tea",
            "Ground Coffee",
            "Tea 80 bags",
        ],
    ),
    (
        "Snacks",
        &[
            "Salted Crisps",
            "Tortilla Chips",
            "Dark Chocolate",
            "Milk Chocolate",
            "Oat Biscuits",
            "Salted Peanuts",
        ],
    ),
    (
        "Dairy",
        &[
            "Whole Milk",
            "Oat Milk",
            "Greek Yogurt",
            "Cheddar",
            "Butter",
        ],
    ),
    (
        "Grocery",
        &[
            "Spaghetti",
            "Basmati Rice",
            "Chopped Tomatoes",
            "Olive Oil",
            "Sea Salt",
            "Plain Flour",
        ],
    ),
];

/// Size variants with a price addon in cents
const SIZES: &[(&str, i64)] = &[("Small", 0), ("Medium", 80), ("Large", 160), ("Family", 300)];

/// Discounts in basis points
const DISCOUNTS: &[u32] = &[0, 0, 0, 500, 1000];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./catalog_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("ScanPay Catalog Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./catalog_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("ScanPay Catalog Seeder");
    println!("======================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut seed = 0usize;

    'outer: for (family, names) in FAMILIES {
        for name in names.iter() {
            for (size, addon) in SIZES {
                if generated >= count {
                    break 'outer;
                }
                seed += 1;

                let request = product_request(name, size, *addon, seed);
                let draft = ProductDraft::from_registration(&request)?;
                if let Err(e) = db.products().insert(&draft).await {
                    eprintln!("Failed to insert {}: {}", draft.barcode, e);
                    continue;
                }

                generated += 1;
                if generated % 50 == 0 {
                    println!("  Generated {} products ({})...", generated, family);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    if let Some(first) = db.products().list(ProductFilter::All).await?.first() {
        println!("  Try scanning: {} ({})", first.barcode, first.name);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds a registration request with a valid EAN-13.
fn product_request(name: &str, size: &str, price_addon: i64, seed: usize) -> NewProduct {
    let barcode = ean13(&format!("590{:09}", seed));

    // $0.99 - $8.98 + size addon
    let sell_cents = 99 + ((seed * 37) % 800) as i64 + price_addon;
    // 55-75% of sell price
    let buy_cents = sell_cents * (55 + (seed % 21) as i64) / 100;

    NewProduct {
        barcode: Some(barcode),
        name: Some(format!("{} {}", name, size)),
        buy_price: Some(Money::from_cents(buy_cents)),
        sell_price: Some(Money::from_cents(sell_cents)),
        discount_bps: Some(DISCOUNTS[seed % DISCOUNTS.len()]),
        stock: Some((seed % 60) as i64 + 5),
    }
}

/// Appends the GTIN mod-10 check digit to a 12-digit body.
fn ean13(body: &str) -> String {
    let sum: u32 = body
        .chars()
        .filter_map(|c| c.to_digit(10))
        .rev()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d * 3 } else { d })
        .sum();
    format!("{}{}", body, (10 - sum % 10) % 10)
}
