//! # Seed Data Generator
//!
//! Populates the database with a demo catalog and discount codes.
//!
//! ## Usage
//! ```bash
//! cargo run -p storefront-db --bin seed
//!
//! # Specify database path
//! cargo run -p storefront-db --bin seed -- --db ./data/storefront.db
//! ```
//!
//! ## Generated Data
//! - Apparel with size variants (tracked stock per variant)
//! - Homeware with tracked stock, one untracked, one with unlimited stock
//! - A monthly subscription box
//! - Discount codes: `SAVE10` ($10 off), `TWENTY` (20% off), `EXPIRED`

use chrono::{Duration, Utc};
use std::env;
use storefront_core::{CatalogProduct, CatalogVariant, Discount, DiscountKind};
use storefront_db::{migrations, Database, DbConfig};

/// (id, title, price_cents, stock, track_stock)
const PRODUCTS: &[(&str, &str, i64, Option<i64>, bool)] = &[
    ("tee-classic", "Classic Tee", 1999, Some(40), true),
    ("hoodie", "Zip Hoodie", 5499, Some(15), true),
    ("cap", "Dad Cap", 2250, Some(25), true),
    ("mug-enamel", "Enamel Mug", 1450, Some(5), true),
    ("tote", "Canvas Tote", 1800, Some(3), false),
    ("sticker-pack", "Sticker Pack", 499, None, true),
];

/// Size variants for apparel: (suffix, price addon, stock)
const SIZES: &[(&str, i64, i64)] = &[("S", 0, 6), ("M", 0, 10), ("L", 0, 8), ("XL", 300, 4)];

const APPAREL: &[&str] = &["tee-classic", "hoodie"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./storefront_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Storefront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./storefront_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Storefront Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    let (total, applied) = migrations::migration_status(db.pool()).await?;
    println!("✓ Migrations applied ({}/{})", applied, total);

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating catalog...");

    let mut products = 0;
    let mut variants = 0;

    for (id, title, price_cents, stock, track_stock) in PRODUCTS {
        let product = CatalogProduct {
            id: id.to_string(),
            title: title.to_string(),
            price_cents: *price_cents,
            stock: *stock,
            track_stock: *track_stock,
            subscription_id: None,
            image: Some(format!("/uploads/{}.jpg", id)),
            permalink: Some(format!("/product/{}", id)),
            published: true,
        };

        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {}", product.id, e);
            continue;
        }
        products += 1;

        if APPAREL.contains(id) {
            for (size, addon, size_stock) in SIZES {
                let variant = CatalogVariant {
                    id: format!("{}-{}", id, size.to_lowercase()),
                    product_id: id.to_string(),
                    title: size.to_string(),
                    price_cents: price_cents + addon,
                    stock: Some(*size_stock),
                };
                db.products().insert_variant(&variant).await?;
                variants += 1;
            }
        }
    }

    let subscription = CatalogProduct {
        id: "coffee-club".to_string(),
        title: "Coffee Club (monthly)".to_string(),
        price_cents: 2900,
        stock: None,
        track_stock: false,
        subscription_id: Some("plan_coffee_monthly".to_string()),
        image: Some("/uploads/coffee-club.jpg".to_string()),
        permalink: Some("/product/coffee-club".to_string()),
        published: true,
    };
    db.products().insert(&subscription).await?;
    products += 1;

    println!("✓ {} products, {} variants", products, variants);

    println!();
    println!("Generating discount codes...");

    let now = Utc::now();
    let discounts = [
        Discount {
            code: "SAVE10".to_string(),
            kind: DiscountKind::Amount,
            value: 1000,
            start: now - Duration::days(1),
            end: now + Duration::days(365),
        },
        Discount {
            code: "TWENTY".to_string(),
            kind: DiscountKind::Percent,
            value: 2000,
            start: now - Duration::days(1),
            end: now + Duration::days(30),
        },
        Discount {
            code: "EXPIRED".to_string(),
            kind: DiscountKind::Amount,
            value: 500,
            start: now - Duration::days(60),
            end: now - Duration::days(30),
        },
    ];

    for discount in &discounts {
        db.discounts().upsert(discount).await?;
        println!("  {} ({:?}, {})", discount.code, discount.kind, discount.value);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
