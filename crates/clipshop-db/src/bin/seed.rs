//! # Seed Data Generator
//!
//! Populates the database with development data: the shared time-slot
//! grid, a handful of services and products, and demo users.
//!
//! ## Usage
//! ```bash
//! cargo run -p clipshop-db --bin seed
//!
//! # Specify database path
//! cargo run -p clipshop-db --bin seed -- --db ./data/clipshop.db
//! ```

use std::env;

use chrono::{Duration, Utc};
use clipshop_core::Role;
use clipshop_db::repository::catalog::{NewProduct, NewService};
use clipshop_db::repository::event::NewEvent;
use clipshop_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// The working day: half-hour slots from opening to closing.
const SLOT_GRID: &[(&str, &str)] = &[
    ("09:00", "09:30"),
    ("09:30", "10:00"),
    ("10:00", "10:30"),
    ("10:30", "11:00"),
    ("11:00", "11:30"),
    ("11:30", "12:00"),
    ("16:00", "16:30"),
    ("16:30", "17:00"),
    ("17:00", "17:30"),
    ("17:30", "18:00"),
    ("18:00", "18:30"),
    ("18:30", "19:00"),
];

/// (name, price cents, duration minutes)
const SERVICES: &[(&str, i64, i64)] = &[
    ("Haircut", 1500, 30),
    ("Beard trim", 800, 15),
    ("Haircut + beard", 2000, 45),
    ("Kids cut", 1000, 30),
    ("Hot towel shave", 1200, 30),
];

/// (name, price cents, stock)
const PRODUCTS: &[(&str, i64, i64)] = &[
    ("Matte pomade", 1250, 25),
    ("Beard oil", 950, 30),
    ("Sea salt spray", 1100, 20),
    ("Straight razor", 2400, 8),
    ("Boar bristle brush", 1600, 15),
];

/// (username, email, role)
const USERS: &[(&str, &str, Role)] = &[
    ("admin", "admin@clipshop.test", Role::Admin),
    ("marco", "marco@clipshop.test", Role::Worker),
    ("diego", "diego@clipshop.test", Role::Worker),
    ("ana", "ana@clipshop.test", Role::Client),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./clipshop_dev.db");

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
                println!("clipshop seed data generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./clipshop_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("clipshop seed data generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.users().list_barbers().await?;
    if !existing.is_empty() {
        println!("⚠ Database already seeded ({} barbers present)", existing.len());
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (start, end) in SLOT_GRID {
        db.catalog().create_time_slot(start, end).await?;
    }
    println!("✓ {} time slots", SLOT_GRID.len());

    for (name, price_cents, duration_minutes) in SERVICES {
        db.catalog()
            .create_service(NewService {
                name: name.to_string(),
                description: None,
                price_cents: *price_cents,
                duration_minutes: *duration_minutes,
            })
            .await?;
    }
    println!("✓ {} services", SERVICES.len());

    for (name, price_cents, stock) in PRODUCTS {
        db.catalog()
            .create_product(NewProduct {
                name: name.to_string(),
                description: None,
                price_cents: *price_cents,
                stock: *stock,
                image: None,
            })
            .await?;
    }
    println!("✓ {} products", PRODUCTS.len());

    for (username, email, role) in USERS {
        db.users().insert(username, email, *role).await?;
    }
    println!("✓ {} users (admin / barbers / client)", USERS.len());

    db.events()
        .create(NewEvent {
            name: "Open night".to_string(),
            description: Some("Free trims and coffee".to_string()),
            date: (Utc::now() + Duration::days(14)).date_naive(),
            time: "19:00".to_string(),
            location: "The shop".to_string(),
            image: None,
        })
        .await?;
    println!("✓ 1 event");

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
