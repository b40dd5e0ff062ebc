//! # Catalog Seeder
//!
//! Runs migrations and writes the default product catalog into an empty
//! database. Safe to run repeatedly: an already-seeded database is left as is.
//!
//! ## Usage
//! ```bash
//! # Seed ./backoffice.db (default)
//! cargo run -p backoffice-db --bin seed
//!
//! # Specify database path
//! cargo run -p backoffice-db --bin seed -- --db ./data/backoffice.db
//! ```

use std::env;

use backoffice_db::{Database, DbConfig, SeedOutcome};

const DEFAULT_DB_PATH: &str = "./backoffice.db";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

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
                println!("Back Office Catalog Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $DATABASE_PATH or {DEFAULT_DB_PATH})");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {other} (try --help)");
                std::process::exit(2);
            }
        }
        i += 1;
    }

    println!("Back Office Catalog Seeder");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    match db.seed_catalog_if_empty().await? {
        SeedOutcome::Seeded {
            products,
            stock_items,
        } => {
            println!("✓ Seeded {} products and {} stock items", products, stock_items);
        }
        SeedOutcome::AlreadySeeded => {
            let existing = db.products().count().await?;
            println!("⚠ Database already has {} products", existing);
            println!("  Nothing to do.");
        }
    }

    println!();
    println!("Stock options:");
    for (product, options) in db.stock().grouped_options().await? {
        let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
        println!("  {:<16} {}", product, labels.join(", "));
    }

    db.close().await;
    Ok(())
}
