//! # backoffice-db: Database Layer for the Back Office
//!
//! This crate provides database access for the back office.
//! It uses SQLite with sqlx for async operations.
//!
//! ```text
//!   HTTP handler ──► Database ──► CustomerRepository / StockRepository /
//!                       │         InvoiceRepository / PaymentRepository /
//!                       │         LedgerRepository / ReportRepository
//!                       ▼
//!                 SqlitePool (WAL) ──► DATABASE_PATH
//! ```
//!
//! Multi-table writes (invoices, payments, stock adjustments, seeding) each
//! run inside a single transaction; a failure leaves no partial rows behind.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use backoffice_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./backoffice.db")).await?;
//! db.seed_catalog_if_empty().await?;
//!
//! let options = db.stock().grouped_options().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};
pub use seed::SeedOutcome;

pub use repository::{
    AdminUserRepository, CustomerRepository, InvoiceRepository, LedgerFilter, LedgerRepository,
    PaymentRepository, ProductRepository, ReportRepository, StockRepository,
};
