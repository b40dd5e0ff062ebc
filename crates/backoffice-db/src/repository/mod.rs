//! # Repository Module
//!
//! Database repository implementations for the back office.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.invoices().create(&draft, Some("admin"), false)            │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                     │
//! │  ├── validate (backoffice-core)                                        │
//! │  ├── BEGIN                                                             │
//! │  ├── stock::deduct + stock::append_history   ─┐ shared helpers that   │
//! │  ├── ledger::post                             ─┘ run on the open tx    │
//! │  └── COMMIT                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Relations are never loaded lazily: an invoice's lines come from
//! [`InvoiceRepository::items`], a product from [`ProductRepository::get_by_id`].
//!
//! ## Available Repositories
//!
//! - [`AdminUserRepository`] - Admin accounts
//! - [`CustomerRepository`] - Customer CRUD and statements
//! - [`ProductRepository`] - Product CRUD
//! - [`StockRepository`] - Stock rows, adjustments, history, grouped options
//! - [`InvoiceRepository`] - Invoice creation (stock + ledger), lookup, deletion
//! - [`PaymentRepository`] - Payments and their ledger postings
//! - [`LedgerRepository`] - Finance entries and account balances
//! - [`ReportRepository`] - Sales, stock valuation, top products, dashboard

pub mod admin_user;
pub mod customer;
pub mod invoice;
pub mod ledger;
pub mod payment;
pub mod product;
pub mod report;
pub mod stock;

pub use admin_user::AdminUserRepository;
pub use customer::CustomerRepository;
pub use invoice::InvoiceRepository;
pub use ledger::{LedgerFilter, LedgerRepository};
pub use payment::PaymentRepository;
pub use product::ProductRepository;
pub use report::ReportRepository;
pub use stock::StockRepository;
