//! # backoffice-core: Pure Business Logic for the Back Office
//!
//! This crate holds the domain model of the back office and every rule that
//! can be expressed without touching the database.
//!
//! Nothing here performs I/O: the db crate calls these functions inside its
//! transactions and the server only ever sees their results.
//!
//! ```text
//!   routes (axum) ──► backoffice-db ──► backoffice-core
//!                      sqlx, SQLite      types, totals, words,
//!                                        catalog, grouping, validation
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Customer, Product, StockItem, Invoice, ...)
//! - [`catalog`] - The default products and sub-types seeded on first run
//! - [`grouping`] - Product → stock option grouping for choice widgets
//! - [`reports`] - Statements, ledger balances, dashboard and report views
//! - [`totals`] - Invoice line and header total calculation
//! - [`words`] - Amount-in-words rendering for printed invoices
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use backoffice_core::totals::{InvoiceTotals, LineAmounts};
//!
//! let lines = [LineAmounts { quantity: 2.0, unit_price: 450.0, tax: 0.0 }];
//! let totals = InvoiceTotals::compute(&lines, 0.0, 18.0);
//!
//! assert_eq!(totals.subtotal, 900.0);
//! assert_eq!(totals.gst_amount, 162.0);
//! assert_eq!(totals.grand_total, 1062.0);
//! ```

pub mod catalog;
pub mod error;
pub mod grouping;
pub mod reports;
pub mod totals;
pub mod types;
pub mod validation;
pub mod words;

pub use error::{CoreError, CoreResult, ValidationError};
pub use grouping::{group_stock_options, GroupedStockOptions, StockOption, StockOptionRow};
pub use reports::{
    AccountBalance, CustomerStatement, DashboardSummary, SalesSummary, StockLine, StockValuation,
    StockValuationRow, TopProduct,
};
pub use totals::{round2, InvoiceTotals, LineAmounts};
pub use types::*;
pub use words::amount_in_words;

/// Unit assigned to stock rows when none is given.
pub const DEFAULT_STOCK_UNIT: &str = "kg";

/// Unit of measure printed on invoice lines when none is given.
pub const DEFAULT_INVOICE_UOM: &str = "KG";

/// Label shown for a stock row that has no sub-type.
pub const STANDARD_LABEL: &str = "Standard";

/// Ledger account names used by the automatic postings.
///
/// Invoices post `Accounts Receivable` / `Sales`; payments post
/// `Cash` or `Bank` / `Accounts Receivable`.
pub mod accounts {
    pub const ACCOUNTS_RECEIVABLE: &str = "Accounts Receivable";
    pub const SALES: &str = "Sales";
    pub const CASH: &str = "Cash";
    pub const BANK: &str = "Bank";
}
