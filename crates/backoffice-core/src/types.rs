//! # Domain Types
//!
//! Entities and input types used throughout the back office.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────┐      ┌──────────────┐       ┌──────────────────┐     │
//! │  │   Product    │ 1──* │  StockItem   │       │  StockHistory    │     │
//! │  │  name (uniq) │      │  sub_type?   │       │  action          │     │
//! │  │  category    │      │  quantity    │       │  quantity delta  │     │
//! │  └──────┬───────┘      │  unit_price  │       │  old/new price   │     │
//! │         │              └──────────────┘       └──────────────────┘     │
//! │         │                                                               │
//! │  ┌──────┴───────┐      ┌──────────────┐       ┌──────────────────┐     │
//! │  │ InvoiceItem  │ *──1 │   Invoice    │ *──1  │    Customer      │     │
//! │  │  qty × price │      │  number(uniq)│       │                  │     │
//! │  │  + tax       │      │  GST, totals │       └────────┬─────────┘     │
//! │  └──────────────┘      └──────┬───────┘                │               │
//! │                               │ 0..1                   │               │
//! │                        ┌──────┴───────┐                │               │
//! │                        │   Payment    │ *──────────────┘               │
//! │                        └──────┬───────┘                                 │
//! │                               │                                         │
//! │                        ┌──────┴───────┐                                 │
//! │                        │ FinanceEntry │  debit / credit ledger line     │
//! │                        └──────────────┘                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity is keyed by an auto-assigned SQLite `INTEGER PRIMARY KEY`.
//! Relations are plain `i64` foreign keys; related rows are fetched through
//! explicit repository calls, never on field access.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::STANDARD_LABEL;

// =============================================================================
// Admin User
// =============================================================================

/// An operator allowed to sign in to the back office.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    /// Argon2 PHC string. Never leaves the server.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub is_active: bool,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer that invoices are issued to.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

/// Fields accepted when creating or updating a customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Product & Stock
// =============================================================================

/// A product line (e.g. Butter). Stock is tracked per sub-type in [`StockItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
}

/// Stock on hand for one (product, sub-type) pair.
///
/// A `None` sub-type is the product's single "Standard" row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockItem {
    pub id: i64,
    pub product_id: i64,
    pub sub_type: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub unit_price: f64,
}

impl StockItem {
    /// Label shown in choice widgets: the sub-type, or "Standard".
    pub fn label(&self) -> &str {
        self.sub_type.as_deref().unwrap_or(STANDARD_LABEL)
    }

    /// Stock value at the current unit price.
    pub fn value(&self) -> f64 {
        crate::round2(self.quantity * self.unit_price)
    }
}

/// Fields accepted when adding a new sub-type row for a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewStockItem {
    pub product_id: i64,
    pub sub_type: Option<String>,
    pub unit: Option<String>,
    #[serde(default)]
    pub unit_price: f64,
}

// =============================================================================
// Stock Action
// =============================================================================

/// What happened to a stock row.
///
/// Persisted as a short snake_case code (`add`, `edit`,
/// `deducted_on_invoice`, `price_updated`); [`StockAction::label`] gives the
/// display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockAction {
    /// Quantity received into stock.
    Add,
    /// Quantity corrected to an absolute value.
    Edit,
    /// Quantity consumed by an invoice line.
    DeductedOnInvoice,
    /// Unit price changed.
    PriceUpdated,
}

impl StockAction {
    /// Every action, in declaration order.
    pub const ALL: [StockAction; 4] = [
        StockAction::Add,
        StockAction::Edit,
        StockAction::DeductedOnInvoice,
        StockAction::PriceUpdated,
    ];

    /// Stable storage code.
    pub const fn code(&self) -> &'static str {
        match self {
            StockAction::Add => "add",
            StockAction::Edit => "edit",
            StockAction::DeductedOnInvoice => "deducted_on_invoice",
            StockAction::PriceUpdated => "price_updated",
        }
    }

    /// Human readable label.
    pub const fn label(&self) -> &'static str {
        match self {
            StockAction::Add => "Add",
            StockAction::Edit => "Edit",
            StockAction::DeductedOnInvoice => "Deducted on Invoice",
            StockAction::PriceUpdated => "Price Updated",
        }
    }

    /// Parses a storage code.
    pub fn from_code(code: &str) -> Option<Self> {
        StockAction::ALL.into_iter().find(|a| a.code() == code)
    }
}

impl std::fmt::Display for StockAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Append-only audit row for a quantity or price change.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockHistory {
    pub id: i64,
    pub product_id: i64,
    /// Denormalized copy of the stock row's sub-type.
    pub sub_type: Option<String>,
    pub action: StockAction,
    /// Signed quantity delta (negative for deductions).
    pub quantity: f64,
    pub old_price: Option<f64>,
    pub new_price: Option<f64>,
    pub performed_by: Option<String>,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub remarks: Option<String>,
}

/// A history row about to be appended.
#[derive(Debug, Clone)]
pub struct NewStockHistory {
    pub product_id: i64,
    pub sub_type: Option<String>,
    pub action: StockAction,
    pub quantity: f64,
    pub old_price: Option<f64>,
    pub new_price: Option<f64>,
    pub performed_by: Option<String>,
    pub remarks: Option<String>,
}

// =============================================================================
// Invoice
// =============================================================================

/// An issued invoice. Header fields are copied from the customer and the
/// order at creation time and never re-derived.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub customer_id: i64,
    pub dispatch_type: Option<String>,
    pub payment_terms: Option<String>,
    pub ref_po_no: Option<String>,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub customer_ntn: Option<String>,
    pub customer_strn: Option<String>,
    pub customer_tel: Option<String>,
    pub customer_address: Option<String>,
    pub account: Option<String>,
    pub on_behalf_of: Option<String>,
    pub contact_person: Option<String>,
    pub contact_number: Option<String>,
    pub subtotal: f64,
    pub discount: f64,
    pub gst_rate: f64,
    pub gst_amount: f64,
    pub grand_total: f64,
    pub amount_in_words: Option<String>,
}

/// A line on an invoice. `total = quantity × unit_price + tax`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub product_id: i64,
    pub sub_type: Option<String>,
    pub uom: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub tax: f64,
    pub total: f64,
}

/// Header fields copied onto the invoice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceHeader {
    pub dispatch_type: Option<String>,
    pub payment_terms: Option<String>,
    pub ref_po_no: Option<String>,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub customer_ntn: Option<String>,
    pub customer_strn: Option<String>,
    pub customer_tel: Option<String>,
    pub customer_address: Option<String>,
    pub account: Option<String>,
    pub on_behalf_of: Option<String>,
    pub contact_person: Option<String>,
    pub contact_number: Option<String>,
}

/// One requested invoice line.
///
/// The stock row is picked by `stock_item_id` (the id served with the grouped
/// stock options) or, failing that, by (`product_id`, `sub_type`). When both
/// are sent the product must match the row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceLineDraft {
    #[serde(default)]
    pub stock_item_id: Option<i64>,
    #[serde(default)]
    pub product_id: Option<i64>,
    pub sub_type: Option<String>,
    pub uom: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub tax: f64,
}

/// Everything needed to issue an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceDraft {
    /// Generated as `INV-YYYYMMDD-NNNN` when absent.
    pub invoice_number: Option<String>,
    #[ts(as = "Option<String>")]
    pub date: Option<DateTime<Utc>>,
    pub customer_id: i64,
    #[serde(flatten)]
    pub header: InvoiceHeader,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub gst_rate: f64,
    /// Rendered from the grand total when absent.
    pub amount_in_words: Option<String>,
    pub lines: Vec<InvoiceLineDraft>,
}

// =============================================================================
// Payment
// =============================================================================

/// Money received from a customer, optionally against one invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: i64,
    pub customer_id: i64,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub amount: f64,
    pub method: Option<String>,
    pub notes: Option<String>,
    pub invoice_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPayment {
    pub customer_id: i64,
    pub amount: f64,
    pub method: Option<String>,
    pub notes: Option<String>,
    pub invoice_id: Option<i64>,
    #[ts(as = "Option<String>")]
    pub date: Option<DateTime<Utc>>,
}

impl NewPayment {
    /// Ledger account debited when this payment is received.
    pub fn receiving_account(&self) -> &'static str {
        match self.method.as_deref().map(str::trim) {
            Some(m) if !m.eq_ignore_ascii_case("cash") => crate::accounts::BANK,
            _ => crate::accounts::CASH,
        }
    }
}

// =============================================================================
// Finance Entry
// =============================================================================

/// One debit/credit ledger line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct FinanceEntry {
    pub id: i64,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub debit_account: String,
    pub credit_account: String,
    pub amount: f64,
    pub invoice_id: Option<i64>,
    pub payment_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewFinanceEntry {
    pub description: Option<String>,
    pub debit_account: String,
    pub credit_account: String,
    pub amount: f64,
    pub invoice_id: Option<i64>,
    pub payment_id: Option<i64>,
    #[ts(as = "Option<String>")]
    pub date: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================
