//! # Summary Types
//!
//! Read-only views assembled by the repositories for statements, the ledger,
//! the dashboard and the reports pages. None of these are stored.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{Customer, Invoice, Payment};

/// A stock row joined with its product name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockLine {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub sub_type: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub unit_price: f64,
}

impl StockLine {
    /// "Butter (Salted)" or just "Yogurt" for a standard row.
    pub fn display_name(&self) -> String {
        match &self.sub_type {
            Some(sub_type) => format!("{} ({})", self.product_name, sub_type),
            None => self.product_name.clone(),
        }
    }

    pub fn value(&self) -> f64 {
        crate::round2(self.quantity * self.unit_price)
    }
}

/// Everything billed to and received from one customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerStatement {
    pub customer: Customer,
    pub invoices: Vec<Invoice>,
    pub payments: Vec<Payment>,
    pub total_invoiced: f64,
    pub total_paid: f64,
    /// `total_invoiced − total_paid`; negative means the customer is in credit.
    pub balance: f64,
}

impl CustomerStatement {
    pub fn new(customer: Customer, invoices: Vec<Invoice>, payments: Vec<Payment>) -> Self {
        let total_invoiced = crate::round2(invoices.iter().map(|i| i.grand_total).sum());
        let total_paid = crate::round2(payments.iter().map(|p| p.amount).sum());

        CustomerStatement {
            customer,
            invoices,
            payments,
            total_invoiced,
            total_paid,
            balance: crate::round2(total_invoiced - total_paid),
        }
    }
}

/// Debit/credit totals of one ledger account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AccountBalance {
    pub account: String,
    pub debits: f64,
    pub credits: f64,
    /// `debits − credits`.
    pub balance: f64,
}

/// Invoice and collection totals over a date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    pub invoice_count: i64,
    pub subtotal: f64,
    pub gst_amount: f64,
    pub grand_total: f64,
    pub payments_received: f64,
    /// Unpaid part of the invoices in range.
    pub outstanding: f64,
}

/// Value of one stock row at its current price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockValuationRow {
    pub stock_item_id: i64,
    pub product_name: String,
    pub sub_type: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    pub value: f64,
}

impl From<&StockLine> for StockValuationRow {
    fn from(line: &StockLine) -> Self {
        StockValuationRow {
            stock_item_id: line.id,
            product_name: line.product_name.clone(),
            sub_type: line.sub_type.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            value: line.value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockValuation {
    pub rows: Vec<StockValuationRow>,
    pub total: f64,
}

impl StockValuation {
    pub fn from_lines(lines: &[StockLine]) -> Self {
        let rows: Vec<StockValuationRow> = lines.iter().map(StockValuationRow::from).collect();
        let total = crate::round2(rows.iter().map(|r| r.value).sum());
        StockValuation { rows, total }
    }
}

/// Quantity sold and revenue per product, from invoice lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TopProduct {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: f64,
    pub revenue: f64,
}

/// Landing page counters.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    pub customers: i64,
    pub products: i64,
    pub stock_items: i64,
    pub invoices: i64,
    /// Σ invoice grand totals − Σ payments.
    pub receivables_outstanding: f64,
    pub recent_invoices: Vec<Invoice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i64, sub_type: Option<&str>, quantity: f64, unit_price: f64) -> StockLine {
        StockLine {
            id,
            product_id: 1,
            product_name: "Butter".to_string(),
            sub_type: sub_type.map(str::to_string),
            quantity,
            unit: "kg".to_string(),
            unit_price,
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(line(1, Some("Salted"), 0.0, 0.0).display_name(), "Butter (Salted)");
        assert_eq!(line(1, None, 0.0, 0.0).display_name(), "Butter");
    }

    #[test]
    fn test_stock_valuation_total() {
        let valuation = StockValuation::from_lines(&[
            line(1, Some("Salted"), 12.5, 980.0),
            line(2, Some("Unsalted"), 3.0, 1010.5),
            line(3, None, 0.0, 700.0),
        ]);

        assert_eq!(valuation.rows.len(), 3);
        assert_eq!(valuation.rows[0].value, 12250.0);
        assert_eq!(valuation.rows[1].value, 3031.5);
        assert_eq!(valuation.total, 15281.5);
    }

    #[test]
    fn test_statement_balance() {
        let customer = Customer {
            id: 1,
            name: "Karachi Sweets".to_string(),
            address: None,
            phone: None,
            email: None,
            notes: None,
        };
        let statement = CustomerStatement::new(customer, Vec::new(), Vec::new());
        assert_eq!(statement.total_invoiced, 0.0);
        assert_eq!(statement.balance, 0.0);
    }
}
