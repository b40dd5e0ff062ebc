//! # Invoice Totals
//!
//! Line and header arithmetic for invoices.
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Invoice Total Pipeline                               │
//! │                                                                         │
//! │  line.total   = round2(quantity × unit_price + tax)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  subtotal     = Σ line.total                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  taxable      = max(subtotal − discount, 0)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  gst_amount   = round2(taxable × gst_rate / 100)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  grand_total  = round2(taxable + gst_amount)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts are stored as `REAL` columns, so every intermediate value is
//! rounded to two decimals before it is persisted.

use serde::{Deserialize, Serialize};

/// Rounds to two decimal places (half away from zero).
///
/// ```rust
/// use backoffice_core::round2;
///
/// assert_eq!(round2(10.005), 10.01);
/// assert_eq!(round2(0.1 + 0.2), 0.3);
/// ```
#[inline]
pub fn round2(value: f64) -> f64 {
    // 10.005 is stored as 10.00499..; the epsilon lifts it over the half.
    let scaled = value * 100.0;
    (scaled + scaled.signum() * 1e-7).round() / 100.0
}

/// The inputs of one invoice line that affect money.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineAmounts {
    pub quantity: f64,
    pub unit_price: f64,
    pub tax: f64,
}

impl LineAmounts {
    /// `quantity × unit_price + tax`, rounded.
    #[inline]
    pub fn total(&self) -> f64 {
        round2(self.quantity * self.unit_price + self.tax)
    }
}

/// Computed invoice header totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// Totals of each line, in input order.
    pub line_totals: Vec<f64>,
    pub subtotal: f64,
    pub discount: f64,
    pub taxable: f64,
    pub gst_rate: f64,
    pub gst_amount: f64,
    pub grand_total: f64,
}

impl InvoiceTotals {
    /// Computes all totals from the lines, the header discount and GST rate.
    ///
    /// A discount larger than the subtotal clamps the taxable amount at zero
    /// instead of producing a negative invoice.
    pub fn compute(lines: &[LineAmounts], discount: f64, gst_rate: f64) -> Self {
        let line_totals: Vec<f64> = lines.iter().map(LineAmounts::total).collect();
        let subtotal = round2(line_totals.iter().sum());
        let taxable = round2((subtotal - discount).max(0.0));
        let gst_amount = round2(taxable * gst_rate / 100.0);
        let grand_total = round2(taxable + gst_amount);

        InvoiceTotals {
            line_totals,
            subtotal,
            discount: round2(discount),
            taxable,
            gst_rate,
            gst_amount,
            grand_total,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
