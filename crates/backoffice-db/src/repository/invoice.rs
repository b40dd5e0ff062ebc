//! # Invoice Repository
//!
//! Issues invoices, reads them back and deletes them.
//!
//! ## Invoice Creation (one transaction)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       create(draft)                                     │
//! │                                                                         │
//! │  1. validation::invoice_draft      (lines, quantities, GST range)      │
//! │  2. customer exists?               (else NotFound)                     │
//! │  3. InvoiceTotals::compute         (line totals, GST, grand total)     │
//! │  4. invoice number                 (given, or INV-YYYYMMDD-NNNN)       │
//! │  5. amount in words                (given, or rendered)                │
//! │  6. INSERT invoices                                                    │
//! │  7. per line:                                                          │
//! │       stock row by id or (product, sub-type) → deduct → history        │
//! │       INSERT invoice_items                                             │
//! │  8. ledger: Dr Accounts Receivable / Cr Sales                          │
//! │                                                                         │
//! │  COMMIT, or nothing at all if any step fails                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{ledger, stock};
use backoffice_core::{
    accounts, amount_in_words, round2, validation, Invoice, InvoiceDraft, InvoiceItem,
    InvoiceTotals, LineAmounts, NewFinanceEntry, DEFAULT_INVOICE_UOM,
};

/// Repository for invoices and their lines.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Issues an invoice: header, lines, stock deductions and the ledger
    /// posting are written together or not at all.
    ///
    /// ## Arguments
    /// * `draft` - Header fields and requested lines
    /// * `performed_by` - Recorded on the stock history rows
    /// * `allow_negative_stock` - Let lines take a stock row below zero
    ///
    /// ## Errors
    /// - `Core(InvalidInvoice | Validation)` for a malformed draft
    /// - `NotFound` for an unknown customer or stock row
    /// - `Core(InsufficientStock)` when a line exceeds stock on hand
    /// - `UniqueViolation` for a reused invoice number
    pub async fn create(
        &self,
        draft: &InvoiceDraft,
        performed_by: Option<&str>,
        allow_negative_stock: bool,
    ) -> DbResult<Invoice> {
        let draft = validation::invoice_draft(draft)?;

        let mut tx = self.pool.begin().await?;

        let customer_exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM customers WHERE id = ?1")
                .bind(draft.customer_id)
                .fetch_optional(&mut *tx)
                .await?;
        if customer_exists.is_none() {
            return Err(DbError::not_found("Customer", draft.customer_id));
        }

        let amounts: Vec<LineAmounts> = draft
            .lines
            .iter()
            .map(|line| LineAmounts {
                quantity: line.quantity,
                unit_price: line.unit_price,
                tax: line.tax,
            })
            .collect();
        let totals = InvoiceTotals::compute(&amounts, draft.discount, draft.gst_rate);

        let date = draft.date.unwrap_or_else(Utc::now);
        let invoice_number = match &draft.invoice_number {
            Some(number) => number.clone(),
            None => next_invoice_number(&mut *tx, date).await?,
        };
        let words = draft
            .amount_in_words
            .clone()
            .unwrap_or_else(|| amount_in_words(totals.grand_total));

        let header = &draft.header;
        let invoice_id = sqlx::query(
            r#"
            INSERT INTO invoices (
                invoice_number, date, customer_id,
                dispatch_type, payment_terms, ref_po_no, due_date,
                customer_ntn, customer_strn, customer_tel, customer_address,
                account, on_behalf_of, contact_person, contact_number,
                subtotal, discount, gst_rate, gst_amount, grand_total, amount_in_words
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15,
                ?16, ?17, ?18, ?19, ?20, ?21
            )
            "#,
        )
        .bind(&invoice_number)
        .bind(date)
        .bind(draft.customer_id)
        .bind(&header.dispatch_type)
        .bind(&header.payment_terms)
        .bind(&header.ref_po_no)
        .bind(header.due_date)
        .bind(&header.customer_ntn)
        .bind(&header.customer_strn)
        .bind(&header.customer_tel)
        .bind(&header.customer_address)
        .bind(&header.account)
        .bind(&header.on_behalf_of)
        .bind(&header.contact_person)
        .bind(&header.contact_number)
        .bind(totals.subtotal)
        .bind(totals.discount)
        .bind(totals.gst_rate)
        .bind(totals.gst_amount)
        .bind(totals.grand_total)
        .bind(&words)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_value(invoice_number.as_str()))?
        .last_insert_rowid();

        for (line, total) in draft.lines.iter().zip(&totals.line_totals) {
            let row = stock::deduct_for_invoice(
                &mut *tx,
                line,
                &invoice_number,
                performed_by,
                allow_negative_stock,
            )
            .await?;

            let uom = line.uom.as_deref().unwrap_or(DEFAULT_INVOICE_UOM);

            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    invoice_id, product_id, sub_type, uom, quantity, unit_price, tax, total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(invoice_id)
            .bind(row.product_id)
            .bind(&row.sub_type)
            .bind(uom)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.tax)
            .bind(*total)
            .execute(&mut *tx)
            .await?;
        }

        ledger::post(
            &mut *tx,
            &NewFinanceEntry {
                description: Some(format!("Invoice {invoice_number}")),
                debit_account: accounts::ACCOUNTS_RECEIVABLE.to_string(),
                credit_account: accounts::SALES.to_string(),
                amount: totals.grand_total,
                invoice_id: Some(invoice_id),
                payment_id: None,
                date: Some(date),
            },
        )
        .await?;

        let invoice = fetch_invoice(&mut *tx, invoice_id).await?;
        tx.commit().await?;

        info!(
            id = invoice.id,
            invoice_number = %invoice.invoice_number,
            customer_id = invoice.customer_id,
            lines = draft.lines.len(),
            grand_total = invoice.grand_total,
            "Invoice created"
        );
        Ok(invoice)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invoice)
    }

    pub async fn get_by_number(&self, invoice_number: &str) -> DbResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE invoice_number = ?1")
            .bind(invoice_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invoice)
    }

    /// Lines of an invoice, in entry order.
    pub async fn items(&self, invoice_id: i64) -> DbResult<Vec<InvoiceItem>> {
        let items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT id, invoice_id, product_id, sub_type, uom, quantity, unit_price, tax, total
            FROM invoice_items
            WHERE invoice_id = ?1
            ORDER BY id
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Invoices newest first, optionally for one customer.
    pub async fn list(&self, customer_id: Option<i64>) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT * FROM invoices
            WHERE ?1 IS NULL OR customer_id = ?1
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// The most recent invoices.
    pub async fn recent(&self, limit: i64) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices ORDER BY date DESC, id DESC LIMIT ?1",
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Deletes an invoice and its lines.
    ///
    /// Stock is not restored. Payments and finance entries that referenced
    /// the invoice keep their rows with the link cleared.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        info!(id, "Invoice deleted");
        Ok(())
    }

    /// `grand_total − Σ payments` linked to the invoice.
    pub async fn balance_due(&self, id: i64) -> DbResult<f64> {
        let row: Option<(f64, f64)> = sqlx::query_as(
            r#"
            SELECT i.grand_total,
                   COALESCE((SELECT SUM(p.amount) FROM payments p WHERE p.invoice_id = i.id), 0.0)
            FROM invoices i
            WHERE i.id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let (grand_total, paid) = row.ok_or_else(|| DbError::not_found("Invoice", id))?;
        Ok(round2(grand_total - paid))
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn fetch_invoice(conn: &mut SqliteConnection, id: i64) -> DbResult<Invoice> {
    sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Invoice", id))
}

/// Generates the next number of the day: `INV-YYYYMMDD-NNNN`.
///
/// NNNN is one past the highest suffix already used for that day, read
/// inside the creating transaction. Deleting an invoice never frees its
/// number for reuse.
async fn next_invoice_number(conn: &mut SqliteConnection, date: DateTime<Utc>) -> DbResult<String> {
    let prefix = format!("INV-{}-", date.format("%Y%m%d"));

    let highest: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(MAX(CAST(substr(invoice_number, ?2) AS INTEGER)), 0)
        FROM invoices
        WHERE substr(invoice_number, 1, ?3) = ?1
        "#,
    )
    .bind(&prefix)
    .bind(prefix.len() as i64 + 1)
    .bind(prefix.len() as i64)
    .fetch_one(&mut *conn)
    .await?;

    let number = format!("{prefix}{:04}", highest + 1);
    debug!(invoice_number = %number, "Generated invoice number");
    Ok(number)
}
