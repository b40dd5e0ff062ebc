//! # Payment Repository
//!
//! Money received from customers. Each payment is posted to the ledger in
//! the same transaction: debit Cash (or Bank), credit Accounts Receivable.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::ledger;
use backoffice_core::validation::{self, MAX_TEXT_LEN};
use backoffice_core::{accounts, round2, CoreError, NewFinanceEntry, NewPayment, Payment};

const SELECT_PAYMENT: &str =
    "SELECT id, customer_id, date, amount, method, notes, invoice_id FROM payments";

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Records a payment and its ledger entry.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown customer or invoice
    /// - `Core(InvoiceCustomerMismatch)` when the invoice belongs to another customer
    pub async fn record(&self, input: &NewPayment) -> DbResult<Payment> {
        validation::payment(input)?;
        let method = validation::optional_text("method", input.method.as_deref(), 50)?;
        let notes = validation::optional_text("notes", input.notes.as_deref(), MAX_TEXT_LEN)?;
        let amount = round2(input.amount);
        let date = input.date.unwrap_or_else(Utc::now);

        let mut tx = self.pool.begin().await?;

        let customer_name: Option<String> =
            sqlx::query_scalar("SELECT name FROM customers WHERE id = ?1")
                .bind(input.customer_id)
                .fetch_optional(&mut *tx)
                .await?;
        let customer_name =
            customer_name.ok_or_else(|| DbError::not_found("Customer", input.customer_id))?;

        if let Some(invoice_id) = input.invoice_id {
            let owner: Option<i64> =
                sqlx::query_scalar("SELECT customer_id FROM invoices WHERE id = ?1")
                    .bind(invoice_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            match owner {
                None => return Err(DbError::not_found("Invoice", invoice_id)),
                Some(owner) if owner != input.customer_id => {
                    return Err(CoreError::InvoiceCustomerMismatch {
                        invoice_id,
                        customer_id: input.customer_id,
                    }
                    .into())
                }
                Some(_) => {}
            }
        }

        let id = sqlx::query(
            r#"
            INSERT INTO payments (customer_id, date, amount, method, notes, invoice_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(input.customer_id)
        .bind(date)
        .bind(amount)
        .bind(&method)
        .bind(&notes)
        .bind(input.invoice_id)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        ledger::post(
            &mut *tx,
            &NewFinanceEntry {
                description: Some(format!("Payment received from {customer_name}")),
                debit_account: input.receiving_account().to_string(),
                credit_account: accounts::ACCOUNTS_RECEIVABLE.to_string(),
                amount,
                invoice_id: input.invoice_id,
                payment_id: Some(id),
                date: Some(date),
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            id,
            customer_id = input.customer_id,
            invoice_id = ?input.invoice_id,
            amount,
            "Payment recorded"
        );

        Ok(Payment {
            id,
            customer_id: input.customer_id,
            date,
            amount,
            method,
            notes,
            invoice_id: input.invoice_id,
        })
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!("{SELECT_PAYMENT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    /// Payments newest first, optionally for one customer.
    pub async fn list(&self, customer_id: Option<i64>) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "{SELECT_PAYMENT} WHERE ?1 IS NULL OR customer_id = ?1 ORDER BY date DESC, id DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }
}
