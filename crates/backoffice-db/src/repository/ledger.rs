//! # Ledger Repository
//!
//! Finance entries: one debit/credit line per business event.
//!
//! ## Automatic Postings
//! ```text
//! ┌──────────────────────┬────────────────────────┬────────────────────────┐
//! │ Event                │ Debit                  │ Credit                 │
//! ├──────────────────────┼────────────────────────┼────────────────────────┤
//! │ Invoice issued       │ Accounts Receivable    │ Sales                  │
//! │ Payment (cash)       │ Cash                   │ Accounts Receivable    │
//! │ Payment (other)      │ Bank                   │ Accounts Receivable    │
//! │ Manual entry         │ any                    │ any other account      │
//! └──────────────────────┴────────────────────────┴────────────────────────┘
//! ```
//!
//! Every line moves the same amount out of one account and into another, so
//! total debits always equal total credits.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use backoffice_core::{round2, validation, AccountBalance, FinanceEntry, NewFinanceEntry};

const SELECT_ENTRY: &str = "SELECT id, date, description, debit_account, credit_account, amount, invoice_id, payment_id FROM finance_entries";

/// Optional filters for [`LedgerRepository::list`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerFilter {
    /// Inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub to: Option<DateTime<Utc>>,
    /// Entries that debit or credit this account.
    pub account: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Entries matching the filter, newest first.
    pub async fn list(&self, filter: &LedgerFilter) -> DbResult<Vec<FinanceEntry>> {
        let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(SELECT_ENTRY);
        query.push(" WHERE 1 = 1");

        if let Some(from) = filter.from {
            query.push(" AND date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND date < ").push_bind(to);
        }
        if let Some(account) = filter.account.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            query
                .push(" AND (debit_account = ")
                .push_bind(account.to_string())
                .push(" OR credit_account = ")
                .push_bind(account.to_string())
                .push(")");
        }
        query.push(" ORDER BY date DESC, id DESC");

        let entries = query
            .build_query_as::<FinanceEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<FinanceEntry>> {
        let entry = sqlx::query_as::<_, FinanceEntry>(&format!("{SELECT_ENTRY} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    /// Records a manual journal line. Debit and credit accounts must differ.
    pub async fn manual_entry(&self, input: &NewFinanceEntry) -> DbResult<FinanceEntry> {
        let input = validation::finance_entry(input)?;

        let mut tx = self.pool.begin().await?;
        let entry = post(&mut *tx, &input).await?;
        tx.commit().await?;

        Ok(entry)
    }

    /// Total debits, credits and balance per account, ordered by name.
    pub async fn account_balances(&self) -> DbResult<Vec<AccountBalance>> {
        let balances = sqlx::query_as::<_, AccountBalance>(
            r#"
            SELECT account,
                   SUM(debit) AS debits,
                   SUM(credit) AS credits,
                   SUM(debit) - SUM(credit) AS balance
            FROM (
                SELECT debit_account AS account, amount AS debit, 0.0 AS credit
                FROM finance_entries
                UNION ALL
                SELECT credit_account AS account, 0.0 AS debit, amount AS credit
                FROM finance_entries
            )
            GROUP BY account
            ORDER BY account
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(balances
            .into_iter()
            .map(|b| AccountBalance {
                debits: round2(b.debits),
                credits: round2(b.credits),
                balance: round2(b.balance),
                account: b.account,
            })
            .collect())
    }

    /// Whether total debits equal total credits across all accounts.
    pub async fn trial_balance_is_balanced(&self) -> DbResult<bool> {
        let balances = self.account_balances().await?;
        let debits: f64 = balances.iter().map(|b| b.debits).sum();
        let credits: f64 = balances.iter().map(|b| b.credits).sum();

        Ok(round2(debits) == round2(credits))
    }
}

/// Writes one entry on the caller's transaction and returns it.
pub(crate) async fn post(conn: &mut SqliteConnection, input: &NewFinanceEntry) -> DbResult<FinanceEntry> {
    let date = input.date.unwrap_or_else(Utc::now);
    let amount = round2(input.amount);

    let id = sqlx::query(
        r#"
        INSERT INTO finance_entries (
            date, description, debit_account, credit_account, amount, invoice_id, payment_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(date)
    .bind(&input.description)
    .bind(&input.debit_account)
    .bind(&input.credit_account)
    .bind(amount)
    .bind(input.invoice_id)
    .bind(input.payment_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::ForeignKeyViolation { .. } => DbError::ForeignKeyViolation {
            message: "finance entry references a missing invoice or payment".to_string(),
        },
        other => other,
    })?
    .last_insert_rowid();

    debug!(
        id,
        debit = %input.debit_account,
        credit = %input.credit_account,
        amount,
        "Posted finance entry"
    );

    Ok(FinanceEntry {
        id,
        date,
        description: input.description.clone(),
        debit_account: input.debit_account.clone(),
        credit_account: input.credit_account.clone(),
        amount,
        invoice_id: input.invoice_id,
        payment_id: input.payment_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use backoffice_core::CoreError;

    fn entry(debit: &str, credit: &str, amount: f64) -> NewFinanceEntry {
        NewFinanceEntry {
            description: Some("Opening balance".to_string()),
            debit_account: debit.to_string(),
            credit_account: credit.to_string(),
            amount,
            invoice_id: None,
            payment_id: None,
            date: None,
        }
    }

    #[tokio::test]
    async fn test_manual_entries_and_balances() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger();

        ledger.manual_entry(&entry("Cash", "Capital", 50000.0)).await.unwrap();
        ledger.manual_entry(&entry("Rent", "Cash", 12000.0)).await.unwrap();

        let balances = ledger.account_balances().await.unwrap();
        let accounts: Vec<&str> = balances.iter().map(|b| b.account.as_str()).collect();
        assert_eq!(accounts, vec!["Capital", "Cash", "Rent"]);

        let cash = &balances[1];
        assert_eq!(cash.debits, 50000.0);
        assert_eq!(cash.credits, 12000.0);
        assert_eq!(cash.balance, 38000.0);

        assert!(ledger.trial_balance_is_balanced().await.unwrap());
    }

    #[tokio::test]
    async fn test_same_account_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db.ledger().manual_entry(&entry("Cash", "Cash", 10.0)).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::SameAccount { .. })));
    }

    #[tokio::test]
    async fn test_list_filters_by_account() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger();

        ledger.manual_entry(&entry("Cash", "Capital", 100.0)).await.unwrap();
        ledger.manual_entry(&entry("Bank", "Capital", 200.0)).await.unwrap();

        let all = ledger.list(&LedgerFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].debit_account, "Bank");

        let bank = ledger
            .list(&LedgerFilter {
                account: Some("Bank".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank[0].amount, 200.0);

        let future = ledger
            .list(&LedgerFilter {
                from: Some(Utc::now() + chrono::Duration::days(1)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(future.is_empty());
    }

    #[tokio::test]
    async fn test_manual_entry_with_missing_invoice() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut input = entry("Cash", "Sales", 10.0);
        input.invoice_id = Some(77);
        assert!(matches!(
            db.ledger().manual_entry(&input).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }
}
