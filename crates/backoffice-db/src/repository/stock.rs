//! # Stock Repository
//!
//! Stock rows per (product, sub-type), their adjustments and the
//! append-only history written alongside every change.
//!
//! ## Change → History
//! ```text
//! ┌──────────────────────────────┬───────────────────┬──────────────────────┐
//! │ Operation                    │ action            │ history.quantity     │
//! ├──────────────────────────────┼───────────────────┼──────────────────────┤
//! │ create_stock_item            │ add               │ 0                    │
//! │ add_quantity(q)              │ add               │ +q                   │
//! │ edit(new)                    │ edit              │ new − old            │
//! │ update_price(p)              │ price_updated     │ 0 (old/new price)    │
//! │ invoice line (q)             │ deducted_on_inv.. │ −q, remarks = number │
//! └──────────────────────────────┴───────────────────┴──────────────────────┘
//! ```
//!
//! Each change and its history row are written in the same transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use backoffice_core::validation::{self, MAX_TEXT_LEN};
use backoffice_core::{
    group_stock_options, CoreError, GroupedStockOptions, InvoiceLineDraft, NewStockHistory,
    NewStockItem, StockAction, StockHistory, StockItem, StockLine, StockOptionRow,
    DEFAULT_STOCK_UNIT,
};

const SELECT_ITEM: &str =
    "SELECT id, product_id, sub_type, quantity, unit, unit_price FROM stock_items";

const SELECT_LINE: &str = r#"
    SELECT s.id, s.product_id, p.name AS product_name, s.sub_type,
           s.quantity, s.unit, s.unit_price
    FROM stock_items s
    JOIN products p ON p.id = s.product_id
"#;

/// Repository for stock rows and their history.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Product name → selectable stock rows, for the adjustment and invoice
    /// line forms.
    ///
    /// Products are ordered by name; inside a product the standard row comes
    /// first, then sub-types alphabetically.
    pub async fn grouped_options(&self) -> DbResult<GroupedStockOptions> {
        let rows = sqlx::query_as::<_, StockOptionRow>(
            r#"
            SELECT s.id AS stock_item_id, p.name AS product_name, s.sub_type
            FROM stock_items s
            JOIN products p ON p.id = s.product_id
            ORDER BY p.name, s.sub_type IS NOT NULL, s.sub_type
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(rows = rows.len(), "Loaded stock options");
        Ok(group_stock_options(rows))
    }

    /// Every stock row with its product name, ordered like the options.
    pub async fn list(&self) -> DbResult<Vec<StockLine>> {
        let lines = sqlx::query_as::<_, StockLine>(&format!(
            "{SELECT_LINE} ORDER BY p.name, s.sub_type IS NOT NULL, s.sub_type"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<StockItem>> {
        let item = sqlx::query_as::<_, StockItem>(&format!("{SELECT_ITEM} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// A single stock row with its product name.
    pub async fn get_line(&self, id: i64) -> DbResult<Option<StockLine>> {
        let line = sqlx::query_as::<_, StockLine>(&format!("{SELECT_LINE} WHERE s.id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(line)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Adds a new (product, sub-type) row at quantity 0.
    ///
    /// A second row for the same pair, or a second standard row, is a
    /// [`DbError::UniqueViolation`].
    pub async fn create_stock_item(
        &self,
        input: &NewStockItem,
        performed_by: Option<&str>,
    ) -> DbResult<StockItem> {
        let input = validation::stock_item(input)?;
        let unit = input.unit.unwrap_or_else(|| DEFAULT_STOCK_UNIT.to_string());

        let mut tx = self.pool.begin().await?;

        let product_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = ?1")
            .bind(input.product_id)
            .fetch_optional(&mut *tx)
            .await?;
        if product_exists.is_none() {
            return Err(DbError::not_found("Product", input.product_id));
        }

        let id = sqlx::query(
            r#"
            INSERT INTO stock_items (product_id, sub_type, quantity, unit, unit_price)
            VALUES (?1, ?2, 0.0, ?3, ?4)
            "#,
        )
        .bind(input.product_id)
        .bind(&input.sub_type)
        .bind(&unit)
        .bind(input.unit_price)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            DbError::from(e).with_value(
                input
                    .sub_type
                    .as_deref()
                    .unwrap_or(backoffice_core::STANDARD_LABEL),
            )
        })?
        .last_insert_rowid();

        append_history(
            &mut *tx,
            &NewStockHistory {
                product_id: input.product_id,
                sub_type: input.sub_type.clone(),
                action: StockAction::Add,
                quantity: 0.0,
                old_price: None,
                new_price: Some(input.unit_price),
                performed_by: performed_by.map(str::to_string),
                remarks: Some("Stock item created".to_string()),
            },
        )
        .await?;

        tx.commit().await?;

        debug!(id, product_id = input.product_id, sub_type = ?input.sub_type, "Created stock item");
        Ok(StockItem {
            id,
            product_id: input.product_id,
            sub_type: input.sub_type,
            quantity: 0.0,
            unit,
            unit_price: input.unit_price,
        })
    }

    /// Receives `quantity` into stock.
    pub async fn add_quantity(
        &self,
        id: i64,
        quantity: f64,
        performed_by: Option<&str>,
        remarks: Option<&str>,
    ) -> DbResult<StockItem> {
        validation::positive("quantity", quantity)?;
        let remarks = validation::optional_text("remarks", remarks, MAX_TEXT_LEN)?;

        let mut tx = self.pool.begin().await?;
        let item = fetch_item(&mut *tx, id).await?;

        sqlx::query("UPDATE stock_items SET quantity = quantity + ?2 WHERE id = ?1")
            .bind(id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

        append_history(
            &mut *tx,
            &NewStockHistory {
                product_id: item.product_id,
                sub_type: item.sub_type.clone(),
                action: StockAction::Add,
                quantity,
                old_price: None,
                new_price: None,
                performed_by: performed_by.map(str::to_string),
                remarks,
            },
        )
        .await?;

        let updated = fetch_item(&mut *tx, id).await?;
        tx.commit().await?;

        debug!(id, added = quantity, quantity = updated.quantity, "Stock added");
        Ok(updated)
    }

    /// Sets the absolute quantity (stock count correction) and optionally
    /// the unit. History records the delta.
    pub async fn edit(
        &self,
        id: i64,
        new_quantity: f64,
        unit: Option<&str>,
        performed_by: Option<&str>,
        remarks: Option<&str>,
    ) -> DbResult<StockItem> {
        validation::non_negative("quantity", new_quantity)?;
        let unit = validation::optional_text("unit", unit, 20)?;
        let remarks = validation::optional_text("remarks", remarks, MAX_TEXT_LEN)?;

        let mut tx = self.pool.begin().await?;
        let item = fetch_item(&mut *tx, id).await?;

        sqlx::query("UPDATE stock_items SET quantity = ?2, unit = COALESCE(?3, unit) WHERE id = ?1")
            .bind(id)
            .bind(new_quantity)
            .bind(&unit)
            .execute(&mut *tx)
            .await?;

        append_history(
            &mut *tx,
            &NewStockHistory {
                product_id: item.product_id,
                sub_type: item.sub_type.clone(),
                action: StockAction::Edit,
                quantity: new_quantity - item.quantity,
                old_price: None,
                new_price: None,
                performed_by: performed_by.map(str::to_string),
                remarks,
            },
        )
        .await?;

        let updated = fetch_item(&mut *tx, id).await?;
        tx.commit().await?;

        debug!(id, old = item.quantity, new = new_quantity, "Stock edited");
        Ok(updated)
    }

    /// Changes the unit price. History keeps the old and new price.
    pub async fn update_price(
        &self,
        id: i64,
        new_price: f64,
        performed_by: Option<&str>,
        remarks: Option<&str>,
    ) -> DbResult<StockItem> {
        validation::non_negative("unit_price", new_price)?;
        let remarks = validation::optional_text("remarks", remarks, MAX_TEXT_LEN)?;

        let mut tx = self.pool.begin().await?;
        let item = fetch_item(&mut *tx, id).await?;

        sqlx::query("UPDATE stock_items SET unit_price = ?2 WHERE id = ?1")
            .bind(id)
            .bind(new_price)
            .execute(&mut *tx)
            .await?;

        append_history(
            &mut *tx,
            &NewStockHistory {
                product_id: item.product_id,
                sub_type: item.sub_type.clone(),
                action: StockAction::PriceUpdated,
                quantity: 0.0,
                old_price: Some(item.unit_price),
                new_price: Some(new_price),
                performed_by: performed_by.map(str::to_string),
                remarks,
            },
        )
        .await?;

        let updated = fetch_item(&mut *tx, id).await?;
        tx.commit().await?;

        debug!(id, old = item.unit_price, new = new_price, "Stock price updated");
        Ok(updated)
    }

    /// History rows, newest first, optionally for one product.
    pub async fn history(&self, product_id: Option<i64>, limit: i64) -> DbResult<Vec<StockHistory>> {
        let rows = sqlx::query_as::<_, StockHistory>(
            r#"
            SELECT id, product_id, sub_type, action, quantity, old_price, new_price,
                   performed_by, timestamp, remarks
            FROM stock_history
            WHERE ?1 IS NULL OR product_id = ?1
            ORDER BY timestamp DESC, id DESC
            LIMIT ?2
            "#,
        )
        .bind(product_id)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

async fn fetch_item(conn: &mut SqliteConnection, id: i64) -> DbResult<StockItem> {
    sqlx::query_as::<_, StockItem>(&format!("{SELECT_ITEM} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Stock item", id))
}

/// Appends one history row on the caller's transaction.
pub(crate) async fn append_history(
    conn: &mut SqliteConnection,
    entry: &NewStockHistory,
) -> DbResult<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO stock_history (
            product_id, sub_type, action, quantity,
            old_price, new_price, performed_by, timestamp, remarks
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(entry.product_id)
    .bind(&entry.sub_type)
    .bind(entry.action)
    .bind(entry.quantity)
    .bind(entry.old_price)
    .bind(entry.new_price)
    .bind(&entry.performed_by)
    .bind(Utc::now())
    .bind(&entry.remarks)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// The stock row an invoice line resolved to.
#[derive(Debug)]
pub(crate) struct DeductedRow {
    pub product_id: i64,
    pub sub_type: Option<String>,
}

/// Takes an invoice line's quantity out of the matching stock row and logs
/// it against the invoice number.
///
/// The row is looked up inside the caller's transaction, by id when the
/// line carries one and by (product, sub-type) otherwise.
///
/// ## Errors
/// - [`DbError::NotFound`] when no such row exists
/// - [`CoreError::InvalidInvoice`] when the line's product disagrees with
///   the row its `stock_item_id` points at
/// - [`CoreError::InsufficientStock`] when the row holds less than the line
///   asks for and negative stock is not allowed
pub(crate) async fn deduct_for_invoice(
    conn: &mut SqliteConnection,
    line: &InvoiceLineDraft,
    invoice_number: &str,
    performed_by: Option<&str>,
    allow_negative_stock: bool,
) -> DbResult<DeductedRow> {
    let (stock_item_id, product_id, sub_type, available, product_name) =
        find_line_row(conn, line).await?;

    if !allow_negative_stock && available < line.quantity {
        let item = match &sub_type {
            Some(sub_type) => format!("{product_name} ({sub_type})"),
            None => product_name,
        };
        return Err(CoreError::InsufficientStock {
            item,
            available,
            requested: line.quantity,
        }
        .into());
    }

    sqlx::query("UPDATE stock_items SET quantity = quantity - ?2 WHERE id = ?1")
        .bind(stock_item_id)
        .bind(line.quantity)
        .execute(&mut *conn)
        .await?;

    append_history(
        conn,
        &NewStockHistory {
            product_id,
            sub_type: sub_type.clone(),
            action: StockAction::DeductedOnInvoice,
            quantity: -line.quantity,
            old_price: None,
            new_price: None,
            performed_by: performed_by.map(str::to_string),
            remarks: Some(invoice_number.to_string()),
        },
    )
    .await?;

    debug!(stock_item_id, deducted = line.quantity, invoice_number, "Stock deducted");
    Ok(DeductedRow {
        product_id,
        sub_type,
    })
}

/// (stock id, product id, sub-type, on hand, product name)
type LineRow = (i64, i64, Option<String>, f64, String);

const LINE_ROW_BY_ID: &str = r#"
    SELECT s.id, s.product_id, s.sub_type, s.quantity, p.name
    FROM stock_items s
    JOIN products p ON p.id = s.product_id
    WHERE s.id = ?1
"#;

const LINE_ROW_BY_PRODUCT: &str = r#"
    SELECT s.id, s.product_id, s.sub_type, s.quantity, p.name
    FROM stock_items s
    JOIN products p ON p.id = s.product_id
    WHERE s.product_id = ?1 AND s.sub_type IS ?2
"#;

async fn find_line_row(conn: &mut SqliteConnection, line: &InvoiceLineDraft) -> DbResult<LineRow> {
    if let Some(id) = line.stock_item_id {
        let row: LineRow = sqlx::query_as(LINE_ROW_BY_ID)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Stock item", id))?;

        if let Some(product_id) = line.product_id {
            if product_id != row.1 {
                return Err(CoreError::InvalidInvoice {
                    reason: format!("stock item {id} does not belong to product {product_id}"),
                }
                .into());
            }
        }
        return Ok(row);
    }

    let product_id = line.product_id.ok_or_else(|| CoreError::InvalidInvoice {
        reason: "each line needs a stock_item_id or a product_id".to_string(),
    })?;

    sqlx::query_as(LINE_ROW_BY_PRODUCT)
        .bind(product_id)
        .bind(&line.sub_type)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| {
            let sub_type = line.sub_type.as_deref().unwrap_or(backoffice_core::STANDARD_LABEL);
            DbError::not_found("Stock item", format!("product {product_id} / {sub_type}"))
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.seed_catalog_if_empty().await.unwrap();
        db
    }

    async fn stock_id(db: &Database, product: &str, sub_type: Option<&str>) -> i64 {
        db.stock()
            .list()
            .await
            .unwrap()
            .into_iter()
            .find(|l| l.product_name == product && l.sub_type.as_deref() == sub_type)
            .map(|l| l.id)
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_edit_price_write_history() {
        let db = seeded().await;
        let repo = db.stock();
        let id = stock_id(&db, "Butter", Some("Salted")).await;

        let item = repo.add_quantity(id, 25.0, Some("admin"), Some("GRN-7")).await.unwrap();
        assert_eq!(item.quantity, 25.0);

        let item = repo.edit(id, 20.5, None, Some("admin"), None).await.unwrap();
        assert_eq!(item.quantity, 20.5);
        assert_eq!(item.unit, "kg");

        let item = repo.update_price(id, 1150.0, Some("admin"), None).await.unwrap();
        assert_eq!(item.unit_price, 1150.0);

        let history = repo.history(Some(item.product_id), 10).await.unwrap();
        assert_eq!(history.len(), 3);

        let price = &history[0];
        assert_eq!(price.action, StockAction::PriceUpdated);
        assert_eq!(price.old_price, Some(0.0));
        assert_eq!(price.new_price, Some(1150.0));

        let edit = &history[1];
        assert_eq!(edit.action, StockAction::Edit);
        assert_eq!(edit.quantity, -4.5);

        let add = &history[2];
        assert_eq!(add.action, StockAction::Add);
        assert_eq!(add.quantity, 25.0);
        assert_eq!(add.remarks.as_deref(), Some("GRN-7"));
        assert_eq!(add.performed_by.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_invalid_adjustments_rejected() {
        let db = seeded().await;
        let repo = db.stock();
        let id = stock_id(&db, "Yogurt", None).await;

        assert!(repo.add_quantity(id, 0.0, None, None).await.is_err());
        assert!(repo.edit(id, -1.0, None, None, None).await.is_err());
        assert!(repo.update_price(id, -5.0, None, None).await.is_err());
        assert!(matches!(
            repo.add_quantity(9999, 1.0, None, None).await,
            Err(DbError::NotFound { .. })
        ));

        assert!(repo.history(None, 50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_changes_unit() {
        let db = seeded().await;
        let id = stock_id(&db, "Vinegar", None).await;

        let item = db.stock().edit(id, 12.0, Some("litre"), None, None).await.unwrap();
        assert_eq!(item.unit, "litre");
        assert_eq!(item.quantity, 12.0);
    }

    #[tokio::test]
    async fn test_create_stock_item_for_missing_product() {
        let db = seeded().await;

        let err = db
            .stock()
            .create_stock_item(
                &NewStockItem {
                    product_id: 404,
                    sub_type: Some("Smoked".to_string()),
                    unit: None,
                    unit_price: 0.0,
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
