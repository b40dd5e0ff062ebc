//! # Report Repository
//!
//! Read-only aggregates for the reports pages and the dashboard.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::repository::{InvoiceRepository, StockRepository};
use backoffice_core::{round2, DashboardSummary, SalesSummary, StockValuation, TopProduct};

/// Invoices shown on the dashboard.
const RECENT_INVOICES: i64 = 5;

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Invoice and payment totals for `[from, to)`; either bound may be open.
    pub async fn sales_summary(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> DbResult<SalesSummary> {
        let (invoice_count, subtotal, gst_amount, grand_total, outstanding): (i64, f64, f64, f64, f64) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(i.subtotal), 0.0),
                       COALESCE(SUM(i.gst_amount), 0.0),
                       COALESCE(SUM(i.grand_total), 0.0),
                       COALESCE(SUM(i.grand_total - COALESCE(
                           (SELECT SUM(p.amount) FROM payments p WHERE p.invoice_id = i.id), 0.0
                       )), 0.0)
                FROM invoices i
                WHERE (?1 IS NULL OR i.date >= ?1)
                  AND (?2 IS NULL OR i.date < ?2)
                "#,
            )
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await?;

        let payments_received: f64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0.0)
            FROM payments
            WHERE (?1 IS NULL OR date >= ?1)
              AND (?2 IS NULL OR date < ?2)
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(SalesSummary {
            invoice_count,
            subtotal: round2(subtotal),
            gst_amount: round2(gst_amount),
            grand_total: round2(grand_total),
            payments_received: round2(payments_received),
            outstanding: round2(outstanding),
        })
    }

    /// Every stock row valued at its current unit price.
    pub async fn stock_valuation(&self) -> DbResult<StockValuation> {
        let lines = StockRepository::new(self.pool.clone()).list().await?;
        Ok(StockValuation::from_lines(&lines))
    }

    /// Best-selling products by invoiced revenue.
    pub async fn top_products(&self, limit: i64) -> DbResult<Vec<TopProduct>> {
        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT p.id AS product_id,
                   p.name AS product_name,
                   SUM(ii.quantity) AS quantity,
                   SUM(ii.total) AS revenue
            FROM invoice_items ii
            JOIN products p ON p.id = ii.product_id
            GROUP BY p.id, p.name
            ORDER BY revenue DESC, p.name
            LIMIT ?1
            "#,
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TopProduct {
                quantity: round2(row.quantity),
                revenue: round2(row.revenue),
                ..row
            })
            .collect())
    }

    /// Landing page counters and the latest invoices.
    pub async fn dashboard(&self) -> DbResult<DashboardSummary> {
        let (customers, products, stock_items, invoices): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT (SELECT COUNT(*) FROM customers),
                   (SELECT COUNT(*) FROM products),
                   (SELECT COUNT(*) FROM stock_items),
                   (SELECT COUNT(*) FROM invoices)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let receivables: f64 = sqlx::query_scalar(
            r#"
            SELECT (SELECT COALESCE(SUM(grand_total), 0.0) FROM invoices)
                 - (SELECT COALESCE(SUM(amount), 0.0) FROM payments)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let recent_invoices = InvoiceRepository::new(self.pool.clone())
            .recent(RECENT_INVOICES)
            .await?;

        Ok(DashboardSummary {
            customers,
            products,
            stock_items,
            invoices,
            receivables_outstanding: round2(receivables),
            recent_invoices,
        })
    }
}
