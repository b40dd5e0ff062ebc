//! # Catalog Seeding
//!
//! Writes the default products and their stock rows the first time the
//! server starts against an empty database.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    seed_catalog_if_empty()                              │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  INSERT INTO products (name, category)                                 │
//! │    SELECT column1, column2 FROM (VALUES (..), (..), ...)               │
//! │    WHERE NOT EXISTS (SELECT 1 FROM products)                           │
//! │    │                                                                    │
//! │    ├── 0 rows ──► ROLLBACK ──► AlreadySeeded                           │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  INSERT INTO stock_items ... per (product, sub-type)                   │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  COMMIT ──► Seeded { products: 5, stock_items: 14 }                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The emptiness check and the product insert are a single statement, so two
//! processes racing on a fresh file cannot both insert the catalog: the
//! loser either sees rows and inserts nothing, or hits the unique index on
//! `products.name` and rolls back.

use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use backoffice_core::catalog::{seed_stock_rows, DEFAULT_CATALOG};
use backoffice_core::DEFAULT_STOCK_UNIT;

use crate::error::DbResult;

/// What [`seed_catalog_if_empty`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SeedOutcome {
    /// Products already existed; nothing was written.
    AlreadySeeded,
    /// The catalog was written.
    Seeded { products: u64, stock_items: u64 },
}

/// Inserts the default catalog if, and only if, no product exists.
///
/// Either every product and stock row is written or none is.
pub async fn seed_catalog_if_empty(pool: &SqlitePool) -> DbResult<SeedOutcome> {
    let mut tx = pool.begin().await?;

    let mut insert_products: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new("INSERT INTO products (name, category) SELECT column1, column2 FROM (");
    insert_products.push_values(DEFAULT_CATALOG.iter(), |mut row, product| {
        row.push_bind(product.name).push_bind(product.category);
    });
    insert_products.push(") WHERE NOT EXISTS (SELECT 1 FROM products)");

    let products = insert_products
        .build()
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if products == 0 {
        tx.rollback().await?;
        debug!("Products present, skipping catalog seed");
        return Ok(SeedOutcome::AlreadySeeded);
    }

    let mut stock_items = 0;
    for (product_name, sub_type) in seed_stock_rows() {
        stock_items += sqlx::query(
            r#"
            INSERT INTO stock_items (product_id, sub_type, quantity, unit, unit_price)
            SELECT id, ?1, 0.0, ?2, 0.0 FROM products WHERE name = ?3
            "#,
        )
        .bind(sub_type)
        .bind(DEFAULT_STOCK_UNIT)
        .bind(product_name)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;

    info!(products, stock_items, "Seeded default catalog");
    Ok(SeedOutcome::Seeded {
        products,
        stock_items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_seed_writes_catalog_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let first = seed_catalog_if_empty(db.pool()).await.unwrap();
        assert_eq!(
            first,
            SeedOutcome::Seeded {
                products: 5,
                stock_items: 14
            }
        );

        let second = seed_catalog_if_empty(db.pool()).await.unwrap();
        assert_eq!(second, SeedOutcome::AlreadySeeded);
    }

    #[tokio::test]
    async fn test_seeded_rows_are_empty_kg() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_catalog_if_empty(db.pool()).await.unwrap();

        let non_default: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stock_items WHERE quantity <> 0 OR unit_price <> 0 OR unit <> 'kg'",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(non_default, 0);
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let json = serde_json::to_value(SeedOutcome::Seeded {
            products: 5,
            stock_items: 14,
        })
        .unwrap();
        assert_eq!(json["outcome"], "seeded");
        assert_eq!(json["stock_items"], 14);
    }
}
