//! # Product Repository
//!
//! Database operations for products. Stock per sub-type lives in
//! [`super::StockRepository`].

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use backoffice_core::{validation, NewProduct, Product};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let ghee = repo.create(&NewProduct { name: "Cheese".into(), category: "Dairy".into() }).await?;
/// let all = repo.list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product. Names are unique.
    pub async fn create(&self, input: &NewProduct) -> DbResult<Product> {
        let input = validation::product(input)?;

        debug!(name = %input.name, category = %input.category, "Creating product");

        let id = sqlx::query("INSERT INTO products (name, category) VALUES (?1, ?2)")
            .bind(&input.name)
            .bind(&input.category)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_value(input.name.as_str()))?
            .last_insert_rowid();

        Ok(Product {
            id,
            name: input.name,
            category: input.category,
        })
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, category FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its exact name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, category FROM products WHERE name = ?1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, category FROM products ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
