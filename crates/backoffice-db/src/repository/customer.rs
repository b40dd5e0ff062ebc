//! # Customer Repository
//!
//! Customer CRUD plus the account statement (invoices, payments, balance).

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use backoffice_core::{validation, Customer, CustomerStatement, Invoice, NewCustomer, Payment};

const SELECT_CUSTOMER: &str = "SELECT id, name, address, phone, email, notes FROM customers";

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn create(&self, input: &NewCustomer) -> DbResult<Customer> {
        let input = validation::customer(input)?;

        debug!(name = %input.name, "Creating customer");

        let id = sqlx::query(
            r#"
            INSERT INTO customers (name, address, phone, email, notes)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.notes)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Customer {
            id,
            name: input.name,
            address: input.address,
            phone: input.phone,
            email: input.email,
            notes: input.notes,
        })
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!("{SELECT_CUSTOMER} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Lists customers ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers =
            sqlx::query_as::<_, Customer>(&format!("{SELECT_CUSTOMER} ORDER BY name, id"))
                .fetch_all(&self.pool)
                .await?;

        Ok(customers)
    }

    /// Replaces every editable field of a customer.
    pub async fn update(&self, id: i64, input: &NewCustomer) -> DbResult<Customer> {
        let input = validation::customer(input)?;

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                address = ?3,
                phone = ?4,
                email = ?5,
                notes = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.notes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        debug!(id, "Updated customer");
        Ok(Customer {
            id,
            name: input.name,
            address: input.address,
            phone: input.phone,
            email: input.email,
            notes: input.notes,
        })
    }

    /// Deletes a customer that has no invoices or payments.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::ForeignKeyViolation { .. } => DbError::ForeignKeyViolation {
                    message: format!("customer {id} still has invoices or payments"),
                },
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        debug!(id, "Deleted customer");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Builds the customer's statement: all invoices and payments, oldest
    /// first, with totals and the outstanding balance.
    pub async fn statement(&self, id: i64) -> DbResult<CustomerStatement> {
        let customer = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?;

        let invoices = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE customer_id = ?1 ORDER BY date, id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, customer_id, date, amount, method, notes, invoice_id
            FROM payments
            WHERE customer_id = ?1
            ORDER BY date, id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(CustomerStatement::new(customer, invoices, payments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn new_customer(name: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            phone: Some("0300-1234567".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_crud_cycle() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let created = repo.create(&new_customer("Lahore Bakers")).await.unwrap();
        assert_eq!(created.phone.as_deref(), Some("0300-1234567"));

        let mut changes = new_customer("Lahore Bakers & Co");
        changes.email = Some("orders@lahorebakers.pk".to_string());
        let updated = repo.update(created.id, &changes).await.unwrap();
        assert_eq!(updated.name, "Lahore Bakers & Co");

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.email.as_deref(), Some("orders@lahorebakers.pk"));

        repo.delete(created.id).await.unwrap();
        assert!(repo.get(created.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(created.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_ordered_by_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        repo.create(&new_customer("Zainab Foods")).await.unwrap();
        repo.create(&new_customer("Alpha Dairy")).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Alpha Dairy", "Zainab Foods"]);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db.customers().create(&new_customer("   ")).await.unwrap_err();
        assert!(matches!(err, DbError::Core(_)));
        assert_eq!(db.customers().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_customer() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(matches!(
            db.customers().update(7, &new_customer("Ghost")).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
