//! # Admin User Repository
//!
//! Storage for back-office operators. Password hashing happens in the
//! server; this repository only ever sees PHC strings.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use backoffice_core::{validation, AdminUser};

#[derive(Debug, Clone)]
pub struct AdminUserRepository {
    pool: SqlitePool,
}

impl AdminUserRepository {
    /// Creates a new AdminUserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AdminUserRepository { pool }
    }

    /// Inserts an active admin.
    ///
    /// A duplicate username or email is a [`DbError::UniqueViolation`].
    pub async fn create(
        &self,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
    ) -> DbResult<AdminUser> {
        let username = validation::username(username)?;
        let email = validation::optional_email(email)?;

        debug!(username = %username, "Creating admin user");

        let id = sqlx::query(
            "INSERT INTO admin_users (username, email, password_hash, is_active) VALUES (?1, ?2, ?3, 1)",
        )
        .bind(&username)
        .bind(&email)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(username.as_str()))?
        .last_insert_rowid();

        Ok(AdminUser {
            id,
            username,
            email,
            password_hash: password_hash.to_string(),
            is_active: true,
        })
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<AdminUser>> {
        let user = sqlx::query_as::<_, AdminUser>(
            "SELECT id, username, email, password_hash, is_active FROM admin_users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Looks a user up by username (exact match, active or not).
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<AdminUser>> {
        let user = sqlx::query_as::<_, AdminUser>(
            "SELECT id, username, email, password_hash, is_active FROM admin_users WHERE username = ?1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Enables or disables sign-in for a user.
    pub async fn set_active(&self, id: i64, is_active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE admin_users SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(is_active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Admin user", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
