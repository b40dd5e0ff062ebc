//! # Database Migrations
//!
//! Embedded SQL migrations for the back office.
//!
//! `Database::new` applies whatever is pending before anything else touches
//! the schema; sqlx records each applied file in `_sqlx_migrations`.
//!
//! New schema changes go in a new `migrations/sqlite/NNN_description.sql`.
//! Applied files are checksummed, so editing one breaks existing databases.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Migrations from `migrations/sqlite`, embedded at compile time.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies pending migrations; a no-op on an up-to-date database.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!(embedded = MIGRATOR.migrations.len(), "Schema up to date");
    Ok(())
}

/// Embedded vs applied migration counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub total: usize,
    pub applied: usize,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.total
    }
}

/// Returns how many embedded migrations exist and how many are applied.
///
/// Used by the health endpoint.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 =
        match sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
        {
            Ok(applied) => applied,
            // No table yet means nothing applied.
            Err(sqlx::Error::Database(e)) if is_missing_table(e.message()) => 0,
            Err(e) => return Err(e.into()),
        };

    Ok(MigrationStatus {
        total,
        applied: applied as usize,
    })
}

fn is_missing_table(message: &str) -> bool {
    message.starts_with("no such table")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn test_status_before_and_after_migrating() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        let before = migration_status(&pool).await.unwrap();
        assert_eq!(before.applied, 0);
        assert!(!before.is_current());

        run_migrations(&pool).await.unwrap();
        assert!(migration_status(&pool).await.unwrap().is_current());
    }

    #[tokio::test]
    async fn test_status_reports_other_failures() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        pool.close().await;

        assert!(migration_status(&pool).await.is_err());
        assert!(is_missing_table("no such table: _sqlx_migrations"));
        assert!(!is_missing_table("database is locked"));
    }
}
