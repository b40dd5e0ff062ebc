//! # Database Errors
//!
//! Everything a repository call can fail with. SQLite constraint failures are
//! recognised from their message text and given their own variants so the
//! server can answer 400 instead of 500:
//!
//! ```text
//!   "UNIQUE constraint failed: products.name"  ─► UniqueViolation { field: "products.name" }
//!   "FOREIGN KEY constraint failed"            ─► ForeignKeyViolation
//!   RowNotFound                                ─► NotFound
//!   PoolTimedOut                               ─► PoolExhausted
//!   CoreError raised inside a transaction      ─► Core(..)
//! ```

use backoffice_core::{CoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row for the given key, or no stock row for an invoice line's
    /// (product, sub-type).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Duplicate product name, invoice number, admin username or email, or a
    /// second stock row for the same (product, sub-type).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A reference to a missing row, or a delete that would orphan one.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A business rule failed while the transaction was open.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other error reported by SQLite itself.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// SQLite names the column but not the value; callers that know the
    /// offending input fill it in here. Other variants pass through.
    pub(crate) fn with_value(self, value: impl Into<String>) -> Self {
        match self {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: value.into(),
            },
            other => other,
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Core(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => classify_constraint(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

fn classify_constraint(message: &str) -> DbError {
    if let Some(columns) = message.strip_prefix("UNIQUE constraint failed: ") {
        DbError::duplicate(columns, "unknown")
    } else if message.contains("FOREIGN KEY constraint failed") {
        DbError::ForeignKeyViolation {
            message: message.to_string(),
        }
    } else {
        DbError::QueryFailed(message.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DbError::not_found("Customer", 42);
        assert_eq!(err.to_string(), "Customer not found: 42");
    }

    #[test]
    fn test_constraint_messages() {
        assert!(matches!(
            classify_constraint("UNIQUE constraint failed: stock_items.product_id, stock_items.sub_type"),
            DbError::UniqueViolation { field, .. } if field == "stock_items.product_id, stock_items.sub_type"
        ));
        assert!(matches!(
            classify_constraint("FOREIGN KEY constraint failed"),
            DbError::ForeignKeyViolation { .. }
        ));
        assert!(matches!(
            classify_constraint("no such table: widgets"),
            DbError::QueryFailed(_)
        ));
    }

    #[test]
    fn test_with_value_only_touches_unique_violations() {
        let err = DbError::duplicate("products.name", "unknown").with_value("Butter");
        assert_eq!(
            err.to_string(),
            "Duplicate products.name: 'Butter' already exists"
        );

        let err = DbError::PoolExhausted.with_value("ignored");
        assert!(matches!(err, DbError::PoolExhausted));
    }

    #[test]
    fn test_validation_error_becomes_core() {
        let err: DbError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
        assert_eq!(err.to_string(), "Validation error: name is required");
    }
}
