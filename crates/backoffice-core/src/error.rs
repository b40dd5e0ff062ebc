//! Errors raised by the pure business rules.
//!
//! [`ValidationError`] covers a single bad input field; [`CoreError`] covers
//! rules that span several rows (stock on hand, invoice ownership, ledger
//! accounts). The db crate wraps `CoreError` in `DbError::Core`, and the
//! server maps that onto an HTTP status.

use thiserror::Error;

/// A business rule refused the operation.
///
/// Repositories raise these mid-transaction; the transaction is dropped
/// (rolled back) on the way out.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The (product, sub-type) row holds less than the line quantity and
    /// negative stock is not allowed.
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: f64,
        requested: f64,
    },

    /// The draft has no lines.
    #[error("Invalid invoice: {reason}")]
    InvalidInvoice { reason: String },

    /// A payment references an invoice issued to a different customer.
    #[error("Invoice {invoice_id} does not belong to customer {customer_id}")]
    InvoiceCustomerMismatch { invoice_id: i64, customer_id: i64 },

    /// A ledger entry debits and credits the same account.
    #[error("Debit and credit account must differ (got '{account}')")]
    SameAccount { account: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// One input field failed a check. The message names the field.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Absent, empty, or whitespace only.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Quantities and amounts.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Prices, tax, discounts.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Malformed emails and usernames, short passwords, non-finite numbers.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_messages() {
        let err = CoreError::InsufficientStock {
            item: "Butter (Salted)".to_string(),
            available: 3.0,
            requested: 5.5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Butter (Salted): available 3, requested 5.5"
        );

        let err = CoreError::SameAccount {
            account: "Cash".to_string(),
        };
        assert_eq!(err.to_string(), "Debit and credit account must differ (got 'Cash')");
    }

    #[test]
    fn test_field_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::MustNotBeNegative {
            field: "unit_price".to_string(),
        };
        assert_eq!(err.to_string(), "unit_price must not be negative");
    }

    #[test]
    fn test_field_error_wraps_into_core() {
        let err: CoreError = ValidationError::Required {
            field: "username".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::Validation(ValidationError::Required { .. })));
    }
}
