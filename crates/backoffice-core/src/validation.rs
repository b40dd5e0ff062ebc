//! # Validation Module
//!
//! Server-side input validation for every form the back office accepts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP route (axum)                                            │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, lengths                                          │
//! │  ├── Non-negative / positive amounts                                   │
//! │  └── Normalization (trim, empty → None)                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (product name, (product, sub-type), ...)       │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validators that accept text return the normalized value so callers store
//! exactly what was checked.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{
    InvoiceDraft, InvoiceHeader, InvoiceLineDraft, NewCustomer, NewFinanceEntry, NewPayment,
    NewProduct, NewStockItem,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest free-text field accepted (matches the widest `VARCHAR` of the schema).
pub const MAX_TEXT_LEN: usize = 255;

/// Shortest accepted admin password.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Trims a required text field and checks its length.
///
/// ## Example
/// ```rust
/// use backoffice_core::validation::required_text;
///
/// assert_eq!(required_text("name", "  Butter ", 120).unwrap(), "Butter");
/// assert!(required_text("name", "   ", 120).is_err());
/// ```
pub fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Trims an optional text field; blank becomes `None`.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        Some(v) => Ok(Some(v.to_string())),
    }
}

/// Checks an optional email address for a plausible `local@domain.tld` shape.
pub fn optional_email(value: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(email) = optional_text("email", value, 120)? else {
        return Ok(None);
    };

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    Ok(Some(email))
}

fn finite(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    Ok(())
}

/// Validates a value that must be strictly greater than zero.
///
/// ```rust
/// use backoffice_core::validation::positive;
///
/// assert!(positive("quantity", 0.5).is_ok());
/// assert!(positive("quantity", 0.0).is_err());
/// assert!(positive("quantity", f64::NAN).is_err());
/// ```
pub fn positive(field: &str, value: f64) -> ValidationResult<()> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a value that may be zero but not negative.
pub fn non_negative(field: &str, value: f64) -> ValidationResult<()> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a GST rate given in percent (0–100).
pub fn gst_rate(rate: f64) -> ValidationResult<()> {
    finite("gst_rate", rate)?;
    if !(0.0..=100.0).contains(&rate) {
        return Err(ValidationError::OutOfRange {
            field: "gst_rate".to_string(),
            min: 0.0,
            max: 100.0,
        });
    }
    Ok(())
}

/// Validates and normalizes a customer form.
pub fn customer(input: &NewCustomer) -> ValidationResult<NewCustomer> {
    Ok(NewCustomer {
        name: required_text("name", &input.name, 120)?,
        address: optional_text("address", input.address.as_deref(), MAX_TEXT_LEN)?,
        phone: optional_text("phone", input.phone.as_deref(), 50)?,
        email: optional_email(input.email.as_deref())?,
        notes: optional_text("notes", input.notes.as_deref(), 2000)?,
    })
}

/// Validates and normalizes a product form.
pub fn product(input: &NewProduct) -> ValidationResult<NewProduct> {
    Ok(NewProduct {
        name: required_text("name", &input.name, 120)?,
        category: required_text("category", &input.category, 120)?,
    })
}

/// Validates and normalizes a new stock row.
pub fn stock_item(input: &NewStockItem) -> ValidationResult<NewStockItem> {
    non_negative("unit_price", input.unit_price)?;
    Ok(NewStockItem {
        product_id: input.product_id,
        sub_type: optional_text("sub_type", input.sub_type.as_deref(), 120)?,
        unit: optional_text("unit", input.unit.as_deref(), 20)?,
        unit_price: input.unit_price,
    })
}

/// Validates an invoice draft before any row is touched and returns the
/// normalized copy the invoice is written from.
///
/// ## Rules
/// - At least one line
/// - Every line names a stock row, by `stock_item_id` or by
///   (`product_id`, `sub_type`)
/// - Every line: quantity > 0, unit_price ≥ 0, tax ≥ 0
/// - Header: discount ≥ 0, GST rate within 0–100
/// - Invoice number, when given, is non-blank and at most 50 characters
///
/// Text fields are trimmed and blank values become `None`, so a line with
/// `sub_type: Some("")` selects the standard row.
pub fn invoice_draft(draft: &InvoiceDraft) -> CoreResult<InvoiceDraft> {
    if draft.lines.is_empty() {
        return Err(CoreError::InvalidInvoice {
            reason: "an invoice needs at least one line".to_string(),
        });
    }

    let lines = draft
        .lines
        .iter()
        .map(invoice_line)
        .collect::<CoreResult<Vec<_>>>()?;

    non_negative("discount", draft.discount)?;
    gst_rate(draft.gst_rate)?;

    let invoice_number = match &draft.invoice_number {
        Some(number) => Some(required_text("invoice_number", number, 50)?),
        None => None,
    };

    Ok(InvoiceDraft {
        invoice_number,
        date: draft.date,
        customer_id: draft.customer_id,
        header: invoice_header(&draft.header)?,
        discount: draft.discount,
        gst_rate: draft.gst_rate,
        amount_in_words: optional_text("amount_in_words", draft.amount_in_words.as_deref(), 1000)?,
        lines,
    })
}

fn invoice_line(line: &InvoiceLineDraft) -> CoreResult<InvoiceLineDraft> {
    if line.stock_item_id.is_none() && line.product_id.is_none() {
        return Err(CoreError::InvalidInvoice {
            reason: "each line needs a stock_item_id or a product_id".to_string(),
        });
    }

    positive("quantity", line.quantity)?;
    non_negative("unit_price", line.unit_price)?;
    non_negative("tax", line.tax)?;

    Ok(InvoiceLineDraft {
        stock_item_id: line.stock_item_id,
        product_id: line.product_id,
        sub_type: optional_text("sub_type", line.sub_type.as_deref(), 120)?,
        uom: optional_text("uom", line.uom.as_deref(), 20)?,
        quantity: line.quantity,
        unit_price: line.unit_price,
        tax: line.tax,
    })
}

fn invoice_header(header: &InvoiceHeader) -> ValidationResult<InvoiceHeader> {
    let text = |field: &str, value: &Option<String>| {
        optional_text(field, value.as_deref(), MAX_TEXT_LEN)
    };

    Ok(InvoiceHeader {
        dispatch_type: text("dispatch_type", &header.dispatch_type)?,
        payment_terms: text("payment_terms", &header.payment_terms)?,
        ref_po_no: text("ref_po_no", &header.ref_po_no)?,
        due_date: header.due_date,
        customer_ntn: text("customer_ntn", &header.customer_ntn)?,
        customer_strn: text("customer_strn", &header.customer_strn)?,
        customer_tel: text("customer_tel", &header.customer_tel)?,
        customer_address: text("customer_address", &header.customer_address)?,
        account: text("account", &header.account)?,
        on_behalf_of: text("on_behalf_of", &header.on_behalf_of)?,
        contact_person: text("contact_person", &header.contact_person)?,
        contact_number: text("contact_number", &header.contact_number)?,
    })
}

/// Validates a payment form.
pub fn payment(input: &NewPayment) -> ValidationResult<()> {
    positive("amount", input.amount)?;
    optional_text("method", input.method.as_deref(), 50)?;
    optional_text("notes", input.notes.as_deref(), MAX_TEXT_LEN)?;
    Ok(())
}

/// Validates a manual ledger entry.
pub fn finance_entry(input: &NewFinanceEntry) -> CoreResult<NewFinanceEntry> {
    positive("amount", input.amount)?;
    let debit_account = required_text("debit_account", &input.debit_account, 120)?;
    let credit_account = required_text("credit_account", &input.credit_account, 120)?;

    if debit_account.eq_ignore_ascii_case(&credit_account) {
        return Err(CoreError::SameAccount {
            account: debit_account,
        });
    }

    Ok(NewFinanceEntry {
        description: optional_text("description", input.description.as_deref(), MAX_TEXT_LEN)?,
        debit_account,
        credit_account,
        amount: input.amount,
        invoice_id: input.invoice_id,
        payment_id: input.payment_id,
        date: input.date,
    })
}

/// Validates an admin username.
pub fn username(value: &str) -> ValidationResult<String> {
    let name = required_text("username", value, 80)?;
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '_' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, dots, hyphens, and underscores"
                .to_string(),
        });
    }
    Ok(name)
}

/// Validates a new admin password (length only; it is hashed, never stored).
pub fn password(value: &str) -> ValidationResult<()> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::InvalidFormat {
            field: "password".to_string(),
            reason: format!("must be at least {} characters", MIN_PASSWORD_LEN),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(lines: Vec<InvoiceLineDraft>) -> InvoiceDraft {
        InvoiceDraft {
            invoice_number: None,
            date: None,
            customer_id: 1,
            header: InvoiceHeader::default(),
            discount: 0.0,
            gst_rate: 18.0,
            amount_in_words: None,
            lines,
        }
    }

    fn line(quantity: f64, unit_price: f64) -> InvoiceLineDraft {
        InvoiceLineDraft {
            stock_item_id: None,
            product_id: Some(1),
            sub_type: None,
            uom: None,
            quantity,
            unit_price,
            tax: 0.0,
        }
    }

    #[test]
    fn test_optional_text_normalizes_blank() {
        assert_eq!(optional_text("phone", Some("   "), 50).unwrap(), None);
        assert_eq!(optional_text("phone", None, 50).unwrap(), None);
        assert_eq!(
            optional_text("phone", Some(" 0300-1234567 "), 50).unwrap(),
            Some("0300-1234567".to_string())
        );
        assert!(optional_text("phone", Some(&"9".repeat(51)), 50).is_err());
    }

    #[test]
    fn test_optional_email() {
        assert!(optional_email(Some("orders@dairy.pk")).is_ok());
        assert_eq!(optional_email(Some("")).unwrap(), None);
        assert!(optional_email(Some("no-at-sign")).is_err());
        assert!(optional_email(Some("a@nodot")).is_err());
        assert!(optional_email(Some("a b@x.pk")).is_err());
    }

    #[test]
    fn test_customer_requires_name() {
        let input = NewCustomer {
            name: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            customer(&input),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_numeric_validators() {
        assert!(non_negative("unit_price", 0.0).is_ok());
        assert!(non_negative("unit_price", -0.01).is_err());
        assert!(positive("amount", f64::INFINITY).is_err());
        assert!(gst_rate(0.0).is_ok());
        assert!(gst_rate(100.0).is_ok());
        assert!(gst_rate(100.5).is_err());
    }

    #[test]
    fn test_invoice_draft_rules() {
        assert!(invoice_draft(&draft(vec![line(2.0, 450.0)])).is_ok());
        assert!(matches!(
            invoice_draft(&draft(vec![])),
            Err(CoreError::InvalidInvoice { .. })
        ));
        assert!(invoice_draft(&draft(vec![line(0.0, 450.0)])).is_err());
        assert!(invoice_draft(&draft(vec![line(1.0, -1.0)])).is_err());

        let mut bad_gst = draft(vec![line(1.0, 1.0)]);
        bad_gst.gst_rate = -5.0;
        assert!(invoice_draft(&bad_gst).is_err());

        let mut blank_number = draft(vec![line(1.0, 1.0)]);
        blank_number.invoice_number = Some("  ".to_string());
        assert!(invoice_draft(&blank_number).is_err());

        let mut unnamed = line(1.0, 1.0);
        unnamed.product_id = None;
        assert!(matches!(
            invoice_draft(&draft(vec![unnamed])),
            Err(CoreError::InvalidInvoice { .. })
        ));
    }

    #[test]
    fn test_invoice_draft_is_normalized() {
        let mut standard = line(1.0, 100.0);
        standard.sub_type = Some("".to_string());
        let mut salted = line(2.0, 450.0);
        salted.sub_type = Some(" Salted ".to_string());
        salted.uom = Some("  ".to_string());

        let mut input = draft(vec![standard, salted]);
        input.header.customer_ntn = Some(" 1234567-8 ".to_string());
        input.header.contact_number = Some("   ".to_string());

        let checked = invoice_draft(&input).unwrap();
        assert_eq!(checked.lines[0].sub_type, None);
        assert_eq!(checked.lines[1].sub_type.as_deref(), Some("Salted"));
        assert_eq!(checked.lines[1].uom, None);
        assert_eq!(checked.header.customer_ntn.as_deref(), Some("1234567-8"));
        assert_eq!(checked.header.contact_number, None);

        input.header.ref_po_no = Some("P".repeat(256));
        assert!(invoice_draft(&input).is_err());
    }

    #[test]
    fn test_finance_entry_accounts_must_differ() {
        let entry = NewFinanceEntry {
            description: None,
            debit_account: "Cash".to_string(),
            credit_account: " cash ".to_string(),
            amount: 10.0,
            invoice_id: None,
            payment_id: None,
            date: None,
        };
        assert!(matches!(
            finance_entry(&entry),
            Err(CoreError::SameAccount { .. })
        ));
    }

    #[test]
    fn test_username_and_password() {
        assert_eq!(username(" admin ").unwrap(), "admin");
        assert!(username("has space").is_err());
        assert!(password("short").is_err());
        assert!(password("long-enough").is_ok());
    }
}
