//! Invoice form validation.
//!
//! Turns untrusted, string-valued form input into a typed [`InvoiceFields`]
//! record, or reports every failing field at once. `id` and `date` are not
//! part of the form: the mutation pipeline assigns them.

use serde::Deserialize;

use invoicedesk_core::Cents;

use crate::form_state::{FieldErrors, InvoiceField};
use crate::invoice::InvoiceStatus;

pub const CUSTOMER_REQUIRED: &str = "Please select a customer.";
pub const AMOUNT_NOT_A_NUMBER: &str = "Please enter a valid amount.";
pub const AMOUNT_NOT_POSITIVE: &str = "Please enter an amount greater than $0.";
pub const STATUS_INVALID: &str = "Please select an invoice status.";

/// Raw invoice form submission, exactly as posted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InvoiceForm {
    #[serde(default, rename = "customerId")]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl InvoiceForm {
    pub fn new(customer_id: &str, amount: &str, status: &str) -> Self {
        Self {
            customer_id: Some(customer_id.to_string()),
            amount: Some(amount.to_string()),
            status: Some(status.to_string()),
        }
    }
}

/// A validated invoice submission.
///
/// Only [`validate_invoice_form`] builds one, so `amount` is always positive
/// and always has an exact cent representation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceFields {
    customer_id: String,
    amount: f64,
    amount_cents: Cents,
    status: InvoiceStatus,
}

impl InvoiceFields {
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// Amount in major units, as submitted.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Amount converted to minor units (`amount * 100`).
    pub fn amount_in_cents(&self) -> Cents {
        self.amount_cents
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }
}

/// Validate an invoice form. Pure; checks every field before returning.
pub fn validate_invoice_form(form: &InvoiceForm) -> Result<InvoiceFields, FieldErrors> {
    let mut errors = FieldErrors::new();

    let customer_id = match form.customer_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => Some(id.to_string()),
        _ => {
            errors.push(InvoiceField::CustomerId, CUSTOMER_REQUIRED);
            None
        }
    };

    let amount = match parse_amount(form.amount.as_deref()) {
        None => {
            errors.push(InvoiceField::Amount, AMOUNT_NOT_A_NUMBER);
            None
        }
        Some(value) if value <= 0.0 => {
            errors.push(InvoiceField::Amount, AMOUNT_NOT_POSITIVE);
            None
        }
        Some(value) => match Cents::from_major(value) {
            Some(cents) if cents > Cents::ZERO => Some((value, cents)),
            Some(_) => {
                // Positive, but rounds down to zero cents.
                errors.push(InvoiceField::Amount, AMOUNT_NOT_POSITIVE);
                None
            }
            None => {
                errors.push(InvoiceField::Amount, AMOUNT_NOT_A_NUMBER);
                None
            }
        },
    };

    let status = match form.status.as_deref().map(str::parse::<InvoiceStatus>) {
        Some(Ok(status)) => Some(status),
        _ => {
            errors.push(InvoiceField::Status, STATUS_INVALID);
            None
        }
    };

    match (customer_id, amount, status) {
        (Some(customer_id), Some((amount, amount_cents)), Some(status)) if errors.is_empty() => {
            Ok(InvoiceFields {
                customer_id,
                amount,
                amount_cents,
                status,
            })
        }
        _ => Err(errors),
    }
}

/// Parse a submitted amount. Total: never panics, never errors.
///
/// Missing or blank input counts as `0` (and then fails the positivity
/// check). Returns `None` for anything that is not a finite decimal number.
pub fn parse_amount(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return Some(0.0);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => None,
    }
}
