//! Per-submission form feedback.
//!
//! A `FormState` is created fresh for every submission and handed back to
//! whatever renders the form. It is never persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Editable invoice form fields, named as the form submits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InvoiceField {
    #[serde(rename = "customerId")]
    CustomerId,
    #[serde(rename = "amount")]
    Amount,
    #[serde(rename = "status")]
    Status,
}

impl InvoiceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceField::CustomerId => "customerId",
            InvoiceField::Amount => "amount",
            InvoiceField::Status => "status",
        }
    }
}

/// Field name → ordered violation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<InvoiceField, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: InvoiceField, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn get(&self, field: InvoiceField) -> Option<&[String]> {
        self.0.get(&field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: InvoiceField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = InvoiceField> + '_ {
        self.0.keys().copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FormState {
    /// Field errors plus a summary message.
    pub fn invalid(errors: FieldErrors, message: impl Into<String>) -> Self {
        Self {
            errors: Some(errors),
            message: Some(message.into()),
        }
    }

    /// Message only.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            errors: None,
            message: Some(message.into()),
        }
    }

    pub fn field_errors(&self, field: InvoiceField) -> &[String] {
        self.errors
            .as_ref()
            .and_then(|e| e.get(field))
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_form_field_names_and_omits_absent_parts() {
        let mut errors = FieldErrors::new();
        errors.push(InvoiceField::CustomerId, "Please select a customer.");
        let state = FormState::invalid(errors, "Missing Fields. Failed to Create Invoice.");

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "errors": { "customerId": ["Please select a customer."] },
                "message": "Missing Fields. Failed to Create Invoice."
            })
        );

        let json = serde_json::to_value(FormState::message("Deleted Invoice")).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "Deleted Invoice" }));
    }

    #[test]
    fn messages_keep_insertion_order_per_field() {
        let mut errors = FieldErrors::new();
        errors.push(InvoiceField::Amount, "first");
        errors.push(InvoiceField::Amount, "second");
        assert_eq!(errors.get(InvoiceField::Amount).unwrap(), ["first", "second"]);
        assert!(errors.get(InvoiceField::Status).is_none());
    }
}
