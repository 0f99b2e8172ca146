//! Invoicing domain module.
//!
//! This crate contains the invoice and customer records, the per-submission
//! `FormState`, and the form validator. Everything here is deterministic
//! domain logic (no IO, no HTTP, no storage).

pub mod customer;
pub mod form_state;
pub mod invoice;
pub mod schema;

pub use customer::{Customer, CustomerField};
pub use form_state::{FieldErrors, FormState, InvoiceField};
pub use invoice::{Invoice, InvoiceStatus};
pub use schema::{validate_invoice_form, InvoiceFields, InvoiceForm};
