//! Invoice write-side storage.
//!
//! Every mutation is exactly one statement against the `invoices` table:
//! an INSERT, an UPDATE by id, or a DELETE by id. Each backend guarantees
//! per-statement atomicity; nothing spans more than one write.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use invoicedesk_core::{Cents, InvoiceId};
use invoicedesk_invoicing::InvoiceStatus;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryInvoiceStore;
pub use postgres::PostgresInvoiceStore;

/// Values bound to the INSERT statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub customer_id: String,
    pub amount: Cents,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

/// Values bound to the UPDATE statement. `id` and `date` never change after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceChanges {
    pub customer_id: String,
    pub amount: Cents,
    pub status: InvoiceStatus,
}

/// Storage failure.
///
/// Callers turn this into a fixed user-facing message; the detail only ever
/// goes to logs.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced row does not exist or the reference is malformed
    /// (e.g. unknown customer id).
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// A CHECK / NOT NULL / unique constraint rejected the statement.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// A stored row could not be decoded into the domain model.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Connection, pool, or any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn insert(&self, invoice: NewInvoice) -> Result<(), StoreError>;

    /// Overwrite customer, amount and status of one invoice. Updating an id
    /// that does not exist is not an error (zero rows affected).
    async fn update(&self, id: InvoiceId, changes: InvoiceChanges) -> Result<(), StoreError>;

    /// Remove one invoice outright. Deleting an id that does not exist is
    /// not an error.
    async fn delete(&self, id: InvoiceId) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> InvoiceStore for Arc<S>
where
    S: InvoiceStore + ?Sized,
{
    async fn insert(&self, invoice: NewInvoice) -> Result<(), StoreError> {
        (**self).insert(invoice).await
    }

    async fn update(&self, id: InvoiceId, changes: InvoiceChanges) -> Result<(), StoreError> {
        (**self).update(id, changes).await
    }

    async fn delete(&self, id: InvoiceId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}
