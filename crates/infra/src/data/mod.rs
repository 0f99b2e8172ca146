//! Read-side data access (page loaders).
//!
//! These are plain read wrappers over the invoice store. The only
//! coordination here is the edit page's fan-out, which issues the invoice
//! lookup and the customer list concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use invoicedesk_core::{Cents, InvoiceId};
use invoicedesk_invoicing::{CustomerField, InvoiceStatus};

use crate::store::StoreError;

/// Rows per listing page.
pub const ITEMS_PER_PAGE: u32 = 6;

/// An invoice as pre-filled into the edit form (amount in major units).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditableInvoice {
    pub id: InvoiceId,
    pub customer_id: String,
    pub amount: f64,
    pub status: InvoiceStatus,
}

/// One row of the invoices table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceRow {
    pub id: InvoiceId,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub date: NaiveDate,
    pub amount: Cents,
    pub status: InvoiceStatus,
}

/// One row of the customers table, with per-customer invoice totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub total_invoices: i64,
    pub total_pending: Cents,
    pub total_paid: Cents,
}

#[async_trait]
pub trait InvoiceReader: Send + Sync {
    async fn fetch_invoice_by_id(&self, id: InvoiceId) -> Result<Option<EditableInvoice>, StoreError>;

    /// All customers, ordered by name.
    async fn fetch_customers(&self) -> Result<Vec<CustomerField>, StoreError>;

    /// One page (1-based) of invoices matching `query`, newest first.
    async fn fetch_filtered_invoices(&self, query: &str, page: u32) -> Result<Vec<InvoiceRow>, StoreError>;

    /// Number of listing pages for `query`.
    async fn fetch_invoice_pages(&self, query: &str) -> Result<u32, StoreError>;

    async fn fetch_filtered_customers(&self, query: &str) -> Result<Vec<CustomerRow>, StoreError>;
}

#[async_trait]
impl<R> InvoiceReader for Arc<R>
where
    R: InvoiceReader + ?Sized,
{
    async fn fetch_invoice_by_id(&self, id: InvoiceId) -> Result<Option<EditableInvoice>, StoreError> {
        (**self).fetch_invoice_by_id(id).await
    }

    async fn fetch_customers(&self) -> Result<Vec<CustomerField>, StoreError> {
        (**self).fetch_customers().await
    }

    async fn fetch_filtered_invoices(&self, query: &str, page: u32) -> Result<Vec<InvoiceRow>, StoreError> {
        (**self).fetch_filtered_invoices(query, page).await
    }

    async fn fetch_invoice_pages(&self, query: &str) -> Result<u32, StoreError> {
        (**self).fetch_invoice_pages(query).await
    }

    async fn fetch_filtered_customers(&self, query: &str) -> Result<Vec<CustomerRow>, StoreError> {
        (**self).fetch_filtered_customers(query).await
    }
}

/// Everything the edit page needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditForm {
    pub invoice: EditableInvoice,
    pub customers: Vec<CustomerField>,
}

/// Load the edit page: invoice and customers, fetched concurrently.
///
/// `Ok(None)` means the invoice does not exist (the page is "not found").
pub async fn load_edit_form<R>(reader: &R, id: InvoiceId) -> Result<Option<EditForm>, StoreError>
where
    R: InvoiceReader + ?Sized,
{
    let (invoice, customers) = tokio::try_join!(reader.fetch_invoice_by_id(id), reader.fetch_customers())?;
    Ok(invoice.map(|invoice| EditForm { invoice, customers }))
}

/// Offset of the first row of a 1-based page. Page 0 is treated as page 1.
pub fn page_offset(page: u32) -> u32 {
    page.max(1).saturating_sub(1).saturating_mul(ITEMS_PER_PAGE)
}

/// Pages needed for `total` rows.
pub fn page_count(total: u64) -> u32 {
    let pages = total.div_ceil(u64::from(ITEMS_PER_PAGE));
    u32::try_from(pages).unwrap_or(u32::MAX)
}
