//! Request/response DTOs for the dashboard API.
//!
//! Requests are form-urlencoded (`InvoiceForm`, `Credentials`); responses are
//! JSON views of what each dashboard page renders.

use serde::Serialize;

use invoicedesk_infra::data::{CustomerRow, InvoiceRow};
use invoicedesk_invoicing::CustomerField;

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// One invoices-table row plus its display amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedInvoice {
    #[serde(flatten)]
    pub row: InvoiceRow,
    pub amount_display: String,
}

impl From<InvoiceRow> for ListedInvoice {
    fn from(row: InvoiceRow) -> Self {
        let amount_display = row.amount.format_usd();
        Self { row, amount_display }
    }
}

/// The rendered `/dashboard/invoices` page (the cached view).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoicesPage {
    pub query: String,
    pub page: u32,
    pub total_pages: u32,
    pub invoices: Vec<ListedInvoice>,
}

/// Create page: the options for the customer `<select>`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateInvoiceView {
    pub customers: Vec<CustomerField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomersTable {
    pub query: String,
    pub customers: Vec<CustomersTableRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomersTableRow {
    #[serde(flatten)]
    pub row: CustomerRow,
    pub total_pending_display: String,
    pub total_paid_display: String,
}

impl From<CustomerRow> for CustomersTableRow {
    fn from(row: CustomerRow) -> Self {
        Self {
            total_pending_display: row.total_pending.format_usd(),
            total_paid_display: row.total_paid.format_usd(),
            row,
        }
    }
}
