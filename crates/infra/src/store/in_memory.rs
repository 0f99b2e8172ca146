use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use invoicedesk_core::{Cents, InvoiceId};
use invoicedesk_invoicing::{Customer, CustomerField, Invoice, InvoiceStatus};

use super::{InvoiceChanges, InvoiceStore, NewInvoice, StoreError};
use crate::data::{page_count, page_offset, CustomerRow, EditableInvoice, InvoiceReader, InvoiceRow};

#[derive(Debug, Default)]
struct State {
    customers: Vec<Customer>,
    invoices: Vec<Invoice>,
}

impl State {
    fn customer(&self, id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    fn ensure_customer(&self, id: &str) -> Result<(), StoreError> {
        match self.customer(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::InvalidReference(format!("customer {id} does not exist"))),
        }
    }

    /// Invoices joined with their customer, filtered, newest first.
    fn matching_rows(&self, query: &str) -> Vec<InvoiceRow> {
        let needle = query.to_lowercase();
        let mut rows: Vec<InvoiceRow> = self
            .invoices
            .iter()
            .filter_map(|invoice| {
                let customer = self.customer(&invoice.customer_id)?;
                invoice_matches(invoice, customer, &needle).then(|| InvoiceRow {
                    id: invoice.id,
                    name: customer.name.clone(),
                    email: customer.email.clone(),
                    image_url: customer.image_url.clone(),
                    date: invoice.date,
                    amount: invoice.amount,
                    status: invoice.status,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows
    }
}

fn invoice_matches(invoice: &Invoice, customer: &Customer, needle: &str) -> bool {
    needle.is_empty()
        || customer.name.to_lowercase().contains(needle)
        || customer.email.to_lowercase().contains(needle)
        || invoice.amount.as_i64().to_string().contains(needle)
        || invoice.date.to_string().contains(needle)
        || invoice.status.as_str().contains(needle)
}

/// In-memory invoice + customer store for tests/dev.
///
/// Mirrors the Postgres schema's behavior where it matters to callers:
/// invoices must reference an existing customer, and updates/deletes of
/// unknown ids affect zero rows without failing.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceStore {
    inner: RwLock<State>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customers(customers: impl IntoIterator<Item = Customer>) -> Self {
        Self {
            inner: RwLock::new(State {
                customers: customers.into_iter().collect(),
                invoices: Vec::new(),
            }),
        }
    }

    pub fn add_customer(&self, customer: Customer) {
        if let Ok(mut state) = self.inner.write() {
            state.customers.push(customer);
        }
    }

    /// Insert a fully-formed invoice, bypassing the INSERT path (fixtures).
    pub fn seed_invoice(&self, invoice: Invoice) {
        if let Ok(mut state) = self.inner.write() {
            state.invoices.push(invoice);
        }
    }

    pub fn get(&self, id: InvoiceId) -> Option<Invoice> {
        let state = self.inner.read().ok()?;
        state.invoices.iter().find(|i| i.id == id).cloned()
    }

    /// All invoices in insertion order.
    pub fn invoices(&self) -> Vec<Invoice> {
        match self.inner.read() {
            Ok(state) => state.invoices.clone(),
            Err(_) => vec![],
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("invoice store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("invoice store lock poisoned".to_string()))
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn insert(&self, invoice: NewInvoice) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.ensure_customer(&invoice.customer_id)?;
        state.invoices.push(Invoice {
            id: InvoiceId::new(),
            customer_id: invoice.customer_id,
            amount: invoice.amount,
            status: invoice.status,
            date: invoice.date,
        });
        Ok(())
    }

    async fn update(&self, id: InvoiceId, changes: InvoiceChanges) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.ensure_customer(&changes.customer_id)?;
        if let Some(invoice) = state.invoices.iter_mut().find(|i| i.id == id) {
            invoice.customer_id = changes.customer_id;
            invoice.amount = changes.amount;
            invoice.status = changes.status;
        }
        Ok(())
    }

    async fn delete(&self, id: InvoiceId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.invoices.retain(|i| i.id != id);
        Ok(())
    }
}

#[async_trait]
impl InvoiceReader for InMemoryInvoiceStore {
    async fn fetch_invoice_by_id(&self, id: InvoiceId) -> Result<Option<EditableInvoice>, StoreError> {
        let state = self.read()?;
        Ok(state.invoices.iter().find(|i| i.id == id).map(|i| EditableInvoice {
            id: i.id,
            customer_id: i.customer_id.clone(),
            amount: i.amount.to_major(),
            status: i.status,
        }))
    }

    async fn fetch_customers(&self) -> Result<Vec<CustomerField>, StoreError> {
        let state = self.read()?;
        let mut customers: Vec<CustomerField> = state.customers.iter().map(CustomerField::from).collect();
        customers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(customers)
    }

    async fn fetch_filtered_invoices(&self, query: &str, page: u32) -> Result<Vec<InvoiceRow>, StoreError> {
        let state = self.read()?;
        let offset = page_offset(page) as usize;
        Ok(state
            .matching_rows(query)
            .into_iter()
            .skip(offset)
            .take(crate::data::ITEMS_PER_PAGE as usize)
            .collect())
    }

    async fn fetch_invoice_pages(&self, query: &str) -> Result<u32, StoreError> {
        let state = self.read()?;
        Ok(page_count(state.matching_rows(query).len() as u64))
    }

    async fn fetch_filtered_customers(&self, query: &str) -> Result<Vec<CustomerRow>, StoreError> {
        let state = self.read()?;
        let needle = query.to_lowercase();

        let mut rows: Vec<CustomerRow> = state
            .customers
            .iter()
            .filter(|c| {
                needle.is_empty()
                    || c.name.to_lowercase().contains(&needle)
                    || c.email.to_lowercase().contains(&needle)
            })
            .map(|c| {
                let theirs: Vec<&Invoice> = state.invoices.iter().filter(|i| i.customer_id == c.id).collect();
                let total = |status: InvoiceStatus| -> Cents {
                    theirs.iter().filter(|i| i.status == status).map(|i| i.amount).sum()
                };
                CustomerRow {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    email: c.email.clone(),
                    image_url: c.image_url.clone(),
                    total_invoices: theirs.len() as i64,
                    total_pending: total(InvoiceStatus::Pending),
                    total_paid: total(InvoiceStatus::Paid),
                }
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}
