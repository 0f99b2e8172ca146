//! Postgres-backed invoice store.
//!
//! All values are bound positionally; nothing is ever concatenated into SQL.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (foreign key violation) | `23503` | `InvalidReference` |
//! | Database (invalid text representation, e.g. bad uuid) | `22P02` | `InvalidReference` |
//! | Database (unique / check / not-null violation) | `23505` / `23514` / `23502` | `Constraint` |
//! | Decode / ColumnDecode | N/A | `Corrupt` |
//! | Anything else | N/A | `Backend` |

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use invoicedesk_core::{Cents, InvoiceId};
use invoicedesk_invoicing::{CustomerField, InvoiceStatus};

use super::{InvoiceChanges, InvoiceStore, NewInvoice, StoreError};
use crate::data::{page_count, page_offset, CustomerRow, EditableInvoice, InvoiceReader, InvoiceRow, ITEMS_PER_PAGE};

pub const INSERT_INVOICE: &str = "INSERT INTO invoices (customer_id, amount, status, date) VALUES ($1, $2, $3, $4)";
pub const UPDATE_INVOICE: &str = "UPDATE invoices SET customer_id = $1, amount = $2, status = $3 WHERE id = $4";
pub const DELETE_INVOICE: &str = "DELETE FROM invoices WHERE id = $1";

/// Schema for a fresh database (`customers`, `invoices`, `users`).
pub const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

/// Postgres-backed store for invoices and the customer directory.
///
/// Uses SQLx connection pool which is thread-safe; every write is a single
/// autocommitted statement.
#[derive(Debug, Clone)]
pub struct PostgresInvoiceStore {
    pool: PgPool,
}

impl PostgresInvoiceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

/// Customer ids are UUIDs in this schema; anything else cannot reference a row.
fn parse_customer_id(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|e| StoreError::InvalidReference(format!("customer id {raw:?}: {e}")))
}

/// `%query%` with LIKE metacharacters escaped.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn parse_status(raw: &str) -> Result<InvoiceStatus, StoreError> {
    raw.parse()
        .map_err(|_| StoreError::Corrupt(format!("unknown invoice status {raw:?}")))
}

#[async_trait]
impl InvoiceStore for PostgresInvoiceStore {
    #[instrument(skip(self, invoice), fields(customer_id = %invoice.customer_id), err)]
    async fn insert(&self, invoice: NewInvoice) -> Result<(), StoreError> {
        let customer_id = parse_customer_id(&invoice.customer_id)?;
        sqlx::query(INSERT_INVOICE)
            .bind(customer_id)
            .bind(invoice.amount.as_i64())
            .bind(invoice.status.as_str())
            .bind(invoice.date)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_invoice", e))?;
        Ok(())
    }

    #[instrument(skip(self, changes), fields(invoice_id = %id), err)]
    async fn update(&self, id: InvoiceId, changes: InvoiceChanges) -> Result<(), StoreError> {
        let customer_id = parse_customer_id(&changes.customer_id)?;
        sqlx::query(UPDATE_INVOICE)
            .bind(customer_id)
            .bind(changes.amount.as_i64())
            .bind(changes.status.as_str())
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_invoice", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(invoice_id = %id), err)]
    async fn delete(&self, id: InvoiceId) -> Result<(), StoreError> {
        sqlx::query(DELETE_INVOICE)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_invoice", e))?;
        Ok(())
    }
}

#[async_trait]
impl InvoiceReader for PostgresInvoiceStore {
    #[instrument(skip(self), fields(invoice_id = %id), err)]
    async fn fetch_invoice_by_id(&self, id: InvoiceId) -> Result<Option<EditableInvoice>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, customer_id, amount, status
            FROM invoices
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_invoice_by_id", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: Uuid = row.try_get("id").map_err(|e| map_sqlx_error("fetch_invoice_by_id", e))?;
        let customer_id: Uuid = row
            .try_get("customer_id")
            .map_err(|e| map_sqlx_error("fetch_invoice_by_id", e))?;
        let amount: i64 = row.try_get("amount").map_err(|e| map_sqlx_error("fetch_invoice_by_id", e))?;
        let status: String = row.try_get("status").map_err(|e| map_sqlx_error("fetch_invoice_by_id", e))?;

        Ok(Some(EditableInvoice {
            id: InvoiceId::from_uuid(id),
            customer_id: customer_id.to_string(),
            amount: Cents::new(amount).to_major(),
            status: parse_status(&status)?,
        }))
    }

    #[instrument(skip(self), err)]
    async fn fetch_customers(&self) -> Result<Vec<CustomerField>, StoreError> {
        let rows = sqlx::query("SELECT id, name FROM customers ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_customers", e))?;

        rows.iter()
            .map(|row| {
                let id: Uuid = row.try_get("id")?;
                Ok(CustomerField {
                    id: id.to_string(),
                    name: row.try_get("name")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| map_sqlx_error("fetch_customers", e))
    }

    #[instrument(skip(self), err)]
    async fn fetch_filtered_invoices(&self, query: &str, page: u32) -> Result<Vec<InvoiceRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                invoices.id,
                invoices.amount,
                invoices.date,
                invoices.status,
                customers.name,
                customers.email,
                customers.image_url
            FROM invoices
            JOIN customers ON invoices.customer_id = customers.id
            WHERE
                customers.name ILIKE $1 OR
                customers.email ILIKE $1 OR
                invoices.amount::text ILIKE $1 OR
                invoices.date::text ILIKE $1 OR
                invoices.status ILIKE $1
            ORDER BY invoices.date DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(like_pattern(query))
        .bind(i64::from(ITEMS_PER_PAGE))
        .bind(i64::from(page_offset(page)))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_filtered_invoices", e))?;

        rows.iter().map(decode_invoice_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn fetch_invoice_pages(&self, query: &str) -> Result<u32, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM invoices
            JOIN customers ON invoices.customer_id = customers.id
            WHERE
                customers.name ILIKE $1 OR
                customers.email ILIKE $1 OR
                invoices.amount::text ILIKE $1 OR
                invoices.date::text ILIKE $1 OR
                invoices.status ILIKE $1
            "#,
        )
        .bind(like_pattern(query))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_invoice_pages", e))?;

        let total: i64 = row.try_get("total").map_err(|e| map_sqlx_error("fetch_invoice_pages", e))?;
        Ok(page_count(total.max(0) as u64))
    }

    #[instrument(skip(self), err)]
    async fn fetch_filtered_customers(&self, query: &str) -> Result<Vec<CustomerRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                customers.id,
                customers.name,
                customers.email,
                customers.image_url,
                COUNT(invoices.id) AS total_invoices,
                COALESCE(SUM(CASE WHEN invoices.status = 'pending' THEN invoices.amount ELSE 0 END), 0)::BIGINT AS total_pending,
                COALESCE(SUM(CASE WHEN invoices.status = 'paid' THEN invoices.amount ELSE 0 END), 0)::BIGINT AS total_paid
            FROM customers
            LEFT JOIN invoices ON customers.id = invoices.customer_id
            WHERE
                customers.name ILIKE $1 OR
                customers.email ILIKE $1
            GROUP BY customers.id, customers.name, customers.email, customers.image_url
            ORDER BY customers.name ASC
            "#,
        )
        .bind(like_pattern(query))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_filtered_customers", e))?;

        rows.iter()
            .map(|row| {
                let id: Uuid = row.try_get("id")?;
                Ok(CustomerRow {
                    id: id.to_string(),
                    name: row.try_get("name")?,
                    email: row.try_get("email")?,
                    image_url: row.try_get("image_url")?,
                    total_invoices: row.try_get("total_invoices")?,
                    total_pending: Cents::new(row.try_get("total_pending")?),
                    total_paid: Cents::new(row.try_get("total_paid")?),
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| map_sqlx_error("fetch_filtered_customers", e))
    }
}

fn decode_invoice_row(row: &PgRow) -> Result<InvoiceRow, StoreError> {
    let decode = |e| map_sqlx_error("fetch_filtered_invoices", e);
    let id: Uuid = row.try_get("id").map_err(decode)?;
    let amount: i64 = row.try_get("amount").map_err(decode)?;
    let status: String = row.try_get("status").map_err(decode)?;

    Ok(InvoiceRow {
        id: InvoiceId::from_uuid(id),
        name: row.try_get("name").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        image_url: row.try_get("image_url").map_err(decode)?,
        date: row.try_get("date").map_err(decode)?,
        amount: Cents::new(amount),
        status: parse_status(&status)?,
    })
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23503") | Some("22P02") => StoreError::InvalidReference(msg),
                Some("23505") | Some("23514") | Some("23502") => StoreError::Constraint(msg),
                _ => StoreError::Backend(msg),
            }
        }
        e @ (sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_)) => {
            StoreError::Corrupt(format!("failed to decode row in {}: {}", operation, e))
        }
        other => StoreError::Backend(format!("{} failed: {}", operation, other)),
    }
}
