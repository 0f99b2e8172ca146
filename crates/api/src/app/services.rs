//! Service wiring: stores, the mutation pipeline, the view cache, and auth.
//!
//! With `DATABASE_URL` set everything is Postgres-backed; otherwise the app
//! runs on in-memory stores seeded with a small demo dataset.

use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;

use invoicedesk_auth::{CredentialsProvider, InMemoryCredentialsProvider, SessionKeys};
use invoicedesk_core::{Cents, InvoiceId};
use invoicedesk_infra::{
    InMemoryInvoiceStore, InMemoryViewCache, InvoiceReader, InvoiceStore, MutationPipeline, PostgresCredentialsProvider,
    PostgresInvoiceStore, SystemClock,
};
use invoicedesk_invoicing::{Customer, Invoice, InvoiceStatus};

use crate::app::dto::InvoicesPage;
use crate::config::AppConfig;

pub type InvoiceViews = InMemoryViewCache<InvoicesPage>;

pub type InvoicePipeline = MutationPipeline<Arc<dyn InvoiceStore>, Arc<InvoiceViews>, SystemClock>;

pub const DEMO_USER_EMAIL: &str = "user@nextmail.com";
pub const DEMO_USER_PASSWORD: &str = "123456";

pub struct AppServices {
    pub reader: Arc<dyn InvoiceReader>,
    pub pipeline: InvoicePipeline,
    pub views: Arc<InvoiceViews>,
    pub credentials: Arc<dyn CredentialsProvider>,
    pub sessions: Arc<SessionKeys>,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn InvoiceStore>,
        reader: Arc<dyn InvoiceReader>,
        credentials: Arc<dyn CredentialsProvider>,
        config: &AppConfig,
    ) -> Self {
        let views = Arc::new(InvoiceViews::new());
        let pipeline = MutationPipeline::new(store, Arc::clone(&views), SystemClock).with_delete_policy(config.delete_policy);
        let sessions = Arc::new(SessionKeys::new(config.session_secret.as_bytes(), config.session_ttl));

        Self {
            reader,
            pipeline,
            views,
            credentials,
            sessions,
        }
    }
}

/// Build services for `config`: Postgres when a database URL is set,
/// seeded in-memory stores otherwise.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    match &config.database_url {
        Some(url) => postgres_services(url, config).await,
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores with demo data");
            Ok(in_memory_services(config))
        }
    }
}

async fn postgres_services(url: &str, config: &AppConfig) -> anyhow::Result<AppServices> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await
        .context("connect to postgres")?;

    let store = Arc::new(PostgresInvoiceStore::new(pool.clone()));
    store.migrate().await.context("apply schema")?;
    tracing::info!("postgres invoice store ready");

    let credentials = Arc::new(PostgresCredentialsProvider::new(pool));
    Ok(AppServices::new(store.clone(), store, credentials, config))
}

pub fn in_memory_services(config: &AppConfig) -> AppServices {
    let store = Arc::new(InMemoryInvoiceStore::with_customers(demo_customers()));
    for invoice in demo_invoices() {
        store.seed_invoice(invoice);
    }

    let credentials = Arc::new(InMemoryCredentialsProvider::new());
    credentials.add_user("User", DEMO_USER_EMAIL, DEMO_USER_PASSWORD);

    AppServices::new(store.clone(), store, credentials, config)
}

pub const DEMO_CUSTOMER_IDS: [&str; 3] = [
    "d6e15727-9fe1-4961-8c5b-ea44a9bd81aa",
    "3958dc9e-712f-4377-85e9-fec4b6a6442a",
    "3958dc9e-742f-4377-85e9-fec4b6a6442a",
];

fn demo_customers() -> Vec<Customer> {
    [
        (DEMO_CUSTOMER_IDS[0], "Evil Rabbit", "evil@rabbit.com", "/customers/evil-rabbit.png"),
        (DEMO_CUSTOMER_IDS[1], "Delba de Oliveira", "delba@oliveira.com", "/customers/delba-de-oliveira.png"),
        (DEMO_CUSTOMER_IDS[2], "Lee Robinson", "lee@robinson.com", "/customers/lee-robinson.png"),
    ]
    .into_iter()
    .map(|(id, name, email, image_url)| Customer {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        image_url: image_url.to_string(),
    })
    .collect()
}

fn demo_invoices() -> Vec<Invoice> {
    [
        (DEMO_CUSTOMER_IDS[0], 15_795, InvoiceStatus::Pending, (2022, 12, 6)),
        (DEMO_CUSTOMER_IDS[1], 20_348, InvoiceStatus::Pending, (2022, 11, 14)),
        (DEMO_CUSTOMER_IDS[2], 3_040, InvoiceStatus::Paid, (2022, 10, 29)),
        (DEMO_CUSTOMER_IDS[0], 44_800, InvoiceStatus::Paid, (2023, 9, 10)),
    ]
    .into_iter()
    .filter_map(|(customer_id, cents, status, (y, m, d))| {
        Some(Invoice {
            id: InvoiceId::new(),
            customer_id: customer_id.to_string(),
            amount: Cents::new(cents),
            status,
            date: NaiveDate::from_ymd_opt(y, m, d)?,
        })
    })
    .collect()
}
