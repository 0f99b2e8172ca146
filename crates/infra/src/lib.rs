//! Infrastructure layer: invoice storage, read-side data access, view cache,
//! and the invoice mutation pipeline.

pub mod credentials;
pub mod data;
pub mod mutation;
pub mod store;
pub mod view_cache;

pub use credentials::PostgresCredentialsProvider;
pub use data::{load_edit_form, EditForm, InvoiceReader, ITEMS_PER_PAGE};
pub use mutation::{ActionOutcome, Clock, DeleteInvoiceError, DeletePolicy, MutationPipeline, SystemClock, INVOICES_VIEW};
pub use store::{InMemoryInvoiceStore, InvoiceStore, PostgresInvoiceStore, StoreError};
pub use view_cache::{InMemoryViewCache, ViewCache};
