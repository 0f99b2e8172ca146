//! Invoice mutation pipeline (application-level orchestration).
//!
//! Every create/update/delete goes through the same steps:
//!
//! ```text
//! form fields
//!   ↓
//! 1. Validate     (create/update)   → ValidationFailed(FormState)
//!   ↓
//! 2. Transform    amount → cents; create also stamps today's date
//!   ↓
//! 3. Persist      exactly one statement  → PersistenceFailed(FormState)
//!   ↓
//! 4. Invalidate   the invoices listing view (success only)
//!   ↓
//! 5. Complete     create/update: Redirect to the listing
//!                 delete: Completed(FormState "Deleted Invoice")
//! ```
//!
//! Failures are terminal and handed back to the caller as display-ready
//! `FormState`s. The pipeline never retries and never invalidates anything
//! unless the write went through.

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use invoicedesk_core::InvoiceId;
use invoicedesk_invoicing::{validate_invoice_form, FieldErrors, FormState, InvoiceForm};

use crate::store::{InvoiceChanges, InvoiceStore, NewInvoice};
use crate::view_cache::ViewCache;

/// The invoices listing: invalidated after every write, target of every
/// successful create/update.
pub const INVOICES_VIEW: &str = "/dashboard/invoices";

pub const DELETED_MESSAGE: &str = "Deleted Invoice";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    fn verb(self) -> &'static str {
        match self {
            Operation::Create => "Create",
            Operation::Update => "Update",
            Operation::Delete => "Delete",
        }
    }

    pub fn missing_fields_message(self) -> String {
        format!("Missing Fields. Failed to {} Invoice.", self.verb())
    }

    pub fn database_error_message(self) -> String {
        format!("Database Error: Failed to {} Invoice.", self.verb())
    }
}

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Write succeeded; navigate to this path. Nothing else happens for the
    /// submission after this.
    Redirect(&'static str),
    /// Write succeeded; show this state (delete).
    Completed(FormState),
    /// Input rejected; no write was attempted.
    ValidationFailed(FormState),
    /// The single write failed; nothing was invalidated.
    PersistenceFailed(FormState),
}

impl ActionOutcome {
    pub fn form_state(&self) -> Option<&FormState> {
        match self {
            ActionOutcome::Redirect(_) => None,
            ActionOutcome::Completed(s)
            | ActionOutcome::ValidationFailed(s)
            | ActionOutcome::PersistenceFailed(s) => Some(s),
        }
    }

    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            ActionOutcome::Redirect(to) => Some(to),
            _ => None,
        }
    }
}

/// What `delete_invoice` does. Deletion is opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Fail before any write.
    #[default]
    Guarded,
    /// Run validate-free persist → invalidate → "Deleted Invoice".
    Enabled,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeleteInvoiceError {
    #[error("Failed to Delete Invoice")]
    Guarded,
}

/// Source of "today" for the creation date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock; the creation date is the UTC calendar day.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Validate → transform → persist → invalidate → complete, for invoices.
///
/// Generic over the store, the view cache and the clock so tests can run
/// it against in-memory doubles.
#[derive(Debug)]
pub struct MutationPipeline<S, C, K = SystemClock> {
    store: S,
    cache: C,
    clock: K,
    delete_policy: DeletePolicy,
}

impl<S, C, K> MutationPipeline<S, C, K> {
    pub fn new(store: S, cache: C, clock: K) -> Self {
        Self {
            store,
            cache,
            clock,
            delete_policy: DeletePolicy::default(),
        }
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S, C, K> MutationPipeline<S, C, K>
where
    S: InvoiceStore,
    C: ViewCache,
    K: Clock,
{
    pub async fn create_invoice(&self, form: &InvoiceForm) -> ActionOutcome {
        let op = Operation::Create;
        let fields = match validate_invoice_form(form) {
            Ok(fields) => fields,
            Err(errors) => return Self::rejected(op, errors),
        };

        let invoice = NewInvoice {
            customer_id: fields.customer_id().to_string(),
            amount: fields.amount_in_cents(),
            status: fields.status(),
            date: self.clock.today(),
        };

        if let Err(e) = self.store.insert(invoice).await {
            tracing::error!(error = %e, "failed to create invoice");
            return ActionOutcome::PersistenceFailed(FormState::message(op.database_error_message()));
        }

        tracing::info!(customer_id = fields.customer_id(), "invoice created");
        self.invalidate_and_redirect()
    }

    pub async fn update_invoice(&self, id: InvoiceId, form: &InvoiceForm) -> ActionOutcome {
        let op = Operation::Update;
        let fields = match validate_invoice_form(form) {
            Ok(fields) => fields,
            Err(errors) => return Self::rejected(op, errors),
        };

        let changes = InvoiceChanges {
            customer_id: fields.customer_id().to_string(),
            amount: fields.amount_in_cents(),
            status: fields.status(),
        };

        if let Err(e) = self.store.update(id, changes).await {
            tracing::error!(invoice_id = %id, error = %e, "failed to update invoice");
            return ActionOutcome::PersistenceFailed(FormState::message(op.database_error_message()));
        }

        tracing::info!(invoice_id = %id, "invoice updated");
        self.invalidate_and_redirect()
    }

    /// Delete one invoice.
    ///
    /// Under [`DeletePolicy::Guarded`] this always returns
    /// `Err(DeleteInvoiceError::Guarded)` without touching the store or the
    /// cache.
    pub async fn delete_invoice(&self, id: InvoiceId) -> Result<ActionOutcome, DeleteInvoiceError> {
        if self.delete_policy == DeletePolicy::Guarded {
            tracing::warn!(invoice_id = %id, "invoice deletion is guarded; refusing");
            return Err(DeleteInvoiceError::Guarded);
        }

        if let Err(e) = self.store.delete(id).await {
            tracing::error!(invoice_id = %id, error = %e, "failed to delete invoice");
            return Ok(ActionOutcome::PersistenceFailed(FormState::message(
                Operation::Delete.database_error_message(),
            )));
        }

        self.cache.invalidate(INVOICES_VIEW);
        tracing::info!(invoice_id = %id, "invoice deleted");
        Ok(ActionOutcome::Completed(FormState::message(DELETED_MESSAGE)))
    }

    fn rejected(op: Operation, errors: FieldErrors) -> ActionOutcome {
        tracing::debug!(operation = op.verb(), fields = ?errors.fields().collect::<Vec<_>>(), "invoice form rejected");
        ActionOutcome::ValidationFailed(FormState::invalid(errors, op.missing_fields_message()))
    }

    fn invalidate_and_redirect(&self) -> ActionOutcome {
        self.cache.invalidate(INVOICES_VIEW);
        ActionOutcome::Redirect(INVOICES_VIEW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use invoicedesk_core::Cents;
    use invoicedesk_invoicing::{Customer, Invoice, InvoiceField, InvoiceStatus};
    use proptest::prelude::*;

    use crate::store::{InMemoryInvoiceStore, StoreError};
    use crate::view_cache::InMemoryViewCache;

    #[derive(Debug, Clone, PartialEq)]
    enum Write {
        Insert(NewInvoice),
        Update(InvoiceId, InvoiceChanges),
        Delete(InvoiceId),
    }

    /// Records every statement; optionally fails all of them.
    #[derive(Default)]
    struct RecordingStore {
        writes: Mutex<Vec<Write>>,
        fail: bool,
    }

    impl RecordingStore {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn writes(&self) -> Vec<Write> {
            self.writes.lock().unwrap().clone()
        }

        fn record(&self, write: Write) -> Result<(), StoreError> {
            self.writes.lock().unwrap().push(write);
            if self.fail {
                Err(StoreError::Backend("connection reset".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl InvoiceStore for RecordingStore {
        async fn insert(&self, invoice: NewInvoice) -> Result<(), StoreError> {
            self.record(Write::Insert(invoice))
        }

        async fn update(&self, id: InvoiceId, changes: InvoiceChanges) -> Result<(), StoreError> {
            self.record(Write::Update(id, changes))
        }

        async fn delete(&self, id: InvoiceId) -> Result<(), StoreError> {
            self.record(Write::Delete(id))
        }
    }

    struct FixedClock(NaiveDate);

    impl Clock for FixedClock {
        fn today(&self) -> NaiveDate {
            self.0
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    type TestPipeline<S> = MutationPipeline<Arc<S>, Arc<InMemoryViewCache<String>>, FixedClock>;

    fn pipeline<S>(store: S) -> (TestPipeline<S>, Arc<S>, Arc<InMemoryViewCache<String>>) {
        let store = Arc::new(store);
        let cache = Arc::new(InMemoryViewCache::new());
        let p = MutationPipeline::new(store.clone(), cache.clone(), FixedClock(today()));
        (p, store, cache)
    }

    fn customer(id: &str) -> Customer {
        Customer {
            id: id.to_string(),
            name: format!("Customer {id}"),
            email: format!("{id}@example.com"),
            image_url: format!("/customers/{id}.png"),
        }
    }

    #[tokio::test]
    async fn create_persists_cents_and_today_then_redirects() {
        let (p, store, cache) = pipeline(RecordingStore::default());

        let outcome = p.create_invoice(&InvoiceForm::new("c1", "50", "pending")).await;

        assert_eq!(outcome, ActionOutcome::Redirect("/dashboard/invoices"));
        assert_eq!(
            store.writes(),
            vec![Write::Insert(NewInvoice {
                customer_id: "c1".to_string(),
                amount: Cents::new(5000),
                status: InvoiceStatus::Pending,
                date: today(),
            })]
        );
        assert_eq!(cache.generation(INVOICES_VIEW), 1);
    }

    #[tokio::test]
    async fn create_with_empty_customer_reports_field_error_without_writing() {
        let (p, store, cache) = pipeline(RecordingStore::default());

        let outcome = p.create_invoice(&InvoiceForm::new("", "50", "pending")).await;

        let ActionOutcome::ValidationFailed(state) = outcome else {
            panic!("expected validation failure, got {outcome:?}");
        };
        assert_eq!(state.message.as_deref(), Some("Missing Fields. Failed to Create Invoice."));
        let errors = state.errors.as_ref().unwrap();
        assert!(errors.contains(InvoiceField::CustomerId));
        assert_eq!(errors.fields().count(), 1);
        assert!(store.writes().is_empty());
        assert_eq!(cache.generation(INVOICES_VIEW), 0);
    }

    #[tokio::test]
    async fn zero_amount_is_rejected_without_writing() {
        let (p, store, _cache) = pipeline(RecordingStore::default());

        let outcome = p.create_invoice(&InvoiceForm::new("c1", "0", "paid")).await;

        let state = outcome.form_state().unwrap();
        assert!(!state.field_errors(InvoiceField::Amount).is_empty());
        assert!(outcome.redirect_target().is_none());
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn update_validation_failure_names_the_update() {
        let (p, _store, _cache) = pipeline(RecordingStore::default());

        let outcome = p.update_invoice(InvoiceId::new(), &InvoiceForm::new("c1", "10", "void")).await;

        let state = outcome.form_state().unwrap();
        assert_eq!(state.message.as_deref(), Some("Missing Fields. Failed to Update Invoice."));
        assert!(!state.field_errors(InvoiceField::Status).is_empty());
    }

    #[tokio::test]
    async fn store_failure_on_update_neither_navigates_nor_invalidates() {
        let (p, store, cache) = pipeline(RecordingStore::failing());

        let outcome = p.update_invoice(InvoiceId::new(), &InvoiceForm::new("c1", "10", "paid")).await;

        assert_eq!(
            outcome,
            ActionOutcome::PersistenceFailed(FormState::message("Database Error: Failed to Update Invoice."))
        );
        assert_eq!(store.writes().len(), 1);
        assert_eq!(cache.generation(INVOICES_VIEW), 0);
    }

    #[tokio::test]
    async fn store_failure_on_create_reports_database_error() {
        let (p, _store, cache) = pipeline(RecordingStore::failing());

        let outcome = p.create_invoice(&InvoiceForm::new("c1", "10", "paid")).await;

        assert_eq!(
            outcome,
            ActionOutcome::PersistenceFailed(FormState::message("Database Error: Failed to Create Invoice."))
        );
        assert_eq!(cache.generation(INVOICES_VIEW), 0);
    }

    #[tokio::test]
    async fn update_overwrites_only_customer_amount_and_status() {
        let (p, store, _cache) = pipeline(InMemoryInvoiceStore::with_customers([customer("c1"), customer("c2")]));
        let original = Invoice {
            id: InvoiceId::new(),
            customer_id: "c1".to_string(),
            amount: Cents::new(100),
            status: InvoiceStatus::Pending,
            date: NaiveDate::from_ymd_opt(2023, 12, 24).unwrap(),
        };
        store.seed_invoice(original.clone());

        let form = InvoiceForm::new("c2", "75.5", "paid");
        assert_eq!(p.update_invoice(original.id, &form).await, ActionOutcome::Redirect(INVOICES_VIEW));
        let once = store.get(original.id).unwrap();

        assert_eq!(once.id, original.id);
        assert_eq!(once.date, original.date);
        assert_eq!(once.customer_id, "c2");
        assert_eq!(once.amount, Cents::new(7550));
        assert_eq!(once.status, InvoiceStatus::Paid);

        // Same submission again: same row.
        assert_eq!(p.update_invoice(original.id, &form).await, ActionOutcome::Redirect(INVOICES_VIEW));
        assert_eq!(store.get(original.id).unwrap(), once);
        assert_eq!(store.invoices().len(), 1);
    }

    #[tokio::test]
    async fn unknown_customer_surfaces_as_database_error() {
        let (p, store, cache) = pipeline(InMemoryInvoiceStore::with_customers([customer("c1")]));

        let outcome = p.create_invoice(&InvoiceForm::new("ghost", "10", "paid")).await;

        assert_eq!(
            outcome.form_state().and_then(|s| s.message.as_deref()),
            Some("Database Error: Failed to Create Invoice.")
        );
        assert!(store.invoices().is_empty());
        assert_eq!(cache.generation(INVOICES_VIEW), 0);
    }

    #[tokio::test]
    async fn guarded_delete_fails_before_touching_the_store() {
        let (p, store, cache) = pipeline(RecordingStore::default());
        assert_eq!(p.delete_policy(), DeletePolicy::Guarded);

        let err = p.delete_invoice(InvoiceId::new()).await.unwrap_err();

        assert_eq!(err, DeleteInvoiceError::Guarded);
        assert_eq!(err.to_string(), "Failed to Delete Invoice");
        assert!(store.writes().is_empty());
        assert_eq!(cache.generation(INVOICES_VIEW), 0);
    }

    #[tokio::test]
    async fn enabled_delete_removes_row_and_invalidates() {
        let (p, store, cache) = pipeline(RecordingStore::default());
        let p = p.with_delete_policy(DeletePolicy::Enabled);
        let id = InvoiceId::new();

        let outcome = p.delete_invoice(id).await.unwrap();

        assert_eq!(outcome, ActionOutcome::Completed(FormState::message("Deleted Invoice")));
        assert!(outcome.redirect_target().is_none());
        assert_eq!(store.writes(), vec![Write::Delete(id)]);
        assert_eq!(cache.generation(INVOICES_VIEW), 1);
    }

    #[tokio::test]
    async fn enabled_delete_store_failure_reports_database_error() {
        let (p, _store, cache) = pipeline(RecordingStore::failing());
        let p = p.with_delete_policy(DeletePolicy::Enabled);

        let outcome = p.delete_invoice(InvoiceId::new()).await.unwrap();

        assert_eq!(
            outcome,
            ActionOutcome::PersistenceFailed(FormState::message("Database Error: Failed to Delete Invoice."))
        );
        assert_eq!(cache.generation(INVOICES_VIEW), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: a non-positive or non-numeric amount never reaches the store.
        #[test]
        fn bad_amounts_never_write(
            amount in prop_oneof![
                (-10_000.0f64..=0.0f64).prop_map(|a| a.to_string()),
                "[a-zA-Z!?]{1,6}",
            ]
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (p, store, cache) = pipeline(RecordingStore::default());

            let outcome = rt.block_on(p.create_invoice(&InvoiceForm::new("c1", &amount, "paid")));

            prop_assert!(matches!(outcome, ActionOutcome::ValidationFailed(_)));
            prop_assert!(outcome.form_state().unwrap().field_errors(InvoiceField::Amount).len() == 1);
            prop_assert!(store.writes().is_empty());
            prop_assert_eq!(cache.generation(INVOICES_VIEW), 0);
        }

        /// Property: well-formed creates persist exactly amount * 100.
        #[test]
        fn good_amounts_persist_in_cents(cents in 1i64..100_000_000i64) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (p, store, _cache) = pipeline(RecordingStore::default());
            let raw = format!("{}.{:02}", cents / 100, cents % 100);

            let outcome = rt.block_on(p.create_invoice(&InvoiceForm::new("c1", &raw, "pending")));

            prop_assert_eq!(outcome, ActionOutcome::Redirect(INVOICES_VIEW));
            match store.writes().as_slice() {
                [Write::Insert(new)] => {
                    prop_assert_eq!(new.amount, Cents::new(cents));
                    prop_assert_eq!(new.date, today());
                }
                other => prop_assert!(false, "unexpected writes: {:?}", other),
            }
        }
    }
}
