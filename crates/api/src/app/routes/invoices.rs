use std::sync::Arc;

use axum::{
    extract::{Extension, Form, Path, RawQuery},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use invoicedesk_core::InvoiceId;
use invoicedesk_infra::{load_edit_form, INVOICES_VIEW};
use invoicedesk_invoicing::InvoiceForm;
use invoicedesk_search::{SearchParams, PAGE_PARAM, QUERY_PARAM};

use crate::app::dto::{CreateInvoiceView, InvoicesPage, ListedInvoice};
use crate::app::errors;
use crate::app::services::AppServices;

/// Response header telling whether the listing came from the view cache.
pub const VIEW_CACHE_HEADER: &str = "x-view-cache";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/create", get(create_form))
        .route("/:id", post(update_invoice))
        .route("/:id/edit", get(edit_form))
        .route("/:id/delete", post(delete_invoice))
}

pub async fn list_invoices(Extension(services): Extension<Arc<AppServices>>, RawQuery(raw): RawQuery) -> Response {
    let params = SearchParams::parse(raw.as_deref().unwrap_or_default());
    let query = params.get(QUERY_PARAM).unwrap_or_default().to_string();
    let page = params
        .get(PAGE_PARAM)
        .and_then(|p| p.parse::<u32>().ok())
        .unwrap_or(1)
        .max(1);
    let variant = params.to_query_string();

    if let Some(view) = services.views.get(INVOICES_VIEW, &variant) {
        return cached(view, "hit");
    }

    let ticket = services.views.ticket(INVOICES_VIEW);
    let fetched = tokio::try_join!(
        services.reader.fetch_filtered_invoices(&query, page),
        services.reader.fetch_invoice_pages(&query),
    );
    let (rows, total_pages) = match fetched {
        Ok(v) => v,
        Err(e) => return errors::store_error_to_response(e),
    };

    let view = InvoicesPage {
        query,
        page,
        total_pages,
        invoices: rows.into_iter().map(ListedInvoice::from).collect(),
    };
    services.views.store(INVOICES_VIEW, &variant, ticket, view.clone());
    cached(view, "miss")
}

fn cached(view: InvoicesPage, status: &'static str) -> Response {
    let mut res = Json(view).into_response();
    res.headers_mut().insert(VIEW_CACHE_HEADER, HeaderValue::from_static(status));
    res
}

pub async fn create_form(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.reader.fetch_customers().await {
        Ok(customers) => Json(CreateInvoiceView { customers }).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn edit_form(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    let Ok(id) = id.parse::<InvoiceId>() else {
        return errors::invalid_id();
    };

    match load_edit_form(services.reader.as_ref(), id).await {
        Ok(Some(form)) => Json(form).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "Invoice not found."),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_invoice(Extension(services): Extension<Arc<AppServices>>, Form(form): Form<InvoiceForm>) -> Response {
    errors::outcome_to_response(services.pipeline.create_invoice(&form).await)
}

pub async fn update_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Form(form): Form<InvoiceForm>,
) -> Response {
    let Ok(id) = id.parse::<InvoiceId>() else {
        return errors::invalid_id();
    };
    errors::outcome_to_response(services.pipeline.update_invoice(id, &form).await)
}

pub async fn delete_invoice(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    let Ok(id) = id.parse::<InvoiceId>() else {
        return errors::invalid_id();
    };
    match services.pipeline.delete_invoice(id).await {
        Ok(outcome) => errors::outcome_to_response(outcome),
        Err(e) => {
            tracing::error!(invoice_id = %id, error = %e, "delete invoice failed");
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "delete_failed", e.to_string())
        }
    }
}
