use std::sync::Arc;

use axum::{
    extract::{Extension, RawQuery},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use invoicedesk_search::{SearchParams, QUERY_PARAM};

use crate::app::dto::{CustomersTable, CustomersTableRow};
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/", get(list_customers))
}

pub async fn list_customers(Extension(services): Extension<Arc<AppServices>>, RawQuery(raw): RawQuery) -> Response {
    let params = SearchParams::parse(raw.as_deref().unwrap_or_default());
    let query = params.get(QUERY_PARAM).unwrap_or_default().to_string();

    match services.reader.fetch_filtered_customers(&query).await {
        Ok(rows) => Json(CustomersTable {
            query,
            customers: rows.into_iter().map(CustomersTableRow::from).collect(),
        })
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
