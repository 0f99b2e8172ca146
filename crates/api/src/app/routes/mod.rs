use axum::{routing::get, Router};

pub mod auth;
pub mod customers;
pub mod invoices;
pub mod system;

/// Router for all session-protected endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/dashboard/invoices", invoices::router())
        .nest("/dashboard/customers", customers::router())
}
