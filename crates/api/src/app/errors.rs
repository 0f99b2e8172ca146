use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::json;

use invoicedesk_infra::{ActionOutcome, StoreError};

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Map a pipeline outcome onto HTTP: 303 for navigation, otherwise the
/// `FormState` with a status matching its kind.
pub fn outcome_to_response(outcome: ActionOutcome) -> Response {
    match outcome {
        ActionOutcome::Redirect(to) => Redirect::to(to).into_response(),
        ActionOutcome::Completed(state) => (StatusCode::OK, Json(state)).into_response(),
        ActionOutcome::ValidationFailed(state) => (StatusCode::UNPROCESSABLE_ENTITY, Json(state)).into_response(),
        ActionOutcome::PersistenceFailed(state) => (StatusCode::INTERNAL_SERVER_ERROR, Json(state)).into_response(),
    }
}

/// Read failures on page loads. Details stay in the logs.
pub fn store_error_to_response(err: StoreError) -> Response {
    tracing::error!(error = %err, "page load failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "Database Error: Failed to load data.")
}

pub fn invalid_id() -> Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid invoice id")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;
    use invoicedesk_invoicing::FormState;

    #[test]
    fn redirect_is_see_other_with_location() {
        let res = outcome_to_response(ActionOutcome::Redirect("/dashboard/invoices"));
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[LOCATION], "/dashboard/invoices");
    }

    #[test]
    fn form_states_map_to_statuses() {
        let state = FormState::message("x");
        assert_eq!(
            outcome_to_response(ActionOutcome::ValidationFailed(state.clone())).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            outcome_to_response(ActionOutcome::PersistenceFailed(state.clone())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(outcome_to_response(ActionOutcome::Completed(state)).status(), StatusCode::OK);
    }
}
