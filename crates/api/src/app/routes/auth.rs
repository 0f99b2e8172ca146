use std::sync::Arc;

use axum::{
    extract::{Extension, Form},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

use invoicedesk_auth::{authenticate, Authentication, Credentials, INVALID_CREDENTIALS};

use crate::app::dto::LoginResponse;
use crate::app::errors;
use crate::app::services::AppServices;

/// `POST /login`: sign in with the credentials form and hand back a session token.
pub async fn login(Extension(services): Extension<Arc<AppServices>>, Form(credentials): Form<Credentials>) -> Response {
    match authenticate(services.credentials.as_ref(), &credentials).await {
        Ok(Authentication::SignedIn(user)) => match services.sessions.issue(&user, Utc::now()) {
            Ok(token) => Json(LoginResponse { token }).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "failed to issue session");
                errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "session_error", "failed to issue session")
            }
        },
        Ok(Authentication::Rejected(message)) => {
            let status = if message == INVALID_CREDENTIALS {
                StatusCode::UNAUTHORIZED
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(json!({ "message": message }))).into_response()
        }
        Err(e) => {
            tracing::error!(error = ?e, "sign-in failed unexpectedly");
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}
