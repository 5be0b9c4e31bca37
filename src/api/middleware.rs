//! Response middleware
//!
//! Hides client-error detail when the service runs in production mode.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::config::ErrorExposure;
use crate::models::ErrorResponse;

/// Generic, field-free text for a client-error status.
pub fn generic_message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "Resource not found",
        StatusCode::CONFLICT => "Request conflicts with an existing resource",
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => "Invalid request",
        _ => "Request could not be processed",
    }
}

/// Replaces every 4xx body with generic text unless details are exposed.
///
/// The full message has already been logged by the error's `IntoResponse`.
pub async fn mask_client_errors(
    State(exposure): State<ErrorExposure>,
    req: Request,
    next: Next,
) -> Response {
    let response = next.run(req).await;
    let status = response.status();

    if exposure.is_detailed() || !status.is_client_error() {
        return response;
    }

    (status, Json(ErrorResponse::new(generic_message(status)))).into_response()
}
