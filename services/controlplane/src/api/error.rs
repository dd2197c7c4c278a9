//! API error types and helpers.
//!
//! # Purpose
//! Centralizes HTTP error response construction so error shapes stay uniform
//! across portfolio endpoints, and maps store failures onto HTTP semantics.
//!
//! # Key invariants and assumptions
//! - Error responses must include a stable `code` and human-readable `message`.
//! - Status codes must align with the error category.
//! - Invite redemption failures surface their machine-readable reason as the
//!   `code` so clients can render the precise dead-end screen.
//!
//! # Security considerations
//! - Internal errors log details server-side but return generic messages.
//! - Revoked invite codes are indistinguishable from unknown ones.
use crate::api::types::ErrorResponse;
use crate::model::RedemptionReason;
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Structured API error returned by handlers.
///
/// Couples an HTTP status code with a JSON error body and implements
/// `IntoResponse` so handlers can use it directly in `Result`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn build(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        },
    }
}

/// Build a 404 Not Found error.
pub fn api_not_found(message: &str) -> ApiError {
    build(StatusCode::NOT_FOUND, "not_found", message)
}

/// Build a 409 Conflict error with a caller-provided code.
pub fn api_conflict(code: &str, message: &str) -> ApiError {
    // Caller provides a specific conflict code for precise client handling.
    build(StatusCode::CONFLICT, code, message)
}

/// Build a 400 Bad Request validation error.
pub fn api_validation_error(message: &str) -> ApiError {
    build(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// Build a 401 Unauthorized error.
pub fn api_unauthorized(message: &str) -> ApiError {
    build(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

/// Build a 403 Forbidden error.
pub fn api_forbidden(message: &str) -> ApiError {
    build(StatusCode::FORBIDDEN, "forbidden", message)
}

/// Build a 500 Internal Server Error from a store error.
///
/// Logs the store error server-side and returns a generic message.
pub fn api_internal(message: &str, err: &StoreError) -> ApiError {
    tracing::error!(error = ?err, "controlplane storage error");
    build(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

/// Build a 500 Internal Server Error without a store error.
pub fn api_internal_message(message: &str) -> ApiError {
    build(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

/// Build the response for a failed invite redemption.
///
/// An unknown token is a plain 404; every other reason is a 409 whose `code`
/// is the redemption reason (`already_used`, `expired`, `unit_occupied`).
pub fn api_redemption(reason: RedemptionReason) -> ApiError {
    let status = match reason {
        RedemptionReason::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::CONFLICT,
    };
    build(status, reason.as_code(), &reason.to_string())
}

/// Map a store failure onto the default HTTP response for `context`.
///
/// Handlers that need a more specific conflict code match on the error first
/// and fall back to this.
pub fn api_store_error(context: &str, err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(what) => api_not_found(&format!("{what} not found")),
        StoreError::Conflict(message) => api_conflict("conflict", &message),
        StoreError::Invalid(message) => api_validation_error(&message),
        StoreError::Redemption(reason) => api_redemption(reason),
        err @ StoreError::Unexpected(_) => api_internal(context, &err),
    }
}
