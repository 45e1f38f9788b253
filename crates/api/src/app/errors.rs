//! Single mapping from [`DomainError`] to HTTP responses.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use buildmart_core::DomainError;

/// Map a domain error to its HTTP response. State conflicts additionally
/// carry the order's current status so callers can resynchronize.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let (status, code) = match &err {
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        DomainError::InvalidId(_) => (StatusCode::BAD_REQUEST, "invalid_id"),
        DomainError::StateConflict { .. } => (StatusCode::CONFLICT, "state_conflict"),
        DomainError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        DomainError::Unauthorized => (StatusCode::FORBIDDEN, "forbidden"),
        DomainError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
        DomainError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };

    let mut body = json!({
        "error": code,
        "message": err.to_string(),
    });
    if let DomainError::StateConflict { current, .. } = &err {
        body["current_status"] = json!(current);
    }

    (status, axum::Json(body)).into_response()
}

/// Ad-hoc error response for failures that never reach the domain layer.
pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
