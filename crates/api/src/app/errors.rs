use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use shopfront_auth::{AuthError, StoreError, TokenError};
use shopfront_core::DomainError;

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::Unauthorized => json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden"),
        AuthError::Token(TokenError::Expired) => {
            json_error(StatusCode::UNAUTHORIZED, "token_expired", "token has expired")
        }
        AuthError::Token(TokenError::InvalidToken(_)) => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_token", "invalid token")
        }
        AuthError::Store(StoreError::NotFound) => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        AuthError::Store(StoreError::Conflict(msg)) => json_error(StatusCode::CONFLICT, "conflict", msg),
        AuthError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        e @ (AuthError::Token(TokenError::Encode(_))
        | AuthError::Store(StoreError::Backend(_))
        | AuthError::Credential(_)) => {
            error!(error = %e, "internal failure while handling request");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Internal(msg) => {
            error!(error = %msg, "internal failure while handling request");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

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
