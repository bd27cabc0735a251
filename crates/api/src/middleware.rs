use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use thiserror::Error;
use tracing::debug;

use shopfront_auth::Subject;

use crate::app::errors::{auth_error_to_response, json_error};
use crate::app::services::SharedAuth;

#[derive(Clone)]
pub struct AuthState {
    pub auth: SharedAuth,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthHeaderError {
    #[error("authorization header is not valid UTF-8")]
    NotUtf8,

    #[error("authorization header must be `Bearer <token>`")]
    Malformed,
}

/// Resolve the caller for one request.
///
/// Fails open: a request without an `Authorization` header continues as the
/// anonymous subject. A header that is present but malformed, or carries a
/// token that does not verify, is rejected with 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let subject = match extract_bearer(req.headers()) {
        Ok(None) => Subject::anonymous(),
        Ok(Some(token)) => match state.auth.validate_token(token) {
            Ok(subject) => subject,
            Err(e) => {
                debug!(error = %e, "bearer token rejected");
                return auth_error_to_response(e);
            }
        },
        Err(e) => {
            debug!(error = %e, "authorization header rejected");
            return json_error(StatusCode::UNAUTHORIZED, "invalid_auth_header", e.to_string());
        }
    };

    req.extensions_mut().insert(subject);
    next.run(req).await
}

/// `Ok(None)` when no `Authorization` header is present, or when it is empty.
pub fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, AuthHeaderError> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    if header.is_empty() {
        return Ok(None);
    }
    let header = header.to_str().map_err(|_| AuthHeaderError::NotUtf8)?;
    parse_bearer(header).map(Some)
}

/// Split `Bearer <token>`: exactly two single-space separated parts.
pub fn parse_bearer(value: &str) -> Result<&str, AuthHeaderError> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(AuthHeaderError::Malformed),
    }
}
