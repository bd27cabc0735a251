//! Unary RPC interception.
//!
//! Transport-neutral: `Metadata` follows gRPC metadata semantics
//! (case-insensitive keys, multiple values per key) and `RpcStatus` carries
//! gRPC status codes, so a concrete RPC server only needs to convert its own
//! metadata/status types at the edge.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use shopfront_auth::{AuthError, AuthService, StoreError, Subject, TokenError, UserStore};

use crate::middleware::parse_bearer;

pub const AUTHORIZATION_KEY: &str = "authorization";

// ─────────────────────────────────────────────────────────────────────────────
// Metadata
// ─────────────────────────────────────────────────────────────────────────────

/// Request metadata: lowercase keys, insertion-ordered values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value; existing values for the key are kept.
    pub fn append(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.entries.push((key.as_ref().to_ascii_lowercase(), value.into()));
    }

    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).next()
    }

    pub fn get_all<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a str> + 'a {
        let key = key.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(move |(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

/// The subset of gRPC status codes this service produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcCode {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    Internal,
    Unauthenticated,
}

impl RpcCode {
    /// Numeric gRPC code.
    pub fn as_i32(self) -> i32 {
        match self {
            RpcCode::InvalidArgument => 3,
            RpcCode::NotFound => 5,
            RpcCode::AlreadyExists => 6,
            RpcCode::PermissionDenied => 7,
            RpcCode::Internal => 13,
            RpcCode::Unauthenticated => 16,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code:?}: {message}")]
pub struct RpcStatus {
    pub code: RpcCode,
    pub message: String,
}

impl RpcStatus {
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(RpcCode::Unauthenticated, message)
    }
}

impl From<AuthError> for RpcStatus {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized => RpcStatus::new(RpcCode::PermissionDenied, "permission denied"),
            AuthError::Token(TokenError::Expired) => RpcStatus::unauthenticated("token has expired"),
            AuthError::Token(TokenError::InvalidToken(_)) => RpcStatus::unauthenticated("invalid token"),
            AuthError::Store(StoreError::NotFound) => RpcStatus::new(RpcCode::NotFound, "not found"),
            AuthError::Store(StoreError::Conflict(msg)) => RpcStatus::new(RpcCode::AlreadyExists, msg),
            AuthError::Validation(msg) => RpcStatus::new(RpcCode::InvalidArgument, msg),
            AuthError::Token(TokenError::Encode(_))
            | AuthError::Store(StoreError::Backend(_))
            | AuthError::Credential(_) => RpcStatus::new(RpcCode::Internal, "internal error"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Interceptor
// ─────────────────────────────────────────────────────────────────────────────

/// Resolves the caller from `authorization` metadata before a unary handler
/// runs, then hands the handler that subject explicitly.
pub struct UnaryInterceptor<S> {
    auth: Arc<AuthService<S>>,
}

impl<S> Clone for UnaryInterceptor<S> {
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
        }
    }
}

impl<S: UserStore> UnaryInterceptor<S> {
    pub fn new(auth: Arc<AuthService<S>>) -> Self {
        Self { auth }
    }

    /// Anonymous when no `authorization` entry exists or the first one is
    /// empty; otherwise the first entry must be a valid `Bearer <token>`.
    pub fn authenticate(&self, metadata: &Metadata) -> Result<Subject, RpcStatus> {
        let Some(header) = metadata.get(AUTHORIZATION_KEY).filter(|v| !v.is_empty()) else {
            return Ok(Subject::anonymous());
        };

        let token = parse_bearer(header).map_err(|e| {
            debug!(error = %e, "rpc authorization metadata rejected");
            RpcStatus::unauthenticated("invalid authorization header")
        })?;

        self.auth.validate_token(token).map_err(|e| {
            debug!(error = %e, "rpc bearer token rejected");
            RpcStatus::unauthenticated(e.to_string())
        })
    }

    /// Authenticate, then run `handler` with the resolved subject.
    ///
    /// The handler is not called when authentication fails.
    pub async fn intercept<Req, Resp, F, Fut>(
        &self,
        metadata: &Metadata,
        request: Req,
        handler: F,
    ) -> Result<Resp, RpcStatus>
    where
        F: FnOnce(Subject, Req) -> Fut,
        Fut: Future<Output = Result<Resp, RpcStatus>>,
    {
        let subject = self.authenticate(metadata)?;
        handler(subject, request).await
    }
}
