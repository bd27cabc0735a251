use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use shopfront_auth::Subject;

/// The subject making the current request.
///
/// Populated by `auth_middleware`. Outside that layer (or for requests
/// without credentials) this is the anonymous subject, which the policy
/// table grants nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Caller(pub Subject);

impl Caller {
    pub fn subject(&self) -> &Subject {
        &self.0
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let subject = parts
            .extensions
            .get::<Subject>()
            .cloned()
            .unwrap_or_else(Subject::anonymous);
        Ok(Caller(subject))
    }
}
