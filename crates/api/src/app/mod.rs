//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: authorization service, user store, customer directory
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower::ServiceBuilder;

use shopfront_auth::AuthError;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &ApiConfig) -> Result<Router, AuthError> {
    let services = Arc::new(services::build_services(config)?);
    let auth_state = middleware::AuthState {
        auth: services.auth.clone(),
    };

    // Every route resolves its caller; requests without a token run as anonymous.
    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/login", post(routes::auth::login))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(Extension(services))
                .layer(axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware)),
        ))
}
