use axum::{routing::get, Router};

pub mod auth;
pub mod common;
pub mod customers;
pub mod system;
pub mod users;

/// Router for endpoints behind the bearer-token middleware.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/users", users::router())
        .nest("/customers", customers::router())
}
