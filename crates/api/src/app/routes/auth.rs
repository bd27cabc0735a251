use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use shopfront_auth::AuthError;

use crate::app::routes::common::run_blocking;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    let auth = services.auth.clone();
    let result = match run_blocking(move || auth.login(&body.username, &body.password)).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match result {
        Ok(token) => (StatusCode::OK, Json(dto::LoginResponse { token })).into_response(),
        Err(AuthError::Unauthorized) => errors::json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid username or password",
        ),
        Err(e) => errors::auth_error_to_response(e),
    }
}
