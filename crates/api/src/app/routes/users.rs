use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use shopfront_core::UserId;

use crate::app::routes::common::run_blocking;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::Caller;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(subject): Caller,
    Json(body): Json<dto::CreateUserRequest>,
) -> axum::response::Response {
    let auth = services.auth.clone();
    let created = match run_blocking(move || auth.create_user(&subject, body.into())).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match created {
        Ok(user) => (StatusCode::CREATED, Json(dto::UserView::from(&user))).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(subject): Caller,
) -> axum::response::Response {
    match services.auth.list_users(&subject) {
        Ok(users) => {
            let items = users.iter().map(dto::UserView::from).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(subject): Caller,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match id.parse::<UserId>() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.auth.get_user(&subject, &id) {
        Ok(user) => (StatusCode::OK, Json(dto::UserView::from(&user))).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(subject): Caller,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> axum::response::Response {
    let id = match id.parse::<UserId>() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let auth = services.auth.clone();
    let updated = match run_blocking(move || auth.update_user(&subject, &id, body)).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match updated {
        Ok(user) => (StatusCode::OK, Json(dto::UserView::from(&user))).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}
