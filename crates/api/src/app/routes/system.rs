use axum::{http::StatusCode, Json};

use crate::app::dto::WhoAmI;
use crate::context::Caller;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Caller(subject): Caller) -> Json<WhoAmI> {
    Json(WhoAmI::from(&subject))
}
