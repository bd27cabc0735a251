use axum::http::StatusCode;
use tracing::error;

use crate::app::errors;

/// Run CPU-heavy work (password hashing) off the async executor.
pub async fn run_blocking<T, F>(f: F) -> Result<T, axum::response::Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!(error = %e, "blocking task failed");
        errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
    })
}
