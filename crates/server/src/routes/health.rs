//! Health check endpoints.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the contact store cannot be listed.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().list().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(backend = state.store().backend_name(), error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
