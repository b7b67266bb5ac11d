//! Health check endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::{AppState, middleware::CurrentUser};

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status: `healthy`, or `degraded` when the database is down.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Database reachability.
    pub database: &'static str,
}

/// Health check handler. Always 200 so the process counts as alive even
/// while the database is unreachable.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.db.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            warn!(error = %e, "Database ping failed");
            "unavailable"
        }
    };

    Json(HealthResponse {
        status: if database == "ok" { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}

/// GET /health/storage - Probes the object storage backend.
async fn storage_check(State(state): State<AppState>, _user: CurrentUser) -> Response {
    let Some(storage) = state.storage.as_ref() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "storage_not_configured",
                "message": "Object storage is not configured"
            })),
        )
            .into_response();
    };

    match storage.health_check().await {
        Ok(()) => Json(json!({
            "status": "ok",
            "provider": storage.provider_name(),
        }))
        .into_response(),
        Err(e) => {
            warn!(error = %e, provider = storage.provider_name(), "Storage health check failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": "external_service_error",
                    "message": format!("Storage check failed: {e}"),
                    "provider": storage.provider_name(),
                })),
            )
                .into_response()
        }
    }
}

/// Creates public health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Creates health routes that need a session.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/health/storage", get(storage_check))
}
