//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api`
//! - Cookie session middleware
//! - Request extractors and multipart form parsing
//! - JSON error responses

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod multipart;
pub mod notify;
pub mod routes;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use quotely_core::storage::StorageService;
use quotely_shared::{AppConfig, AppError, EmailService, WebhookClient};

pub use error::{ApiError, ApiResult};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Email service for approval notifications.
    pub email_service: Arc<EmailService>,
    /// Outbound webhook client.
    pub webhook: WebhookClient,
    /// Object storage for images and logos (optional).
    pub storage: Option<Arc<StorageService>>,
}

impl AppState {
    /// The storage service, or a 502 when uploads are not configured.
    ///
    /// # Errors
    ///
    /// Returns `ExternalService` when no storage backend is configured.
    pub fn storage(&self) -> ApiResult<&StorageService> {
        self.storage.as_deref().ok_or_else(|| {
            ApiError(AppError::ExternalService(
                "Object storage is not configured".to_string(),
            ))
        })
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let max_body = state.config.server.max_body_bytes;
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .nest("/api", routes::api_routes_with_state(state.clone()))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Any origin when none are configured. Cookies are only sent cross-origin
/// to explicitly listed origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}
