//! Quotely API Server
//!
//! Main entry point for the Quotely backend service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use quotely_api::{AppState, create_router};
use quotely_core::storage::{StorageConfig, StorageService};
use quotely_db::connect;
use quotely_shared::{AppConfig, EmailService, WebhookClient};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quotely=debug,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(&config.database).await?;
    info!(max_connections = config.database.max_connections, "Connected to database");

    let email_service = EmailService::new(config.email.clone());
    info!(
        smtp_host = %config.email.smtp_host,
        smtp_port = %config.email.smtp_port,
        "Email service configured"
    );

    let webhook = WebhookClient::new(config.webhook.clone())?;
    if webhook.is_enabled() {
        info!(max_attempts = config.webhook.max_attempts, "Outbound webhook enabled");
    } else {
        info!("Outbound webhook disabled: no endpoint configured");
    }

    let storage = match &config.storage {
        Some(settings) => {
            let service = StorageService::from_config(StorageConfig::from_settings(settings))?;
            info!(provider = service.provider_name(), "Object storage configured");
            Some(Arc::new(service))
        }
        None => {
            warn!("Object storage not configured; uploads will be rejected");
            None
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db: Arc::new(db),
        config: Arc::new(config),
        email_service: Arc::new(email_service),
        webhook,
        storage,
    };

    let app = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
