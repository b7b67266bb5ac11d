//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::session_middleware};

pub mod auth;
pub mod categories;
pub mod company;
pub mod customers;
pub mod health;
pub mod products;
pub mod quotes;
pub mod templates;
pub mod users;
pub mod variants;
pub mod webhook;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require a session
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(health::protected_routes())
        .merge(users::routes())
        .merge(company::routes())
        .merge(categories::routes())
        .merge(products::routes())
        .merge(variants::routes())
        .merge(customers::routes())
        .merge(templates::routes())
        .merge(quotes::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(webhook::routes())
        .merge(protected_routes)
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Helpers for driving the router against a mock database.

    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, Response, header},
    };
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use uuid::Uuid;

    use crate::{AppState, create_router};
    use quotely_db::entities::{sessions, users};
    use quotely_shared::{AppConfig, EmailConfig, EmailService, WebhookClient, WebhookConfig};

    pub const TOKEN: &str = "test-session-token";

    pub fn config() -> AppConfig {
        AppConfig {
            server: Default::default(),
            database: quotely_shared::config::DatabaseConfig {
                url: "postgres://localhost/quotely_test".to_string(),
                max_connections: 1,
                min_connections: 1,
            },
            session: Default::default(),
            email: EmailConfig::default(),
            storage: None,
            webhook: WebhookConfig::default(),
        }
    }

    pub fn state(db: DatabaseConnection) -> AppState {
        let config = config();
        AppState {
            db: Arc::new(db),
            email_service: Arc::new(EmailService::new(config.email.clone())),
            webhook: WebhookClient::new(config.webhook.clone()).expect("http client"),
            storage: None,
            config: Arc::new(config),
        }
    }

    pub fn user(company_id: Uuid, role: &str) -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            company_id,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@acme.test".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: role.to_string(),
            created_at: Utc::now().into(),
        }
    }

    pub fn session_row(user: &users::Model) -> (sessions::Model, users::Model) {
        let now = Utc::now();
        (
            sessions::Model {
                id: Uuid::new_v4(),
                user_id: user.id,
                token_hash: quotely_core::auth::hash_token(TOKEN),
                user_agent: None,
                ip_address: None,
                expires_at: (now + Duration::hours(1)).into(),
                created_at: now.into(),
                revoked_at: None,
            },
            user.clone(),
        )
    }

    /// A mock database whose first query resolves the session of `user`.
    pub fn authed_db(user: &users::Model) -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![session_row(user)]])
    }

    pub fn authed(request: axum::http::request::Builder) -> axum::http::request::Builder {
        let cookie_name = quotely_shared::config::SessionConfig::default().cookie_name;
        request.header(header::COOKIE, format!("{cookie_name}={TOKEN}"))
    }

    pub fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
        authed(Request::builder().method(method).uri(uri))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    pub fn get(uri: &str) -> Request<Body> {
        authed(Request::builder().uri(uri))
            .body(Body::empty())
            .expect("request")
    }

    pub async fn send(db: DatabaseConnection, request: Request<Body>) -> Response<Body> {
        use tower::ServiceExt;

        create_router(state(db)).oneshot(request).await.expect("response")
    }

    pub async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }
}
