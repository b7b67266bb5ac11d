//! Authentication routes: register, login, logout and the current user.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::USER_AGENT},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::{
        CurrentUser,
        auth::{removal_cookie, session_cookie},
    },
    routes::{company::CompanyResponse, users::UserResponse},
};
use quotely_core::auth::{
    SessionToken, check_password_policy, hash_password, hash_token, verify_password,
};
use quotely_db::{
    CompanyRepository, SessionRepository, UserRepository,
    repositories::{NewSession, RegisterInput},
};

/// Creates the public auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// Creates auth routes that need a session.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/user", get(current_user))
}

/// Request body for registering a company and its first admin.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// First name.
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    /// Last name.
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    /// Login email.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// Company name; must be unique.
    #[validate(length(min = 1, message = "Company name is required"))]
    pub company_name: String,
    /// Optional logo URL.
    pub logo_url: Option<String>,
}

/// Request body for logging in.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login email.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// Plain-text password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Company the user belongs to.
    #[validate(length(min = 1, message = "Company name is required"))]
    pub company_name: String,
}

/// The signed-in user with their company.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUserResponse {
    /// The user.
    #[serde(flatten)]
    pub user: UserResponse,
    /// The user's company.
    pub company: CompanyResponse,
}

/// Stores a new session for the user and returns the cookie jar carrying it.
async fn start_session(
    state: &AppState,
    jar: CookieJar,
    headers: &HeaderMap,
    user_id: Uuid,
) -> ApiResult<CookieJar> {
    let session_config = &state.config.session;
    let token = SessionToken::issue(Utc::now(), Duration::hours(session_config.ttl_hours));

    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim);

    SessionRepository::new(state.db.clone())
        .create(NewSession {
            user_id,
            token_hash: &token.hash,
            expires_at: token.expires_at,
            user_agent,
            ip_address,
        })
        .await?;

    Ok(jar.add(session_cookie(session_config, token.raw)))
}

/// POST /register - Create a company and its first admin, then sign in.
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    check_password_policy(&payload.password)?;
    let password_hash = hash_password(&payload.password)?;

    let (company, user) = CompanyRepository::new(state.db.clone())
        .register(RegisterInput {
            company_name: payload.company_name,
            logo_url: payload.logo_url,
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, company_id = %company.id, "Company registered");

    let jar = start_session(&state, jar, &headers, user.id).await?;
    let body = SessionUserResponse {
        user: user.into(),
        company: company.into(),
    };
    Ok((StatusCode::CREATED, jar, Json(body)))
}

/// POST /login - Verify credentials within a company and start a session.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let invalid = || ApiError::unauthorized("Invalid email, password or company");

    let users = UserRepository::new(state.db.clone());
    let Some(user) = users
        .find_for_login(&payload.company_name, &payload.email)
        .await?
    else {
        info!(company = %payload.company_name, "Login attempt for unknown user");
        return Err(invalid());
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        info!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(invalid());
    }

    let (user, company) = users
        .find_with_company(user.id)
        .await?
        .ok_or_else(invalid)?;

    info!(user_id = %user.id, "User logged in");

    let jar = start_session(&state, jar, &headers, user.id).await?;
    let body = SessionUserResponse {
        user: user.into(),
        company: company.into(),
    };
    Ok((jar, Json(body)))
}

/// POST /logout - Revoke the session, if any, and clear the cookie.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> ApiResult<impl IntoResponse> {
    let session_config = &state.config.session;

    if let Some(cookie) = jar.get(&session_config.cookie_name) {
        let revoked = SessionRepository::new(state.db.clone())
            .revoke_by_hash(&hash_token(cookie.value()))
            .await?;
        if !revoked {
            warn!("Logout with an unknown or already revoked session");
        }
    }

    let jar = jar.remove(removal_cookie(session_config));
    Ok((jar, Json(json!({ "message": "Logged out" }))))
}

/// GET /user - The signed-in user with their company.
async fn current_user(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<SessionUserResponse>> {
    let (user, company) = UserRepository::new(state.db.clone())
        .find_with_company(current.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(SessionUserResponse {
        user: user.into(),
        company: company.into(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use super::*;
    use crate::routes::test_support::{authed, authed_db, body_json, get, send, user};
    use quotely_db::entities::{companies, sessions, users};

    fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let response = send(
            db,
            post_json(
                "/api/register",
                &json!({
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "email": "not-an-email",
                    "password": "secret123",
                    "companyName": "Acme"
                }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let response = send(
            db,
            post_json(
                "/api/register",
                &json!({
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "email": "ada@acme.test",
                    "password": "123",
                    "companyName": "Acme"
                }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();
        let response = send(
            db,
            post_json(
                "/api/login",
                &json!({
                    "email": "ghost@acme.test",
                    "password": "whatever",
                    "companyName": "Acme"
                }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_login_sets_session_cookie() {
        let company = companies::Model {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            logo_url: "/default-logo.png".to_string(),
            created_at: Utc::now().into(),
        };
        let mut me = user(company.id, "USER");
        me.password_hash = quotely_core::auth::hash_password("secret123").expect("hash");
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![me.clone()]])
            .append_query_results([vec![(me.clone(), company.clone())]])
            .append_query_results([vec![sessions::Model {
                id: Uuid::new_v4(),
                user_id: me.id,
                token_hash: "stored".to_string(),
                user_agent: None,
                ip_address: None,
                expires_at: (now + Duration::hours(24)).into(),
                created_at: now.into(),
                revoked_at: None,
            }]])
            .into_connection();

        let response = send(
            db,
            post_json(
                "/api/login",
                &json!({
                    "email": "Ada@Acme.test",
                    "password": "secret123",
                    "companyName": "Acme"
                }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(cookie.starts_with("quotely_session="));
        assert!(!cookie.starts_with("quotely_session=;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=86400"));

        let body = body_json(response).await;
        assert_eq!(body["id"], me.id.to_string());
        assert_eq!(body["company"]["name"], "Acme");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mut me = user(Uuid::new_v4(), "USER");
        me.password_hash = quotely_core::auth::hash_password("secret123").expect("hash");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![me]])
            .into_connection();

        let response = send(
            db,
            post_json(
                "/api/login",
                &json!({
                    "email": "ada@acme.test",
                    "password": "secret124",
                    "companyName": "Acme"
                }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_logout_revokes_and_clears_cookie() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let response = send(
            db,
            authed(Request::builder().method("POST").uri("/api/logout"))
                .body(Body::empty())
                .expect("request"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(cookie.starts_with("quotely_session="));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_logout_without_session() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let response = send(
            db,
            Request::builder()
                .method("POST")
                .uri("/api/logout")
                .body(Body::empty())
                .expect("request"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_current_user_requires_session() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let response = send(
            db,
            Request::builder().uri("/api/user").body(Body::empty()).expect("request"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_current_user_with_company() {
        let company = companies::Model {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            logo_url: "/default-logo.png".to_string(),
            created_at: Utc::now().into(),
        };
        let me = user(company.id, "ADMIN");
        let db = authed_db(&me)
            .append_query_results([vec![(me.clone(), company.clone())]])
            .into_connection();

        let response = send(db, get("/api/user")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["email"], "ada@acme.test");
        assert_eq!(body["role"], "ADMIN");
        assert_eq!(body["company"]["name"], "Acme");
        assert!(body.get("passwordHash").is_none());
    }
}
