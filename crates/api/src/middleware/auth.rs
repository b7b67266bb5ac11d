//! Session authentication for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::{AppState, error::ApiError};
use quotely_core::auth::{UserRole, hash_token};
use quotely_db::{SessionRepository, entities::users};
use quotely_shared::config::SessionConfig;

/// The authenticated user, resolved from the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// User ID.
    pub id: Uuid,
    /// Tenant the user belongs to; every query is scoped by it.
    pub company_id: Uuid,
    /// Email.
    pub email: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Role within the company.
    pub role: UserRole,
}

impl CurrentUser {
    /// Fails with 403 unless the user may manage users.
    pub fn require_user_admin(&self) -> Result<(), ApiError> {
        if self.role.can_manage_users() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Only admins can manage users"))
        }
    }

    /// Fails with 403 unless the user may change company settings.
    pub fn require_settings_admin(&self) -> Result<(), ApiError> {
        if self.role.can_modify_settings() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Only admins can modify company settings"))
        }
    }
}

impl From<users::Model> for CurrentUser {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            company_id: user.company_id,
            role: UserRole::parse(&user.role).unwrap_or_default(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// Builds the session cookie carrying the raw token.
pub fn session_cookie(config: &SessionConfig, token: String) -> Cookie<'static> {
    Cookie::build(Cookie::new(config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(config.ttl_hours))
        .build()
}

/// Cookie used to clear the session on the client.
pub fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    Cookie::build(Cookie::new(config.cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Authentication middleware backed by the sessions table.
///
/// This middleware:
/// 1. Reads the session token from the cookie
/// 2. Looks up a live session by the token's hash
/// 3. Stores the [`CurrentUser`] in request extensions for handlers
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = jar.get(&state.config.session.cookie_name) else {
        return ApiError::unauthorized("Not authenticated").into_response();
    };

    let sessions = SessionRepository::new(state.db.clone());
    match sessions.find_active(&hash_token(token.value()), Utc::now()).await {
        Ok(Some((session, user))) => {
            debug!(session_id = %session.id, user_id = %user.id, "Session resolved");
            request.extensions_mut().insert(CurrentUser::from(user));
            next.run(request).await
        }
        Ok(None) => ApiError::unauthorized("Session expired or invalid").into_response(),
        Err(e) => {
            error!(error = %e, "Failed to look up session");
            ApiError::from(e).into_response()
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn user(role: &str) -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@acme.test".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: role.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[rstest]
    #[case("ADMIN", true)]
    #[case("USER", false)]
    #[case("auditor", false)]
    fn test_role_gates(#[case] role: &str, #[case] is_admin: bool) {
        let current = CurrentUser::from(user(role));
        assert_eq!(current.require_user_admin().is_ok(), is_admin);
        assert_eq!(current.require_settings_admin().is_ok(), is_admin);
        if !is_admin {
            assert_eq!(
                current.require_user_admin().unwrap_err().status(),
                axum::http::StatusCode::FORBIDDEN
            );
        }
    }

    #[test]
    fn test_session_cookie_attributes() {
        let config = SessionConfig {
            cookie_name: "sid".to_string(),
            ttl_hours: 24,
            cookie_secure: true,
        };
        let cookie = session_cookie(&config, "tok".to_string());
        assert_eq!(cookie.name(), "sid");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(24)));
    }
}
