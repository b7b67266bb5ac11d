//! User management routes. Reads are open to every member of the company;
//! mutations are admin only.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::CurrentUser,
};
use quotely_core::auth::{UserRole, check_password_policy, hash_password};
use quotely_db::{
    UserRepository,
    entities::users,
    repositories::{CreateUserInput, UpdateUserInput},
};

/// Creates the user routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// A user as returned by the API. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Company ID.
    pub company_id: Uuid,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email.
    pub email: String,
    /// `ADMIN` or `USER`.
    pub role: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            company_id: user.company_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
            created_at: user.created_at.with_timezone(&Utc),
        }
    }
}

/// Request body for creating a user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// First name.
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    /// Last name.
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    /// Email, unique within the company.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Role; defaults to `USER`.
    #[serde(default)]
    pub role: UserRole,
}

/// Request body for updating a user.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    /// First name.
    #[validate(length(min = 1, message = "First name must not be blank"))]
    pub first_name: Option<String>,
    /// Last name.
    #[validate(length(min = 1, message = "Last name must not be blank"))]
    pub last_name: Option<String>,
    /// Email.
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    /// New password.
    pub password: Option<String>,
    /// Role.
    pub role: Option<UserRole>,
}

/// Loads a user and checks it belongs to the caller's company.
async fn load_member(repo: &UserRepository, current: &CurrentUser, id: Uuid) -> ApiResult<users::Model> {
    let user = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if user.company_id != current.company_id {
        return Err(ApiError::forbidden("User belongs to another company"));
    }
    Ok(user)
}

/// GET /users - List users in the caller's company.
async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = UserRepository::new(state.db.clone())
        .list_by_company(current.company_id)
        .await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/{id} - Get a user.
async fn get_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let repo = UserRepository::new(state.db.clone());
    let user = load_member(&repo, &current, id).await?;
    Ok(Json(user.into()))
}

/// POST /users - Create a user in the caller's company.
async fn create_user(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    current.require_user_admin()?;
    check_password_policy(&payload.password)?;
    let password_hash = hash_password(&payload.password)?;

    let user = UserRepository::new(state.db.clone())
        .create(CreateUserInput {
            company_id: current.company_id,
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            password_hash,
            role: payload.role,
        })
        .await?;

    info!(user_id = %user.id, created_by = %current.id, role = %payload.role, "User created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PATCH /users/{id} - Update a user.
async fn update_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    current.require_user_admin()?;
    let repo = UserRepository::new(state.db.clone());
    load_member(&repo, &current, id).await?;

    let password_hash = match payload.password.as_deref() {
        Some(password) => {
            check_password_policy(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let user = repo
        .update(
            id,
            UpdateUserInput {
                first_name: payload.first_name,
                last_name: payload.last_name,
                email: payload.email,
                password_hash,
                role: payload.role,
            },
        )
        .await?;

    info!(user_id = %user.id, updated_by = %current.id, "User updated");
    Ok(Json(user.into()))
}

/// DELETE /users/{id} - Delete a user other than yourself.
async fn delete_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    current.require_user_admin()?;
    if id == current.id {
        return Err(ApiError::validation("You cannot delete your own account"));
    }

    let repo = UserRepository::new(state.db.clone());
    load_member(&repo, &current, id).await?;
    if !repo.delete(id).await? {
        return Err(ApiError::not_found("User"));
    }

    info!(user_id = %id, deleted_by = %current.id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
