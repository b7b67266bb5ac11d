//! Conversion of domain and repository errors into HTTP responses.
//!
//! Every handler error ends up as `{"error": "<code>", "message": "<text>"}`
//! with the status from [`AppError::status_code`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;

use quotely_core::auth::PasswordError;
use quotely_core::catalog::CatalogError;
use quotely_core::quote::QuoteError;
use quotely_core::storage::StorageError;
use quotely_db::repositories::{
    CategoryError, CompanyError, ProductError, QuoteRepoError, TemplateError, UserError,
    VariantError,
};
use quotely_shared::AppError;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Handler error, rendered as the JSON error body.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 400 with a message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// 403 with a message.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self(AppError::Forbidden(message.into()))
    }

    /// 401 with a message.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self(AppError::Unauthorized(message.into()))
    }

    /// 404 for an entity label, e.g. `"Quote"`.
    pub fn not_found(entity: &str) -> Self {
        Self(AppError::not_found(entity))
    }

    /// HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_server_error() {
            error!(error = %self.0, "Request failed");
        }

        let body = json!({
            "error": self.0.error_code(),
            "message": self.0.public_message(),
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self(AppError::Validation(err.to_string()))
    }
}

impl From<QuoteError> for ApiError {
    fn from(err: QuoteError) -> Self {
        if err.is_validation() {
            Self(AppError::Validation(err.to_string()))
        } else {
            Self(AppError::BusinessRule(err.to_string()))
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        if err.is_conflict() {
            Self(AppError::Conflict(err.to_string()))
        } else {
            Self(AppError::Validation(err.to_string()))
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            e if e.is_rejected_upload() => Self(AppError::Validation(e.to_string())),
            StorageError::NotFound { .. } => Self::not_found("File"),
            e => Self(AppError::ExternalService(e.to_string())),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort(_) => Self(AppError::Validation(err.to_string())),
            e => Self(AppError::Internal(e.to_string())),
        }
    }
}

impl From<CompanyError> for ApiError {
    fn from(err: CompanyError) -> Self {
        match err {
            CompanyError::NameTaken(name) => {
                Self(AppError::Conflict(format!("Company '{name}' already exists")))
            }
            CompanyError::NotFound(_) => Self::not_found("Company"),
            CompanyError::Database(e) => e.into(),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::EmailTaken(_) => {
                Self::validation("Email is already in use in this company")
            }
            UserError::NotFound(_) => Self::not_found("User"),
            UserError::Database(e) => e.into(),
        }
    }
}

impl From<CategoryError> for ApiError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::NotFound(_) => Self::not_found("Category"),
            CategoryError::Rule(e) => e.into(),
            CategoryError::Database(e) => e.into(),
        }
    }
}

impl From<ProductError> for ApiError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_) => Self::not_found("Product"),
            ProductError::Rule(e) => e.into(),
            ProductError::Database(e) => e.into(),
        }
    }
}

impl From<VariantError> for ApiError {
    fn from(err: VariantError) -> Self {
        match err {
            VariantError::ProductNotFound(_) => Self::not_found("Product"),
            VariantError::NotFound(_) => Self::not_found("Product variant"),
            VariantError::Rule(e) => e.into(),
            VariantError::Database(e) => e.into(),
        }
    }
}

impl From<TemplateError> for ApiError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::NotFound(_) => Self::not_found("Template"),
            TemplateError::UnknownCategory(_) => Self::validation("Category not found"),
            TemplateError::Rule(e) => e.into(),
            TemplateError::Database(e) => e.into(),
        }
    }
}

impl From<QuoteRepoError> for ApiError {
    fn from(err: QuoteRepoError) -> Self {
        match err {
            QuoteRepoError::NotFound(_) => Self::not_found("Quote"),
            QuoteRepoError::Locked(_) => QuoteError::Locked.into(),
            QuoteRepoError::Database(e) => e.into(),
            e => Self(AppError::Internal(e.to_string())),
        }
    }
}
