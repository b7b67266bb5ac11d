//! Company repository: tenants and their registration.

use std::sync::Arc;

use quotely_core::auth::UserRole;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::{is_unique_violation, normalize_email};
use crate::entities::{companies, users};

/// Logo shown until a company uploads its own.
pub const DEFAULT_LOGO_URL: &str = "/default-logo.png";

/// Error types for company operations.
#[derive(Debug, thiserror::Error)]
pub enum CompanyError {
    /// Company name already registered.
    #[error("Company '{0}' already exists")]
    NameTaken(String),

    /// Company not found.
    #[error("Company not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for registering a company together with its first admin.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    /// Company name, unique across the system.
    pub company_name: String,
    /// Logo URL; defaults to [`DEFAULT_LOGO_URL`].
    pub logo_url: Option<String>,
    /// Admin first name.
    pub first_name: String,
    /// Admin last name.
    pub last_name: String,
    /// Admin email.
    pub email: String,
    /// Argon2 PHC hash of the admin password.
    pub password_hash: String,
}

/// Company repository.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: Arc<DatabaseConnection>,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    /// Finds a company by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<companies::Model>, DbErr> {
        companies::Entity::find_by_id(id).one(&*self.db).await
    }

    /// Finds a company by its exact name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<companies::Model>, DbErr> {
        companies::Entity::find()
            .filter(companies::Column::Name.eq(name.trim()))
            .one(&*self.db)
            .await
    }

    /// Creates a company and its first ADMIN user in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `NameTaken` if the company name is in use.
    pub async fn register(
        &self,
        input: RegisterInput,
    ) -> Result<(companies::Model, users::Model), CompanyError> {
        let company_name = input.company_name.trim().to_string();
        if self.find_by_name(&company_name).await?.is_some() {
            return Err(CompanyError::NameTaken(company_name));
        }

        let txn = self.db.begin().await?;
        let now = chrono::Utc::now().into();

        let company = companies::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(company_name.clone()),
            logo_url: Set(input
                .logo_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOGO_URL.to_string())),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| name_conflict(e, &company_name))?;

        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company.id),
            first_name: Set(input.first_name.trim().to_string()),
            last_name: Set(input.last_name.trim().to_string()),
            email: Set(normalize_email(&input.email)),
            password_hash: Set(input.password_hash),
            role: Set(UserRole::Admin.as_str().to_string()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok((company, user))
    }

    /// Updates name and, when given, logo URL.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `NameTaken` when another company has the name.
    pub async fn update_settings(
        &self,
        id: Uuid,
        name: &str,
        logo_url: Option<String>,
    ) -> Result<companies::Model, CompanyError> {
        let name = name.trim().to_string();
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or(CompanyError::NotFound(id))?;

        if name != existing.name
            && let Some(other) = self.find_by_name(&name).await?
            && other.id != id
        {
            return Err(CompanyError::NameTaken(name));
        }

        let mut company: companies::ActiveModel = existing.into();
        company.name = Set(name.clone());
        if let Some(url) = logo_url {
            company.logo_url = Set(url);
        }

        company
            .update(&*self.db)
            .await
            .map_err(|e| name_conflict(e, &name))
    }
}

fn name_conflict(err: DbErr, name: &str) -> CompanyError {
    if is_unique_violation(&err) {
        CompanyError::NameTaken(name.to_string())
    } else {
        CompanyError::Database(err)
    }
}
