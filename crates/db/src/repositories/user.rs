//! User repository for database operations.

use std::sync::Arc;

use quotely_core::auth::UserRole;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use super::{is_unique_violation, normalize_email};
use crate::entities::{companies, users};

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// Email already used within the company.
    #[error("Email '{0}' is already in use")]
    EmailTaken(String),

    /// User not found.
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a user inside a company.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Owning company.
    pub company_id: Uuid,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email, unique within the company.
    pub email: String,
    /// Argon2 PHC hash.
    pub password_hash: String,
    /// Role.
    pub role: UserRole,
}

/// Input for updating a user. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// New password hash.
    pub password_hash: Option<String>,
    /// Role.
    pub role: Option<UserRole>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&*self.db).await
    }

    /// Finds a user together with their company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_with_company(
        &self,
        id: Uuid,
    ) -> Result<Option<(users::Model, companies::Model)>, DbErr> {
        let result = users::Entity::find_by_id(id)
            .find_also_related(companies::Entity)
            .one(&*self.db)
            .await?;

        Ok(result.and_then(|(user, company)| company.map(|c| (user, c))))
    }

    /// Finds the user that may log in with `email` under `company_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_for_login(
        &self,
        company_name: &str,
        email: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .join(JoinType::InnerJoin, users::Relation::Companies.def())
            .filter(companies::Column::Name.eq(company_name.trim()))
            .filter(users::Column::Email.eq(normalize_email(email)))
            .one(&*self.db)
            .await
    }

    /// Lists the users of a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .order_by_asc(users::Column::CreatedAt)
            .all(&*self.db)
            .await
    }

    /// Checks if an email is already used in a company, optionally ignoring
    /// one user (the one being updated).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_taken(
        &self,
        company_id: Uuid,
        email: &str,
        except: Option<Uuid>,
    ) -> Result<bool, DbErr> {
        let mut query = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::Email.eq(normalize_email(email)));
        if let Some(id) = except {
            query = query.filter(users::Column::Id.ne(id));
        }

        Ok(query.one(&*self.db).await?.is_some())
    }

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns `EmailTaken` if the email is already used in the company.
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, UserError> {
        let email = normalize_email(&input.email);
        if self.email_taken(input.company_id, &email, None).await? {
            return Err(UserError::EmailTaken(email));
        }

        users::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(input.company_id),
            first_name: Set(input.first_name.trim().to_string()),
            last_name: Set(input.last_name.trim().to_string()),
            email: Set(email.clone()),
            password_hash: Set(input.password_hash),
            role: Set(input.role.as_str().to_string()),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| email_conflict(e, &email))
    }

    /// Updates a user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `EmailTaken`.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateUserInput,
    ) -> Result<users::Model, UserError> {
        let existing = self.find_by_id(id).await?.ok_or(UserError::NotFound(id))?;
        let company_id = existing.company_id;
        let mut user: users::ActiveModel = existing.into();

        if let Some(first_name) = input.first_name {
            user.first_name = Set(first_name.trim().to_string());
        }
        if let Some(last_name) = input.last_name {
            user.last_name = Set(last_name.trim().to_string());
        }
        let email = input.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            if self.email_taken(company_id, email, Some(id)).await? {
                return Err(UserError::EmailTaken(email.clone()));
            }
            user.email = Set(email.clone());
        }
        if let Some(hash) = input.password_hash {
            user.password_hash = Set(hash);
        }
        if let Some(role) = input.role {
            user.role = Set(role.as_str().to_string());
        }

        user.update(&*self.db)
            .await
            .map_err(|e| email_conflict(e, email.as_deref().unwrap_or_default()))
    }

    /// Deletes a user. Returns false when nothing was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = users::Entity::delete_by_id(id).exec(&*self.db).await?;
        Ok(result.rows_affected > 0)
    }

    /// Counts all users in the system.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> Result<u64, DbErr> {
        users::Entity::find().count(&*self.db).await
    }
}

fn email_conflict(err: DbErr, email: &str) -> UserError {
    if is_unique_violation(&err) {
        UserError::EmailTaken(email.to_string())
    } else {
        UserError::Database(err)
    }
}
