//! Session repository for database operations.
//!
//! Sessions are looked up by the SHA-256 of the cookie token; the raw token
//! never reaches the database.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::entities::{sessions, users};

/// Input for creating a session.
#[derive(Debug, Clone)]
pub struct NewSession<'a> {
    /// Authenticated user.
    pub user_id: Uuid,
    /// SHA-256 hex of the cookie token.
    pub token_hash: &'a str,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
    /// Client user agent.
    pub user_agent: Option<&'a str>,
    /// Client IP address.
    pub ip_address: Option<&'a str>,
}

/// Session repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    db: Arc<DatabaseConnection>,
}

impl SessionRepository {
    /// Creates a new session repository.
    #[must_use]
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    /// Creates a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, input: NewSession<'_>) -> Result<sessions::Model, DbErr> {
        sessions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            token_hash: Set(input.token_hash.to_string()),
            user_agent: Set(input.user_agent.map(String::from)),
            ip_address: Set(input.ip_address.map(String::from)),
            expires_at: Set(input.expires_at.into()),
            revoked_at: Set(None),
            created_at: Set(Utc::now().into()),
        }
        .insert(&*self.db)
        .await
    }

    /// Finds a live session (not revoked, not expired) and its user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(sessions::Model, users::Model)>, DbErr> {
        let result = sessions::Entity::find()
            .filter(sessions::Column::TokenHash.eq(token_hash))
            .filter(sessions::Column::RevokedAt.is_null())
            .filter(sessions::Column::ExpiresAt.gt(now))
            .find_also_related(users::Entity)
            .one(&*self.db)
            .await?;

        Ok(result.and_then(|(session, user)| user.map(|u| (session, u))))
    }

    /// Revokes the session with this token hash. Returns false if none was live.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_by_hash(&self, token_hash: &str) -> Result<bool, DbErr> {
        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::RevokedAt, Expr::value(Utc::now()))
            .filter(sessions::Column::TokenHash.eq(token_hash))
            .filter(sessions::Column::RevokedAt.is_null())
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Revokes all sessions for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, DbErr> {
        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::RevokedAt, Expr::value(Utc::now()))
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::RevokedAt.is_null())
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Cleans up expired sessions (for maintenance).
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, DbErr> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lt(now))
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
