//! Customer repository.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::normalize_email;
use crate::entities::customers;

/// Input for creating a customer.
#[derive(Debug, Clone)]
pub struct CustomerInput {
    /// Name.
    pub name: String,
    /// Email.
    pub email: String,
    /// Phone.
    pub phone: Option<String>,
}

/// Partial customer update.
#[derive(Debug, Clone, Default)]
pub struct CustomerPatch {
    /// Name.
    pub name: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Phone; `Some(None)` clears it.
    pub phone: Option<Option<String>>,
}

/// Customer repository.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    db: Arc<DatabaseConnection>,
}

impl CustomerRepository {
    /// Creates a new customer repository.
    #[must_use]
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    /// Lists a company's customers by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, company_id: Uuid) -> Result<Vec<customers::Model>, DbErr> {
        customers::Entity::find()
            .filter(customers::Column::CompanyId.eq(company_id))
            .order_by_asc(customers::Column::Name)
            .all(&*self.db)
            .await
    }

    /// Finds a customer of a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<customers::Model>, DbErr> {
        customers::Entity::find_by_id(id)
            .filter(customers::Column::CompanyId.eq(company_id))
            .one(&*self.db)
            .await
    }

    /// Creates a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        company_id: Uuid,
        input: CustomerInput,
    ) -> Result<customers::Model, DbErr> {
        customers::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            name: Set(input.name.trim().to_string()),
            email: Set(normalize_email(&input.email)),
            phone: Set(input.phone.filter(|p| !p.trim().is_empty())),
        }
        .insert(&*self.db)
        .await
    }

    /// Updates a customer. Returns `None` if it is not in the company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update(
        &self,
        company_id: Uuid,
        id: Uuid,
        patch: CustomerPatch,
    ) -> Result<Option<customers::Model>, DbErr> {
        let Some(existing) = self.find(company_id, id).await? else {
            return Ok(None);
        };

        let mut row: customers::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            row.name = Set(name.trim().to_string());
        }
        if let Some(email) = patch.email {
            row.email = Set(normalize_email(&email));
        }
        if let Some(phone) = patch.phone {
            row.phone = Set(phone.filter(|p| !p.trim().is_empty()));
        }

        row.update(&*self.db).await.map(Some)
    }

    /// Deletes a customer. Returns false when nothing was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete(&self, company_id: Uuid, id: Uuid) -> Result<bool, DbErr> {
        let result = customers::Entity::delete_many()
            .filter(customers::Column::Id.eq(id))
            .filter(customers::Column::CompanyId.eq(company_id))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use super::*;

    #[tokio::test]
    async fn test_update_missing_customer_is_none() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<customers::Model>::new()])
            .into_connection();

        let updated = CustomerRepository::new(db)
            .update(Uuid::new_v4(), Uuid::new_v4(), CustomerPatch::default())
            .await
            .expect("update");
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_delete_scoped_to_company() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let db = Arc::new(db);

        let deleted = CustomerRepository::new(Arc::clone(&db))
            .delete(Uuid::new_v4(), Uuid::new_v4())
            .await
            .expect("delete");
        assert!(!deleted);

        let log = Arc::try_unwrap(db).expect("sole owner").into_transaction_log();
        assert_eq!(log.len(), 1);
        let sql = format!("{:?}", log[0]);
        assert!(sql.contains("company_id"));
    }
}
