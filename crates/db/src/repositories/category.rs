//! Category repository: the per-company category forest.

use std::sync::Arc;

use quotely_core::catalog::{
    CatalogError, CategoryRecord, children_of, ensure_deletable, required, validate_parent,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{categories, quote_templates};

/// Error types for category operations.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    /// Category not found in this company.
    #[error("Category not found: {0}")]
    NotFound(Uuid),

    /// A catalog rule rejected the change.
    #[error(transparent)]
    Rule(#[from] CatalogError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct CategoryInput {
    /// Name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Parent category in the same company.
    pub parent_id: Option<Uuid>,
}

/// Partial category update. The nested options distinguish "leave as is"
/// from "clear".
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    /// Name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<Option<String>>,
    /// Parent.
    pub parent_id: Option<Option<Uuid>>,
}

impl From<categories::Model> for CategoryRecord {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            parent_id: model.parent_id,
        }
    }
}

/// Category repository.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: Arc<DatabaseConnection>,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    /// Lists all categories of a company as domain records, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, company_id: Uuid) -> Result<Vec<CategoryRecord>, DbErr> {
        let rows = categories::Entity::find()
            .filter(categories::Column::CompanyId.eq(company_id))
            .order_by_asc(categories::Column::Name)
            .all(&*self.db)
            .await?;

        Ok(rows.into_iter().map(CategoryRecord::from).collect())
    }

    /// Finds a category of a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<CategoryRecord>, DbErr> {
        let row = categories::Entity::find_by_id(id)
            .filter(categories::Column::CompanyId.eq(company_id))
            .one(&*self.db)
            .await?;

        Ok(row.map(CategoryRecord::from))
    }

    /// Finds a category by exact name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_name(
        &self,
        company_id: Uuid,
        name: &str,
    ) -> Result<Option<CategoryRecord>, DbErr> {
        let row = categories::Entity::find()
            .filter(categories::Column::CompanyId.eq(company_id))
            .filter(categories::Column::Name.eq(name))
            .one(&*self.db)
            .await?;

        Ok(row.map(CategoryRecord::from))
    }

    /// Direct children of a category.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the category is not in the company.
    pub async fn children(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Vec<CategoryRecord>, CategoryError> {
        let all = self.list(company_id).await?;
        if !all.iter().any(|c| c.id == id) {
            return Err(CategoryError::NotFound(id));
        }
        Ok(children_of(&all, Some(id)).into_iter().cloned().collect())
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Returns a `Rule` error for a blank name or a parent outside the company.
    pub async fn create(
        &self,
        company_id: Uuid,
        input: CategoryInput,
    ) -> Result<CategoryRecord, CategoryError> {
        let name = required("Category name", &input.name)?;
        if input.parent_id.is_some() {
            let all = self.list(company_id).await?;
            validate_parent(&all, None, input.parent_id)?;
        }

        let row = categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            name: Set(name),
            description: Set(non_blank(input.description)),
            parent_id: Set(input.parent_id),
        }
        .insert(&*self.db)
        .await?;

        Ok(row.into())
    }

    /// Applies a partial update, re-checking the parent for cycles.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or a `Rule` error for a blank name, an unknown
    /// parent or a cycle.
    pub async fn update(
        &self,
        company_id: Uuid,
        id: Uuid,
        patch: CategoryPatch,
    ) -> Result<CategoryRecord, CategoryError> {
        let existing = categories::Entity::find_by_id(id)
            .filter(categories::Column::CompanyId.eq(company_id))
            .one(&*self.db)
            .await?
            .ok_or(CategoryError::NotFound(id))?;

        let mut row: categories::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            row.name = Set(required("Category name", &name)?);
        }
        if let Some(description) = patch.description {
            row.description = Set(non_blank(description));
        }
        if let Some(parent_id) = patch.parent_id {
            let all = self.list(company_id).await?;
            validate_parent(&all, Some(id), parent_id)?;
            row.parent_id = Set(parent_id);
        }

        Ok(row.update(&*self.db).await?.into())
    }

    /// Deletes a leaf category with no templates attached.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `Rule(HasChildren | HasTemplates)`.
    pub async fn delete(&self, company_id: Uuid, id: Uuid) -> Result<(), CategoryError> {
        let all = self.list(company_id).await?;
        if !all.iter().any(|c| c.id == id) {
            return Err(CategoryError::NotFound(id));
        }

        let templates = quote_templates::Entity::find()
            .filter(quote_templates::Column::CategoryId.eq(id))
            .count(&*self.db)
            .await?;
        ensure_deletable(&all, id, templates)?;

        categories::Entity::delete_by_id(id).exec(&*self.db).await?;
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;

    fn row(company_id: Uuid, id: u128, name: &str, parent: Option<u128>) -> categories::Model {
        categories::Model {
            id: Uuid::from_u128(id),
            company_id,
            name: name.to_string(),
            description: None,
            parent_id: parent.map(Uuid::from_u128),
        }
    }

    #[tokio::test]
    async fn test_children() {
        let company = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                row(company, 1, "Hardware", None),
                row(company, 2, "Tools", Some(1)),
                row(company, 3, "Paint", Some(1)),
                row(company, 4, "Drills", Some(2)),
            ]])
            .into_connection();

        let children = CategoryRepository::new(db)
            .children(company, Uuid::from_u128(1))
            .await
            .expect("children");
        let names: Vec<_> = children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Tools", "Paint"]);
    }

    #[tokio::test]
    async fn test_create_rejects_foreign_parent() {
        let company = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(company, 1, "Hardware", None)]])
            .into_connection();

        let err = CategoryRepository::new(db)
            .create(
                company,
                CategoryInput {
                    name: "Tools".to_string(),
                    description: None,
                    parent_id: Some(Uuid::from_u128(99)),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CategoryError::Rule(CatalogError::UnknownParent(_))
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_cycle() {
        let company = Uuid::new_v4();
        let tree = vec![
            row(company, 1, "Hardware", None),
            row(company, 2, "Tools", Some(1)),
        ];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![tree[0].clone()]])
            .append_query_results([tree])
            .into_connection();

        let err = CategoryRepository::new(db)
            .update(
                company,
                Uuid::from_u128(1),
                CategoryPatch {
                    parent_id: Some(Some(Uuid::from_u128(2))),
                    ..CategoryPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryError::Rule(CatalogError::CircularParent)));
    }

    #[tokio::test]
    async fn test_delete_with_children_conflicts() {
        let company = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                row(company, 1, "Hardware", None),
                row(company, 2, "Tools", Some(1)),
            ]])
            .append_query_results([[count_row(0)]])
            .into_connection();

        let err = CategoryRepository::new(db)
            .delete(company, Uuid::from_u128(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryError::Rule(CatalogError::HasChildren)));
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        std::collections::BTreeMap::from([("num_items", sea_orm::Value::BigInt(Some(n)))])
    }
}
