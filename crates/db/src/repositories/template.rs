//! Quote template repository: terms-and-conditions text per company.

use std::sync::Arc;

use quotely_core::catalog::{CatalogError, required};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{categories, quote_templates};

/// Error types for template operations.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Template not found in this company.
    #[error("Template not found: {0}")]
    NotFound(Uuid),

    /// Referenced category is not in this company.
    #[error("Category not found: {0}")]
    UnknownCategory(Uuid),

    /// A required field is blank.
    #[error(transparent)]
    Rule(#[from] CatalogError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a template.
#[derive(Debug, Clone)]
pub struct TemplateInput {
    /// Name; quotes refer to templates by name.
    pub name: String,
    /// Category the template applies to.
    pub category_id: Option<Uuid>,
    /// Terms text.
    pub content: String,
}

/// Partial template update.
#[derive(Debug, Clone, Default)]
pub struct TemplatePatch {
    /// Name.
    pub name: Option<String>,
    /// Category; `Some(None)` detaches it.
    pub category_id: Option<Option<Uuid>>,
    /// Terms text.
    pub content: Option<String>,
}

/// Template repository.
#[derive(Debug, Clone)]
pub struct TemplateRepository {
    db: Arc<DatabaseConnection>,
}

impl TemplateRepository {
    /// Creates a new template repository.
    #[must_use]
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    /// Lists a company's templates by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, company_id: Uuid) -> Result<Vec<quote_templates::Model>, DbErr> {
        quote_templates::Entity::find()
            .filter(quote_templates::Column::CompanyId.eq(company_id))
            .order_by_asc(quote_templates::Column::Name)
            .all(&*self.db)
            .await
    }

    /// Lists the templates attached to a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_category(
        &self,
        company_id: Uuid,
        category_id: Uuid,
    ) -> Result<Vec<quote_templates::Model>, DbErr> {
        quote_templates::Entity::find()
            .filter(quote_templates::Column::CompanyId.eq(company_id))
            .filter(quote_templates::Column::CategoryId.eq(category_id))
            .order_by_asc(quote_templates::Column::Name)
            .all(&*self.db)
            .await
    }

    /// `(name, content)` pairs for document assembly.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn terms(&self, company_id: Uuid) -> Result<Vec<(String, String)>, DbErr> {
        Ok(self
            .list(company_id)
            .await?
            .into_iter()
            .map(|t| (t.name, t.content))
            .collect())
    }

    /// Finds a template of a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<quote_templates::Model>, DbErr> {
        quote_templates::Entity::find_by_id(id)
            .filter(quote_templates::Column::CompanyId.eq(company_id))
            .one(&*self.db)
            .await
    }

    async fn check_category(
        &self,
        company_id: Uuid,
        category_id: Option<Uuid>,
    ) -> Result<(), TemplateError> {
        let Some(category_id) = category_id else {
            return Ok(());
        };
        let found = categories::Entity::find_by_id(category_id)
            .filter(categories::Column::CompanyId.eq(company_id))
            .one(&*self.db)
            .await?;
        if found.is_none() {
            return Err(TemplateError::UnknownCategory(category_id));
        }
        Ok(())
    }

    /// Creates a template.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCategory` or a `Rule` error for blank fields.
    pub async fn create(
        &self,
        company_id: Uuid,
        input: TemplateInput,
    ) -> Result<quote_templates::Model, TemplateError> {
        let name = required("Template name", &input.name)?;
        let content = required("Template content", &input.content)?;
        self.check_category(company_id, input.category_id).await?;

        Ok(quote_templates::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            name: Set(name),
            category_id: Set(input.category_id),
            content: Set(content),
        }
        .insert(&*self.db)
        .await?)
    }

    /// Updates a template.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `UnknownCategory` or a `Rule` error.
    pub async fn update(
        &self,
        company_id: Uuid,
        id: Uuid,
        patch: TemplatePatch,
    ) -> Result<quote_templates::Model, TemplateError> {
        let existing = self
            .find(company_id, id)
            .await?
            .ok_or(TemplateError::NotFound(id))?;

        let mut row: quote_templates::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            row.name = Set(required("Template name", &name)?);
        }
        if let Some(content) = patch.content {
            row.content = Set(required("Template content", &content)?);
        }
        if let Some(category_id) = patch.category_id {
            self.check_category(company_id, category_id).await?;
            row.category_id = Set(category_id);
        }

        Ok(row.update(&*self.db).await?)
    }

    /// Deletes a template. Returns false when nothing was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete(&self, company_id: Uuid, id: Uuid) -> Result<bool, DbErr> {
        let result = quote_templates::Entity::delete_many()
            .filter(quote_templates::Column::Id.eq(id))
            .filter(quote_templates::Column::CompanyId.eq(company_id))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
