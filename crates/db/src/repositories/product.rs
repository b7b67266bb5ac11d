//! Product repository.

use std::sync::Arc;

use quotely_core::catalog::{CatalogError, ProductFields};
use quotely_core::quote::PricedProduct;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::products;

/// Error types for product operations.
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    /// Product not found in this company.
    #[error("Product not found: {0}")]
    NotFound(Uuid),

    /// A catalog rule rejected the input.
    #[error(transparent)]
    Rule(#[from] CatalogError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Image URLs stored on a product row. Malformed JSON reads as no images.
#[must_use]
pub fn image_urls(product: &products::Model) -> Vec<String> {
    serde_json::from_value(product.image_urls.clone()).unwrap_or_default()
}

/// Product repository.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    db: Arc<DatabaseConnection>,
}

impl ProductRepository {
    /// Creates a new product repository.
    #[must_use]
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    /// Lists a company's products by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, company_id: Uuid) -> Result<Vec<products::Model>, DbErr> {
        products::Entity::find()
            .filter(products::Column::CompanyId.eq(company_id))
            .order_by_asc(products::Column::Name)
            .all(&*self.db)
            .await
    }

    /// Finds a product of a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<products::Model>, DbErr> {
        products::Entity::find_by_id(id)
            .filter(products::Column::CompanyId.eq(company_id))
            .one(&*self.db)
            .await
    }

    /// Loads the pricing view of the given products. Products outside the
    /// company are silently absent, which makes them unknown to pricing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn priced(
        &self,
        company_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<PricedProduct>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = products::Entity::find()
            .filter(products::Column::CompanyId.eq(company_id))
            .filter(products::Column::Id.is_in(ids.iter().copied()))
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|p| PricedProduct {
                id: p.id,
                name: p.name,
                price: p.price,
            })
            .collect())
    }

    /// Creates a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        company_id: Uuid,
        fields: ProductFields,
        image_urls: Vec<String>,
    ) -> Result<products::Model, ProductError> {
        let row = products::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            name: Set(fields.name),
            description: Set(fields.description),
            price: Set(fields.price),
            unit: Set(fields.unit),
            category_name: Set(fields.category_name),
            image_urls: Set(serde_json::Value::from(image_urls)),
        }
        .insert(&*self.db)
        .await?;

        Ok(row)
    }

    /// Replaces a product's fields and image list.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product is not in the company.
    pub async fn update(
        &self,
        company_id: Uuid,
        id: Uuid,
        fields: ProductFields,
        image_urls: Vec<String>,
    ) -> Result<products::Model, ProductError> {
        let existing = self
            .find(company_id, id)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        let mut row: products::ActiveModel = existing.into();
        row.name = Set(fields.name);
        row.description = Set(fields.description);
        row.price = Set(fields.price);
        row.unit = Set(fields.unit);
        row.category_name = Set(fields.category_name);
        row.image_urls = Set(serde_json::Value::from(image_urls));

        Ok(row.update(&*self.db).await?)
    }

    /// Deletes a product and, by cascade, its variants. Returns the deleted
    /// row so callers can clean up its images.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product is not in the company.
    pub async fn delete(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<products::Model, ProductError> {
        let existing = self
            .find(company_id, id)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        products::Entity::delete_by_id(id).exec(&*self.db).await?;
        Ok(existing)
    }
}
