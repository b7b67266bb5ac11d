//! Product variant repository. Variants have no company column; tenancy
//! is enforced through the owning product.

use std::sync::Arc;

use quotely_core::catalog::{CatalogError, required, validate_price};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use crate::entities::{product_variants, products};

/// Error types for variant operations.
#[derive(Debug, thiserror::Error)]
pub enum VariantError {
    /// Owning product not found in this company.
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    /// Variant not found in this company.
    #[error("Product variant not found: {0}")]
    NotFound(Uuid),

    /// A catalog rule rejected the input.
    #[error(transparent)]
    Rule(#[from] CatalogError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Variant repository.
#[derive(Debug, Clone)]
pub struct VariantRepository {
    db: Arc<DatabaseConnection>,
}

impl VariantRepository {
    /// Creates a new variant repository.
    #[must_use]
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    async fn product_in_company(&self, company_id: Uuid, product_id: Uuid) -> Result<bool, DbErr> {
        let product = products::Entity::find_by_id(product_id)
            .filter(products::Column::CompanyId.eq(company_id))
            .one(&*self.db)
            .await?;
        Ok(product.is_some())
    }

    /// Lists the variants of a product.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` if the product is not in the company.
    pub async fn list_for_product(
        &self,
        company_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<product_variants::Model>, VariantError> {
        if !self.product_in_company(company_id, product_id).await? {
            return Err(VariantError::ProductNotFound(product_id));
        }

        Ok(product_variants::Entity::find()
            .filter(product_variants::Column::ProductId.eq(product_id))
            .order_by_asc(product_variants::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Finds a variant whose product belongs to the company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<product_variants::Model>, DbErr> {
        product_variants::Entity::find_by_id(id)
            .join(JoinType::InnerJoin, product_variants::Relation::Products.def())
            .filter(products::Column::CompanyId.eq(company_id))
            .one(&*self.db)
            .await
    }

    /// Creates a variant.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound`, or a `Rule` error for a blank name or a
    /// negative price.
    pub async fn create(
        &self,
        company_id: Uuid,
        product_id: Uuid,
        name: &str,
        price: Decimal,
    ) -> Result<product_variants::Model, VariantError> {
        let name = required("Variant name", name)?;
        let price = validate_price(price)?;
        if !self.product_in_company(company_id, product_id).await? {
            return Err(VariantError::ProductNotFound(product_id));
        }

        Ok(product_variants::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            name: Set(name),
            price: Set(price),
        }
        .insert(&*self.db)
        .await?)
    }

    /// Updates a variant's name and/or price.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a `Rule` error.
    pub async fn update(
        &self,
        company_id: Uuid,
        id: Uuid,
        name: Option<&str>,
        price: Option<Decimal>,
    ) -> Result<product_variants::Model, VariantError> {
        let existing = self
            .find(company_id, id)
            .await?
            .ok_or(VariantError::NotFound(id))?;

        let mut row: product_variants::ActiveModel = existing.into();
        if let Some(name) = name {
            row.name = Set(required("Variant name", name)?);
        }
        if let Some(price) = price {
            row.price = Set(validate_price(price)?);
        }

        Ok(row.update(&*self.db).await?)
    }

    /// Deletes a variant.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the variant is not in the company.
    pub async fn delete(&self, company_id: Uuid, id: Uuid) -> Result<(), VariantError> {
        if self.find(company_id, id).await?.is_none() {
            return Err(VariantError::NotFound(id));
        }
        product_variants::Entity::delete_by_id(id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }
}
