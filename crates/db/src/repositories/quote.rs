//! Quote repository.
//!
//! Rows are converted into the domain `Quote` on the way out: line items are
//! decoded from the JSON column and money is rescaled from the storage
//! precision to cents.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use quotely_core::quote::{PreparedQuote, Quote, QuoteItem, QuoteStatus};
use quotely_core::quote::totals::round_money;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::quotes;

/// Error types for quote persistence.
#[derive(Debug, thiserror::Error)]
pub enum QuoteRepoError {
    /// Quote not found in this company.
    #[error("Quote not found: {0}")]
    NotFound(Uuid),

    /// Stored line items are not valid JSON for `QuoteItem`.
    #[error("Quote {id} has unreadable items: {source}")]
    CorruptItems {
        /// Quote ID.
        id: Uuid,
        /// Decode error.
        source: serde_json::Error,
    },

    /// Stored status is not a known value.
    #[error("Quote {id} has unknown status '{status}'")]
    UnknownStatus {
        /// Quote ID.
        id: Uuid,
        /// Raw column value.
        status: String,
    },

    /// The quote was approved after it was read; approved quotes are frozen.
    #[error("Quote {0} is approved and cannot be modified")]
    Locked(Uuid),

    /// Line items could not be encoded.
    #[error("Failed to encode quote items: {0}")]
    Encode(#[from] serde_json::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl TryFrom<quotes::Model> for Quote {
    type Error = QuoteRepoError;

    fn try_from(model: quotes::Model) -> Result<Self, Self::Error> {
        let status = QuoteStatus::parse(&model.status).ok_or_else(|| {
            QuoteRepoError::UnknownStatus {
                id: model.id,
                status: model.status.clone(),
            }
        })?;
        let items: Vec<QuoteItem> = serde_json::from_value(model.items)
            .map_err(|source| QuoteRepoError::CorruptItems { id: model.id, source })?;

        Ok(Self {
            id: model.id,
            company_id: model.company_id,
            customer_name: model.customer_name,
            customer_email: model.customer_email,
            template_name: model.template_name,
            category_name: model.category_name,
            status,
            subtotal: round_money(model.subtotal),
            tax_percentage: model.tax_percentage.normalize(),
            tax_amount: round_money(model.tax_amount),
            total: round_money(model.total),
            advance_payment: round_money(model.advance_payment),
            digital_signature: model.digital_signature,
            signed_at: model.signed_at.map(|t| t.with_timezone(&Utc)),
            items,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

/// Quote repository.
#[derive(Debug, Clone)]
pub struct QuoteRepository {
    db: Arc<DatabaseConnection>,
}

impl QuoteRepository {
    /// Creates a new quote repository.
    #[must_use]
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    /// Lists a company's quotes, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded.
    pub async fn list(&self, company_id: Uuid) -> Result<Vec<Quote>, QuoteRepoError> {
        quotes::Entity::find()
            .filter(quotes::Column::CompanyId.eq(company_id))
            .order_by_desc(quotes::Column::CreatedAt)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(Quote::try_from)
            .collect()
    }

    /// Finds a quote of a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be decoded.
    pub async fn find(&self, company_id: Uuid, id: Uuid) -> Result<Option<Quote>, QuoteRepoError> {
        quotes::Entity::find_by_id(id)
            .filter(quotes::Column::CompanyId.eq(company_id))
            .one(&*self.db)
            .await?
            .map(Quote::try_from)
            .transpose()
    }

    /// Persists a newly prepared quote.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        company_id: Uuid,
        prepared: PreparedQuote,
        now: DateTime<Utc>,
    ) -> Result<Quote, QuoteRepoError> {
        let mut row = active_model(prepared)?;
        row.id = Set(Uuid::new_v4());
        row.company_id = Set(company_id);
        row.created_at = Set(now.into());
        row.updated_at = Set(now.into());

        Quote::try_from(row.insert(&*self.db).await?)
    }

    /// Overwrites a draft's content with a prepared revision.
    ///
    /// The write only matches rows still in DRAFT, so a concurrent approval
    /// wins over a stale edit and an approval happens once.
    ///
    /// # Errors
    ///
    /// Returns `Locked` if the quote is no longer a draft and `NotFound` if
    /// it is not in the company.
    pub async fn update(
        &self,
        company_id: Uuid,
        id: Uuid,
        prepared: PreparedQuote,
        now: DateTime<Utc>,
    ) -> Result<Quote, QuoteRepoError> {
        let mut row = active_model(prepared)?;
        row.updated_at = Set(now.into());

        let updated = quotes::Entity::update_many()
            .set(row)
            .filter(quotes::Column::Id.eq(id))
            .filter(quotes::Column::CompanyId.eq(company_id))
            .filter(quotes::Column::Status.eq(QuoteStatus::Draft.as_str()))
            .exec_with_returning(&*self.db)
            .await?;

        if let Some(model) = updated.into_iter().next() {
            return Quote::try_from(model);
        }
        match self.find(company_id, id).await? {
            Some(_) => Err(QuoteRepoError::Locked(id)),
            None => Err(QuoteRepoError::NotFound(id)),
        }
    }

    /// Deletes a quote. Returns false when nothing was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete(&self, company_id: Uuid, id: Uuid) -> Result<bool, DbErr> {
        let result = quotes::Entity::delete_many()
            .filter(quotes::Column::Id.eq(id))
            .filter(quotes::Column::CompanyId.eq(company_id))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

fn active_model(prepared: PreparedQuote) -> Result<quotes::ActiveModel, QuoteRepoError> {
    Ok(quotes::ActiveModel {
        customer_name: Set(prepared.customer_name),
        customer_email: Set(prepared.customer_email),
        template_name: Set(prepared.template_name),
        category_name: Set(prepared.category_name),
        status: Set(prepared.status.as_str().to_string()),
        subtotal: Set(prepared.totals.subtotal),
        tax_percentage: Set(prepared.tax_percentage),
        tax_amount: Set(prepared.totals.tax_amount),
        total: Set(prepared.totals.total),
        advance_payment: Set(prepared.advance_payment),
        digital_signature: Set(prepared.digital_signature),
        signed_at: Set(prepared.signed_at.map(Into::into)),
        items: Set(serde_json::to_value(&prepared.items)?),
        ..Default::default()
    })
}
