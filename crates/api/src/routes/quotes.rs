//! Quote routes.
//!
//! Pricing, totals and the status workflow live in `QuoteService`; these
//! handlers load the company catalog, persist the prepared result and fire
//! notifications once the write has succeeded.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::CurrentUser,
    notify,
};
use quotely_core::quote::{
    Letterhead, LineInput, PricedProduct, Quote, QuoteDocument, QuoteDraft, QuotePatch,
    QuoteService, QuoteStatus, Transition,
};
use quotely_db::{CompanyRepository, ProductRepository, QuoteRepository, TemplateRepository};

/// Creates the quote routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quotes", get(list_quotes).post(create_quote))
        .route(
            "/quotes/{id}",
            get(get_quote).patch(update_quote).delete(delete_quote),
        )
        .route("/quotes/{id}/document", get(quote_document))
}

/// Request body for creating a quote. Totals are always computed here, so
/// any totals the client sends are ignored.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuoteRequest {
    /// Customer display name.
    pub customer_name: String,
    /// Customer email.
    pub customer_email: String,
    /// Terms template name.
    pub template_name: Option<String>,
    /// Category name.
    pub category_name: Option<String>,
    /// Tax rate in percent.
    #[serde(default)]
    pub tax_percentage: Decimal,
    /// Amount already paid.
    #[serde(default)]
    pub advance_payment: Decimal,
    /// Requested lines.
    pub items: Vec<LineInput>,
    /// Initial status.
    #[serde(default)]
    pub status: QuoteStatus,
    /// Signature, required when creating an approved quote.
    pub digital_signature: Option<String>,
}

impl From<CreateQuoteRequest> for QuoteDraft {
    fn from(request: CreateQuoteRequest) -> Self {
        Self {
            customer_name: request.customer_name,
            customer_email: request.customer_email,
            template_name: request.template_name,
            category_name: request.category_name,
            tax_percentage: request.tax_percentage,
            advance_payment: request.advance_payment,
            lines: request.items,
            status: request.status,
            digital_signature: request.digital_signature,
        }
    }
}

/// Request body for updating a quote. Absent fields are left unchanged.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuoteRequest {
    /// Customer display name.
    pub customer_name: Option<String>,
    /// Customer email.
    pub customer_email: Option<String>,
    /// Terms template name; empty clears it.
    pub template_name: Option<String>,
    /// Category name; empty clears it.
    pub category_name: Option<String>,
    /// Tax rate in percent.
    pub tax_percentage: Option<Decimal>,
    /// Amount already paid.
    pub advance_payment: Option<Decimal>,
    /// Replacement lines, repriced from the catalog.
    pub items: Option<Vec<LineInput>>,
    /// Target status.
    pub status: Option<QuoteStatus>,
    /// Signature.
    pub digital_signature: Option<String>,
}

impl From<UpdateQuoteRequest> for QuotePatch {
    fn from(request: UpdateQuoteRequest) -> Self {
        Self {
            customer_name: request.customer_name,
            customer_email: request.customer_email,
            template_name: request.template_name,
            category_name: request.category_name,
            tax_percentage: request.tax_percentage,
            advance_payment: request.advance_payment,
            lines: request.items,
            status: request.status,
            digital_signature: request.digital_signature,
        }
    }
}

fn repo(state: &AppState) -> QuoteRepository {
    QuoteRepository::new(state.db.clone())
}

/// Loads the company's products referenced by `lines`.
async fn catalog_for(
    state: &AppState,
    company_id: Uuid,
    lines: &[LineInput],
) -> ApiResult<Vec<PricedProduct>> {
    let mut ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
    ids.sort_unstable();
    ids.dedup();
    Ok(ProductRepository::new(state.db.clone())
        .priced(company_id, &ids)
        .await?)
}

/// Prices, stores and announces a new quote for `company_id`.
pub(crate) async fn create_for_company(
    state: &AppState,
    company_id: Uuid,
    request: CreateQuoteRequest,
) -> ApiResult<Quote> {
    let catalog = catalog_for(state, company_id, &request.items).await?;
    let now = Utc::now();
    let prepared = QuoteService::prepare(request.into(), &catalog, now)?;
    let approved = prepared.status == QuoteStatus::Approved;

    let quote = repo(state).create(company_id, prepared, now).await?;
    info!(
        quote_id = %quote.id,
        company_id = %company_id,
        total = %quote.total,
        status = %quote.status,
        "Quote created"
    );

    notify::quote_created(state, &quote);
    if approved {
        notify::quote_approved(state, &quote);
    }
    Ok(quote)
}

/// GET /quotes - Newest first.
async fn list_quotes(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<Quote>>> {
    Ok(Json(repo(&state).list(current.company_id).await?))
}

/// GET /quotes/{id}
async fn get_quote(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Quote>> {
    repo(&state)
        .find(current.company_id, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Quote"))
}

/// POST /quotes
async fn create_quote(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateQuoteRequest>,
) -> ApiResult<(StatusCode, Json<Quote>)> {
    let quote = create_for_company(&state, current.company_id, payload).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// PATCH /quotes/{id} - Approved quotes are locked (422).
async fn update_quote(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateQuoteRequest>,
) -> ApiResult<Json<Quote>> {
    let repo = repo(&state);
    let existing = repo
        .find(current.company_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Quote"))?;

    let patch = QuotePatch::from(payload);
    let catalog = match &patch.lines {
        Some(lines) => catalog_for(&state, current.company_id, lines).await?,
        None => Vec::new(),
    };
    let now = Utc::now();
    let (prepared, transition) = QuoteService::apply_patch(&existing, patch, &catalog, now)?;
    let quote = repo.update(current.company_id, id, prepared, now).await?;

    info!(quote_id = %id, status = %quote.status, "Quote updated");
    if transition == Transition::Approve {
        info!(quote_id = %id, user_id = %current.id, "Quote approved");
        notify::quote_approved(&state, &quote);
    }
    Ok(Json(quote))
}

/// DELETE /quotes/{id} - Allowed in any status.
async fn delete_quote(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !repo(&state).delete(current.company_id, id).await? {
        return Err(ApiError::not_found("Quote"));
    }
    info!(quote_id = %id, "Quote deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /quotes/{id}/document - Everything the client needs to render the PDF.
async fn quote_document(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<QuoteDocument>> {
    let quote = repo(&state)
        .find(current.company_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Quote"))?;
    let company = CompanyRepository::new(state.db.clone())
        .find_by_id(current.company_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Company"))?;
    let terms = TemplateRepository::new(state.db.clone())
        .terms(current.company_id)
        .await?;

    let letterhead = Letterhead {
        company_name: company.name,
        logo_url: company.logo_url,
    };
    Ok(Json(QuoteDocument::assemble(letterhead, quote, &terms)))
}
