//! Product variant routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::CurrentUser,
};
use quotely_db::{VariantRepository, entities::product_variants};

/// Creates the variant routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products/{id}/variants",
            get(list_variants).post(create_variant),
        )
        .route(
            "/product-variants/{id}",
            get(get_variant).patch(update_variant).delete(delete_variant),
        )
}

/// A variant as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantResponse {
    /// Variant ID.
    pub id: Uuid,
    /// Owning product.
    pub product_id: Uuid,
    /// Name, e.g. `Large`.
    pub name: String,
    /// Price of this variant.
    pub price: Decimal,
}

impl From<product_variants::Model> for VariantResponse {
    fn from(variant: product_variants::Model) -> Self {
        Self {
            id: variant.id,
            product_id: variant.product_id,
            name: variant.name,
            price: variant.price.normalize(),
        }
    }
}

/// Request body for creating a variant.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVariantRequest {
    /// Name.
    pub name: String,
    /// Price.
    pub price: Decimal,
}

/// Request body for updating a variant.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVariantRequest {
    /// Name.
    pub name: Option<String>,
    /// Price.
    pub price: Option<Decimal>,
}

fn repo(state: &AppState) -> VariantRepository {
    VariantRepository::new(state.db.clone())
}

/// GET /products/{id}/variants
async fn list_variants(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<Vec<VariantResponse>>> {
    let variants = repo(&state)
        .list_for_product(current.company_id, product_id)
        .await?;
    Ok(Json(variants.into_iter().map(VariantResponse::from).collect()))
}

/// POST /products/{id}/variants
async fn create_variant(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(product_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CreateVariantRequest>,
) -> ApiResult<(StatusCode, Json<VariantResponse>)> {
    let variant = repo(&state)
        .create(current.company_id, product_id, &payload.name, payload.price)
        .await?;

    info!(variant_id = %variant.id, product_id = %product_id, "Product variant created");
    Ok((StatusCode::CREATED, Json(variant.into())))
}

/// GET /product-variants/{id}
async fn get_variant(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<VariantResponse>> {
    repo(&state)
        .find(current.company_id, id)
        .await?
        .map(|v| Json(v.into()))
        .ok_or_else(|| ApiError::not_found("Product variant"))
}

/// PATCH /product-variants/{id}
async fn update_variant(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateVariantRequest>,
) -> ApiResult<Json<VariantResponse>> {
    let variant = repo(&state)
        .update(current.company_id, id, payload.name.as_deref(), payload.price)
        .await?;
    Ok(Json(variant.into()))
}

/// DELETE /product-variants/{id}
async fn delete_variant(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    repo(&state).delete(current.company_id, id).await?;
    info!(variant_id = %id, "Product variant deleted");
    Ok(StatusCode::NO_CONTENT)
}
