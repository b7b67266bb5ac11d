//! Product routes. Create and update take multipart forms so images can be
//! uploaded alongside the fields.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::get,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    multipart::{FilePart, FormData},
};
use quotely_core::catalog::{ProductFields, merge_image_urls};
use quotely_core::storage::{Upload, UploadKind};
use quotely_db::{ProductRepository, entities::products, repositories::image_urls};

/// Creates the product routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
}

/// A product as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    /// Product ID.
    pub id: Uuid,
    /// Company ID.
    pub company_id: Uuid,
    /// Name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Catalog price.
    pub price: Decimal,
    /// Unit of sale, e.g. `piece`.
    pub unit: String,
    /// Category name.
    pub category_name: Option<String>,
    /// Public image URLs.
    pub image_urls: Vec<String>,
}

impl From<products::Model> for ProductResponse {
    fn from(product: products::Model) -> Self {
        Self {
            image_urls: image_urls(&product),
            id: product.id,
            company_id: product.company_id,
            name: product.name,
            description: product.description,
            price: product.price.normalize(),
            unit: product.unit,
            category_name: product.category_name,
        }
    }
}

fn parse_price(raw: &str) -> ApiResult<Decimal> {
    Decimal::from_str(raw).map_err(|_| ApiError::validation(format!("Invalid price: {raw}")))
}

/// Uploads product images, removing the ones already stored if a later one
/// fails.
async fn store_images(
    state: &AppState,
    company_id: Uuid,
    files: Vec<FilePart>,
) -> ApiResult<Vec<String>> {
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let storage = state.storage()?;
    let mut urls = Vec::with_capacity(files.len());
    for file in files {
        let upload = Upload {
            company_id,
            kind: UploadKind::ProductImage,
            filename: file.filename,
            content_type: file.content_type,
            data: file.data,
        };
        match storage.upload(upload).await {
            Ok(stored) => urls.push(stored.url),
            Err(e) => {
                discard_images(state, &urls).await;
                return Err(e.into());
            }
        }
    }
    Ok(urls)
}

/// Deletes images from storage, logging failures.
async fn discard_images(state: &AppState, urls: &[String]) {
    let Some(storage) = state.storage.as_ref() else {
        return;
    };
    for url in urls {
        if let Err(e) = storage.delete_url(url).await {
            warn!(url = %url, error = %e, "Failed to delete product image");
        }
    }
}

/// GET /products
async fn list_products(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<ProductResponse>>> {
    let products = ProductRepository::new(state.db.clone())
        .list(current.company_id)
        .await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// GET /products/{id}
async fn get_product(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProductResponse>> {
    ProductRepository::new(state.db.clone())
        .find(current.company_id, id)
        .await?
        .map(|p| Json(p.into()))
        .ok_or_else(|| ApiError::not_found("Product"))
}

/// POST /products - Multipart: `name`, `description`, `price`, `unit`,
/// `categoryName` and any number of `images` files.
async fn create_product(
    State(state): State<AppState>,
    current: CurrentUser,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    let mut form = FormData::read(multipart).await?;
    let fields = ProductFields::new(
        form.required("name")?,
        form.text("description").map(str::to_string),
        parse_price(form.required("price")?)?,
        form.required("unit")?,
        form.text("categoryName").map(str::to_string),
    )?;

    let uploaded = store_images(&state, current.company_id, form.take_files("images")).await?;
    let product = match ProductRepository::new(state.db.clone())
        .create(current.company_id, fields, uploaded.clone())
        .await
    {
        Ok(product) => product,
        Err(e) => {
            discard_images(&state, &uploaded).await;
            return Err(e.into());
        }
    };

    info!(product_id = %product.id, images = uploaded.len(), "Product created");
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PATCH /products/{id} - Multipart. Absent fields keep their value;
/// `imageUrls` (JSON array) lists the existing images to keep and new
/// `images` files are appended.
async fn update_product(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<ProductResponse>> {
    let mut form = FormData::read(multipart).await?;
    let repo = ProductRepository::new(state.db.clone());
    let existing = repo
        .find(current.company_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;
    let previous_images = image_urls(&existing);

    let price = match form.text("price").filter(|p| !p.is_empty()) {
        Some(raw) => parse_price(raw)?,
        None => existing.price,
    };
    let description = match form.text("description") {
        Some(d) => Some(d.to_string()),
        None => existing.description.clone(),
    };
    let category_name = match form.text("categoryName") {
        Some(c) => Some(c.to_string()),
        None => existing.category_name.clone(),
    };
    let fields = ProductFields::new(
        form.text("name").unwrap_or(existing.name.as_str()),
        description,
        price,
        form.text("unit").unwrap_or(existing.unit.as_str()),
        category_name,
    )?;
    // Only images the product already has can be kept.
    let kept: Vec<String> = match form.json::<Vec<String>>("imageUrls")? {
        Some(urls) => urls
            .into_iter()
            .filter(|url| previous_images.contains(url))
            .collect(),
        None => previous_images.clone(),
    };

    let uploaded = store_images(&state, current.company_id, form.take_files("images")).await?;
    let images = merge_image_urls(kept, uploaded.clone());

    let product = match repo.update(current.company_id, id, fields, images.clone()).await {
        Ok(product) => product,
        Err(e) => {
            discard_images(&state, &uploaded).await;
            return Err(e.into());
        }
    };

    let removed: Vec<String> = previous_images
        .into_iter()
        .filter(|url| !images.contains(url))
        .collect();
    discard_images(&state, &removed).await;

    info!(
        product_id = %id,
        added = uploaded.len(),
        removed = removed.len(),
        "Product updated"
    );
    Ok(Json(product.into()))
}

/// DELETE /products/{id} - Removes the product, its variants and its images.
async fn delete_product(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = ProductRepository::new(state.db.clone())
        .delete(current.company_id, id)
        .await?;
    discard_images(&state, &image_urls(&deleted)).await;

    info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
