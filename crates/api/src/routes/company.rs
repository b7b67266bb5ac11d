//! Company settings: name and logo.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    multipart::FormData,
};
use quotely_core::storage::{Upload, UploadKind};
use quotely_db::{CompanyRepository, entities::companies};

/// Creates the company routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/company/settings",
        get(get_settings).put(update_settings),
    )
}

/// A company as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyResponse {
    /// Company ID.
    pub id: Uuid,
    /// Unique name.
    pub name: String,
    /// Public logo URL.
    pub logo_url: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<companies::Model> for CompanyResponse {
    fn from(company: companies::Model) -> Self {
        Self {
            id: company.id,
            name: company.name,
            logo_url: company.logo_url,
            created_at: company.created_at.with_timezone(&Utc),
        }
    }
}

/// GET /company/settings - The caller's company.
async fn get_settings(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<CompanyResponse>> {
    let company = CompanyRepository::new(state.db.clone())
        .find_by_id(current.company_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Company"))?;
    Ok(Json(company.into()))
}

/// PUT /company/settings - Rename the company and optionally replace its
/// logo (multipart: `name`, `logo`).
async fn update_settings(
    State(state): State<AppState>,
    current: CurrentUser,
    multipart: Multipart,
) -> ApiResult<Json<CompanyResponse>> {
    current.require_settings_admin()?;

    let mut form = FormData::read(multipart).await?;
    let name = form.required("name")?.to_string();

    let repo = CompanyRepository::new(state.db.clone());
    let previous = repo
        .find_by_id(current.company_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Company"))?;

    let new_logo = match form.take_files("logo").into_iter().next() {
        Some(file) => {
            let stored = state
                .storage()?
                .upload(Upload {
                    company_id: current.company_id,
                    kind: UploadKind::Logo,
                    filename: file.filename,
                    content_type: file.content_type,
                    data: file.data,
                })
                .await?;
            Some(stored.url)
        }
        None => None,
    };

    let company = match repo
        .update_settings(current.company_id, &name, new_logo.clone())
        .await
    {
        Ok(company) => company,
        Err(e) => {
            if let Some(url) = &new_logo {
                discard_logo(&state, url).await;
            }
            return Err(e.into());
        }
    };

    if new_logo.is_some() && previous.logo_url != company.logo_url {
        discard_logo(&state, &previous.logo_url).await;
    }

    info!(company_id = %company.id, logo_replaced = new_logo.is_some(), "Company settings updated");
    Ok(Json(company.into()))
}

/// Deletes a logo from storage. URLs outside the bucket, such as the
/// default logo, are left alone.
async fn discard_logo(state: &AppState, url: &str) {
    let Some(storage) = state.storage.as_ref() else {
        return;
    };
    if let Err(e) = storage.delete_url(url).await {
        warn!(url = %url, error = %e, "Failed to delete logo");
    }
}
