//! Quote template routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::{ValidatedJson, nullable},
    middleware::CurrentUser,
};
use quotely_db::{
    TemplateRepository,
    entities::quote_templates,
    repositories::{TemplateInput, TemplatePatch},
};

/// Creates the template routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/templates", get(list_templates).post(create_template))
        .route("/templates/category/{id}", get(list_by_category))
        .route(
            "/templates/{id}",
            get(get_template)
                .patch(update_template)
                .delete(delete_template),
        )
}

/// A template as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    /// Template ID.
    pub id: Uuid,
    /// Company ID.
    pub company_id: Uuid,
    /// Name; quotes refer to templates by it.
    pub name: String,
    /// Category the template applies to.
    pub category_id: Option<Uuid>,
    /// Terms text.
    pub content: String,
}

impl From<quote_templates::Model> for TemplateResponse {
    fn from(template: quote_templates::Model) -> Self {
        Self {
            id: template.id,
            company_id: template.company_id,
            name: template.name,
            category_id: template.category_id,
            content: template.content,
        }
    }
}

/// Request body for creating a template.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    /// Name.
    pub name: String,
    /// Category.
    pub category_id: Option<Uuid>,
    /// Terms text.
    pub content: String,
}

/// Request body for updating a template.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateRequest {
    /// Name.
    pub name: Option<String>,
    /// Category; `null` detaches it.
    #[serde(default, deserialize_with = "nullable")]
    pub category_id: Option<Option<Uuid>>,
    /// Terms text.
    pub content: Option<String>,
}

fn repo(state: &AppState) -> TemplateRepository {
    TemplateRepository::new(state.db.clone())
}

fn to_responses(templates: Vec<quote_templates::Model>) -> Json<Vec<TemplateResponse>> {
    Json(templates.into_iter().map(TemplateResponse::from).collect())
}

/// GET /templates
async fn list_templates(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<TemplateResponse>>> {
    Ok(to_responses(repo(&state).list(current.company_id).await?))
}

/// GET /templates/category/{id}
async fn list_by_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(category_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TemplateResponse>>> {
    Ok(to_responses(
        repo(&state)
            .list_by_category(current.company_id, category_id)
            .await?,
    ))
}

/// GET /templates/{id}
async fn get_template(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TemplateResponse>> {
    repo(&state)
        .find(current.company_id, id)
        .await?
        .map(|t| Json(t.into()))
        .ok_or_else(|| ApiError::not_found("Template"))
}

/// POST /templates
async fn create_template(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateTemplateRequest>,
) -> ApiResult<(StatusCode, Json<TemplateResponse>)> {
    let template = repo(&state)
        .create(
            current.company_id,
            TemplateInput {
                name: payload.name,
                category_id: payload.category_id,
                content: payload.content,
            },
        )
        .await?;

    info!(template_id = %template.id, company_id = %current.company_id, "Template created");
    Ok((StatusCode::CREATED, Json(template.into())))
}

/// PATCH /templates/{id}
async fn update_template(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateTemplateRequest>,
) -> ApiResult<Json<TemplateResponse>> {
    let template = repo(&state)
        .update(
            current.company_id,
            id,
            TemplatePatch {
                name: payload.name,
                category_id: payload.category_id,
                content: payload.content,
            },
        )
        .await?;
    Ok(Json(template.into()))
}

/// DELETE /templates/{id}
async fn delete_template(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !repo(&state).delete(current.company_id, id).await? {
        return Err(ApiError::not_found("Template"));
    }
    info!(template_id = %id, "Template deleted");
    Ok(StatusCode::NO_CONTENT)
}
