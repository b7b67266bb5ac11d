//! Category routes, including tree and children lookups.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::{ValidatedJson, nullable},
    middleware::CurrentUser,
};
use quotely_core::catalog::{CategoryNode, CategoryRecord, build_tree};
use quotely_db::{
    CategoryRepository,
    repositories::{CategoryInput, CategoryPatch},
};

/// Creates the category routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/tree", get(category_tree))
        .route("/categories/name/{name}", get(get_category_by_name))
        .route(
            "/categories/{id}",
            get(get_category)
                .patch(update_category)
                .delete(delete_category),
        )
        .route("/categories/{id}/children", get(list_children))
}

/// Request body for creating a category.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    /// Name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Parent category in the same company.
    pub parent_id: Option<Uuid>,
}

/// Request body for updating a category. `null` clears a nullable field.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    /// Name.
    pub name: Option<String>,
    /// Description.
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    /// Parent category; `null` makes it a root.
    #[serde(default, deserialize_with = "nullable")]
    pub parent_id: Option<Option<Uuid>>,
}

fn repo(state: &AppState) -> CategoryRepository {
    CategoryRepository::new(state.db.clone())
}

/// GET /categories - Flat list of the company's categories.
async fn list_categories(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<CategoryRecord>>> {
    Ok(Json(repo(&state).list(current.company_id).await?))
}

/// GET /categories/tree - Categories nested under their parents.
async fn category_tree(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<CategoryNode>>> {
    let all = repo(&state).list(current.company_id).await?;
    Ok(Json(build_tree(&all)))
}

/// GET /categories/{id}
async fn get_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CategoryRecord>> {
    repo(&state)
        .find(current.company_id, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category"))
}

/// GET /categories/name/{name}
async fn get_category_by_name(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(name): Path<String>,
) -> ApiResult<Json<CategoryRecord>> {
    repo(&state)
        .find_by_name(current.company_id, &name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category"))
}

/// GET /categories/{id}/children - Direct subcategories.
async fn list_children(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<CategoryRecord>>> {
    Ok(Json(repo(&state).children(current.company_id, id).await?))
}

/// POST /categories
async fn create_category(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<CategoryRecord>)> {
    let category = repo(&state)
        .create(
            current.company_id,
            CategoryInput {
                name: payload.name,
                description: payload.description,
                parent_id: payload.parent_id,
            },
        )
        .await?;

    info!(category_id = %category.id, company_id = %current.company_id, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// PATCH /categories/{id}
async fn update_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateCategoryRequest>,
) -> ApiResult<Json<CategoryRecord>> {
    let category = repo(&state)
        .update(
            current.company_id,
            id,
            CategoryPatch {
                name: payload.name,
                description: payload.description,
                parent_id: payload.parent_id,
            },
        )
        .await?;

    info!(category_id = %id, "Category updated");
    Ok(Json(category))
}

/// DELETE /categories/{id} - 409 while it has subcategories or templates.
async fn delete_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    repo(&state).delete(current.company_id, id).await?;
    info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use axum::{body::Body, http::Request};
    use sea_orm::Value;

    use super::*;
    use crate::routes::test_support::{authed, authed_db, body_json, get, send, user};
    use quotely_db::entities::categories;

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
    async fn test_tree_nests_children() {
        let company = Uuid::new_v4();
        let me = user(company, "USER");
        let db = authed_db(&me)
            .append_query_results([vec![
                row(company, 1, "Hardware", None),
                row(company, 2, "Tools", Some(1)),
                row(company, 3, "Garden", None),
            ]])
            .into_connection();

        let response = send(db, get("/api/categories/tree")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let roots = body.as_array().expect("array");
        assert_eq!(roots.len(), 2);
        let hardware = roots
            .iter()
            .find(|n| n["name"] == "Hardware")
            .expect("hardware root");
        assert_eq!(hardware["children"][0]["name"], "Tools");
        assert_eq!(hardware["children"][0]["parentId"], Uuid::from_u128(1).to_string());
    }

    #[tokio::test]
    async fn test_missing_category_is_404() {
        let me = user(Uuid::new_v4(), "USER");
        let db = authed_db(&me)
            .append_query_results([Vec::<categories::Model>::new()])
            .into_connection();

        let response = send(db, get(&format!("/api/categories/{}", Uuid::new_v4()))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_with_templates_conflicts() {
        let company = Uuid::new_v4();
        let me = user(company, "USER");
        let count: BTreeMap<&str, Value> = [("num_items", Value::BigInt(Some(2)))].into();
        let db = authed_db(&me)
            .append_query_results([vec![row(company, 1, "Hardware", None)]])
            .append_query_results([vec![count]])
            .into_connection();

        let response = send(
            db,
            authed(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/categories/{}", Uuid::from_u128(1))),
            )
            .body(Body::empty())
            .expect("request"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["error"], "conflict");
    }
}
