//! Customer routes.

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
    CustomerRepository,
    entities::customers,
    repositories::{CustomerInput, CustomerPatch},
};

/// Creates the customer routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer)
                .patch(update_customer)
                .delete(delete_customer),
        )
}

/// A customer as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    /// Customer ID.
    pub id: Uuid,
    /// Company ID.
    pub company_id: Uuid,
    /// Name.
    pub name: String,
    /// Email.
    pub email: String,
    /// Phone.
    pub phone: Option<String>,
}

impl From<customers::Model> for CustomerResponse {
    fn from(customer: customers::Model) -> Self {
        Self {
            id: customer.id,
            company_id: customer.company_id,
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
        }
    }
}

/// Request body for creating a customer.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    /// Name.
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub name: String,
    /// Email.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Phone.
    #[validate(length(max = 50))]
    pub phone: Option<String>,
}

/// Request body for updating a customer.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    /// Name.
    #[validate(length(min = 1, message = "Customer name must not be blank"))]
    pub name: Option<String>,
    /// Email.
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    /// Phone; `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
}

fn repo(state: &AppState) -> CustomerRepository {
    CustomerRepository::new(state.db.clone())
}

/// GET /customers
async fn list_customers(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<CustomerResponse>>> {
    let customers = repo(&state).list(current.company_id).await?;
    Ok(Json(customers.into_iter().map(CustomerResponse::from).collect()))
}

/// GET /customers/{id}
async fn get_customer(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CustomerResponse>> {
    repo(&state)
        .find(current.company_id, id)
        .await?
        .map(|c| Json(c.into()))
        .ok_or_else(|| ApiError::not_found("Customer"))
}

/// POST /customers
async fn create_customer(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateCustomerRequest>,
) -> ApiResult<(StatusCode, Json<CustomerResponse>)> {
    let customer = repo(&state)
        .create(
            current.company_id,
            CustomerInput {
                name: payload.name,
                email: payload.email,
                phone: payload.phone,
            },
        )
        .await?;

    info!(customer_id = %customer.id, company_id = %current.company_id, "Customer created");
    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// PATCH /customers/{id}
async fn update_customer(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateCustomerRequest>,
) -> ApiResult<Json<CustomerResponse>> {
    repo(&state)
        .update(
            current.company_id,
            id,
            CustomerPatch {
                name: payload.name,
                email: payload.email,
                phone: payload.phone,
            },
        )
        .await?
        .map(|c| Json(c.into()))
        .ok_or_else(|| ApiError::not_found("Customer"))
}

/// DELETE /customers/{id}
async fn delete_customer(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !repo(&state).delete(current.company_id, id).await? {
        return Err(ApiError::not_found("Customer"));
    }
    info!(customer_id = %id, "Customer deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use sea_orm::MockExecResult;
    use serde_json::json;

    use super::*;
    use crate::routes::test_support::{authed, authed_db, body_json, get, json_request, send, user};

    #[tokio::test]
    async fn test_create_validates_email() {
        let me = user(Uuid::new_v4(), "USER");
        let response = send(
            authed_db(&me).into_connection(),
            json_request("POST", "/api/customers", &json!({ "name": "Acme", "email": "nope" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_list_customers() {
        let company = Uuid::new_v4();
        let me = user(company, "USER");
        let db = authed_db(&me)
            .append_query_results([vec![customers::Model {
                id: Uuid::new_v4(),
                company_id: company,
                name: "Globex".to_string(),
                email: "buyer@globex.test".to_string(),
                phone: None,
            }]])
            .into_connection();

        let response = send(db, get("/api/customers")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["name"], "Globex");
        assert!(body[0]["phone"].is_null());
    }

    #[tokio::test]
    async fn test_delete_missing_is_404() {
        let me = user(Uuid::new_v4(), "USER");
        let db = authed_db(&me)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let response = send(
            db,
            authed(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/customers/{}", Uuid::new_v4())),
            )
            .body(Body::empty())
            .expect("request"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
