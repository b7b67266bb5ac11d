//! Inbound webhook: lets an external system create quotes.
//!
//! The caller is authenticated by the `X-Webhook-Signature` header rather
//! than a session, so the target company travels in the body.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::quotes::{CreateQuoteRequest, create_for_company};
use crate::AppState;
use quotely_core::quote::Quote;
use quotely_db::CompanyRepository;
use quotely_shared::webhook::{SIGNATURE_HEADER, verify_signature};

/// Creates the inbound webhook routes (public; signature checked per request).
pub fn routes() -> Router<AppState> {
    Router::new().route("/webhook/new-quote", post(receive_quote))
}

/// Body of an inbound quote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundQuote {
    /// Company the quote belongs to.
    pub company_id: Uuid,
    /// The quote itself.
    #[serde(flatten)]
    pub quote: CreateQuoteRequest,
}

/// Reply sent to the webhook caller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookReply {
    /// Whether the quote was created.
    pub success: bool,
    /// Correlation id, also logged.
    pub request_id: Uuid,
    /// Human-readable outcome.
    pub message: String,
    /// The created quote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<Quote>,
    /// Validation problems.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Unexpected failure detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookReply {
    fn failure(request_id: Uuid, message: &str) -> Self {
        Self {
            success: false,
            request_id,
            message: message.to_string(),
            quote: None,
            errors: Vec::new(),
            error: None,
        }
    }

    fn created(request_id: Uuid, quote: Quote) -> Self {
        Self {
            success: true,
            request_id,
            message: "Quote created".to_string(),
            quote: Some(quote),
            errors: Vec::new(),
            error: None,
        }
    }

    fn invalid(request_id: Uuid, problem: String) -> (StatusCode, Json<Self>) {
        let mut reply = Self::failure(request_id, "Invalid quote data");
        reply.errors.push(problem);
        (StatusCode::BAD_REQUEST, Json(reply))
    }
}

/// POST /webhook/new-quote
async fn receive_quote(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<WebhookReply>) {
    let request_id = Uuid::new_v4();
    info!(request_id = %request_id, bytes = body.len(), "Inbound quote webhook");

    let signed = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|sig| verify_signature(state.webhook.secret(), &body, sig));
    if !signed {
        warn!(request_id = %request_id, "Rejected webhook with invalid signature");
        return (
            StatusCode::UNAUTHORIZED,
            Json(WebhookReply::failure(request_id, "Invalid webhook signature")),
        );
    }

    let inbound: InboundQuote = match serde_json::from_slice(&body) {
        Ok(inbound) => inbound,
        Err(e) => return WebhookReply::invalid(request_id, e.to_string()),
    };

    match CompanyRepository::new(state.db.clone())
        .find_by_id(inbound.company_id)
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => {
            return WebhookReply::invalid(
                request_id,
                format!("Company {} not found", inbound.company_id),
            );
        }
        Err(e) => return internal_failure(request_id, &e.to_string()),
    }

    match create_for_company(&state, inbound.company_id, inbound.quote).await {
        Ok(quote) => {
            info!(request_id = %request_id, quote_id = %quote.id, "Quote created from webhook");
            (StatusCode::CREATED, Json(WebhookReply::created(request_id, quote)))
        }
        Err(e) if e.status().is_client_error() => {
            WebhookReply::invalid(request_id, e.0.public_message())
        }
        Err(e) => internal_failure(request_id, &e.to_string()),
    }
}

fn internal_failure(request_id: Uuid, detail: &str) -> (StatusCode, Json<WebhookReply>) {
    error!(request_id = %request_id, error = %detail, "Webhook processing failed");
    let mut reply = WebhookReply::failure(request_id, "Failed to process webhook");
    reply.error = Some("Internal server error".to_string());
    (StatusCode::INTERNAL_SERVER_ERROR, Json(reply))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    use super::*;
    use crate::routes::test_support::{body_json, send};
    use quotely_db::entities::{companies, products, quotes};
    use quotely_shared::webhook::sign_payload;

    fn request(body: &str, signature: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/webhook/new-quote")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(sig) = signature {
            builder = builder.header(SIGNATURE_HEADER, sig);
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    fn signed(body: &str) -> Request<Body> {
        let signature = sign_payload("default-secret", body.as_bytes()).expect("signature");
        request(body, Some(&signature))
    }

    #[tokio::test]
    async fn test_missing_signature_is_401() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let response = send(db, request("{}", None)).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid webhook signature");
    }

    #[tokio::test]
    async fn test_wrong_signature_is_401() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let response = send(db, request("{}", Some("deadbeef"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let response = send(db, signed(r#"{"customerName":"Globex"}"#)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid quote data");
        assert!(body["requestId"].is_string());
        assert_eq!(body["errors"].as_array().map(Vec::len), Some(1));
    }

    fn acme(id: Uuid) -> companies::Model {
        companies::Model {
            id,
            name: "Acme".to_string(),
            logo_url: "https://cdn.test/acme.png".to_string(),
            created_at: chrono::Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_signed_quote_is_created() {
        let company = Uuid::new_v4();
        let product = Uuid::from_u128(7);
        let now = chrono::Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![acme(company)]])
            .append_query_results([vec![products::Model {
                id: product,
                company_id: company,
                name: "Chair".to_string(),
                description: None,
                price: dec!(25.0000),
                unit: "piece".to_string(),
                category_name: None,
                image_urls: json!([]),
            }]])
            .append_query_results([vec![quotes::Model {
                id: Uuid::new_v4(),
                company_id: company,
                customer_name: "Globex".to_string(),
                customer_email: "buyer@globex.test".to_string(),
                template_name: None,
                category_name: None,
                status: "DRAFT".to_string(),
                subtotal: dec!(50.0000),
                tax_percentage: dec!(10.0000),
                tax_amount: dec!(5.0000),
                total: dec!(55.0000),
                advance_payment: dec!(0.0000),
                digital_signature: None,
                signed_at: None,
                items: json!([{
                    "productId": product,
                    "productName": "Chair",
                    "quantity": 2,
                    "unitPrice": "25.00",
                    "subtotal": "50.00"
                }]),
                created_at: now.into(),
                updated_at: now.into(),
            }]])
            .into_connection();
        let body = json!({
            "companyId": company,
            "customerName": "Globex",
            "customerEmail": "buyer@globex.test",
            "taxPercentage": "10",
            "items": [{ "productId": product, "quantity": 2 }]
        })
        .to_string();

        let response = send(db, signed(&body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let reply = body_json(response).await;
        assert_eq!(reply["success"], true);
        assert!(reply["requestId"].is_string());
        assert_eq!(reply["message"], "Quote created");
        assert_eq!(reply["quote"]["total"], "55.00");
        assert_eq!(reply["quote"]["companyId"], company.to_string());
        assert!(reply.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_invalid_quote_is_400() {
        let company = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![acme(company)]])
            .into_connection();
        let body = json!({
            "companyId": company,
            "customerName": "Globex",
            "customerEmail": "buyer@globex.test",
            "items": []
        })
        .to_string();

        let response = send(db, signed(&body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["errors"][0],
            "Quote must have at least one item"
        );
    }
}
