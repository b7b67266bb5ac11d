use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{Router, extract::State, http::HeaderMap, http::StatusCode, routing::post};
use serde_json::json;

use super::*;

const SECRET: &str = "test-secret";

/// Receiver that fails the first `fail_first` requests with 500 and checks signatures.
async fn spawn_receiver(fail_first: usize) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));

    async fn receive(
        State((hits, fail_first)): State<(Arc<AtomicUsize>, usize)>,
        headers: HeaderMap,
        body: axum::body::Bytes,
    ) -> StatusCode {
        let n = hits.fetch_add(1, Ordering::SeqCst);
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !verify_signature(SECRET, &body, signature) {
            return StatusCode::UNAUTHORIZED;
        }
        if n < fail_first {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        }
    }

    let app = Router::new()
        .route("/hook", post(receive))
        .with_state((hits.clone(), fail_first));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/hook"), hits)
}

fn client(endpoint: Option<String>) -> WebhookClient {
    let config = WebhookConfig {
        endpoint,
        secret: SECRET.to_string(),
        ..WebhookConfig::default()
    };
    WebhookClient::new(config)
        .unwrap()
        .with_min_delay(Duration::from_millis(10))
}

#[test]
fn test_sign_payload_known_vector() {
    // RFC 4231 test case 2
    let sig = sign_payload("Jefe", b"what do ya want for nothing?").unwrap();
    assert_eq!(
        sig,
        "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
    );
}

#[test]
fn test_verify_signature() {
    let body = br#"{"id":"1","total":"110.00"}"#;
    let sig = sign_payload(SECRET, body).unwrap();

    assert!(verify_signature(SECRET, body, &sig));
    assert!(verify_signature(SECRET, body, &sig.to_uppercase()));
    assert!(!verify_signature("other-secret", body, &sig));
    assert!(!verify_signature(SECRET, b"tampered", &sig));
    assert!(!verify_signature(SECRET, body, ""));
}

#[tokio::test]
async fn test_deliver_disabled_without_endpoint() {
    let client = client(None);
    assert!(!client.is_enabled());

    let result = client.deliver(&json!({"id": 1})).await;
    assert!(matches!(result, Err(WebhookError::Disabled)));
}

#[tokio::test]
async fn test_deliver_first_attempt() {
    let (endpoint, hits) = spawn_receiver(0).await;
    let delivery = client(Some(endpoint))
        .deliver(&json!({"id": 1}))
        .await
        .unwrap();

    assert_eq!(delivery.status, 200);
    assert_eq!(delivery.attempts, 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_deliver_retries_until_success() {
    let (endpoint, hits) = spawn_receiver(2).await;
    let delivery = client(Some(endpoint))
        .deliver(&json!({"id": 1}))
        .await
        .unwrap();

    assert_eq!(delivery.attempts, 3);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_deliver_gives_up_after_max_attempts() {
    let (endpoint, hits) = spawn_receiver(10).await;
    let result = client(Some(endpoint)).deliver(&json!({"id": 1})).await;

    assert!(matches!(result, Err(WebhookError::Status(500))));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}
