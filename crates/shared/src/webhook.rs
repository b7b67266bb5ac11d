//! Signed webhook delivery.
//!
//! Events are POSTed as JSON with an `X-Webhook-Signature` header holding the
//! hex HMAC-SHA256 of the exact body bytes. Failed deliveries (network errors
//! and non-2xx responses) are retried with exponential backoff: with the
//! default config that is 3 attempts, sleeping 2s then 4s.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::WebhookConfig;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Webhook delivery errors.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// No endpoint configured.
    #[error("webhook delivery is disabled")]
    Disabled,
    /// Payload could not be serialized.
    #[error("failed to serialize webhook payload: {0}")]
    Serialize(#[from] serde_json::Error),
    /// HMAC key could not be initialised.
    #[error("failed to sign webhook payload")]
    Signing,
    /// Network or protocol failure.
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Receiver answered with a non-success status.
    #[error("webhook failed with status: {0}")]
    Status(u16),
}

/// Computes the hex HMAC-SHA256 of `body` under `secret`.
pub fn sign_payload(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Checks a received signature against `body` in constant time.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Some(expected) = sign_payload(secret, body) else {
        return false;
    };
    let received = signature.trim().to_ascii_lowercase();
    bool::from(expected.as_bytes().ct_eq(received.as_bytes()))
}

/// Outcome of a successful delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// HTTP status returned by the receiver.
    pub status: u16,
    /// Attempts used, first try included.
    pub attempts: usize,
}

/// Client that signs and delivers webhook events.
#[derive(Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
    config: Arc<WebhookConfig>,
    min_delay: Duration,
}

impl WebhookClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: WebhookConfig) -> Result<Self, WebhookError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("quotely/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            min_delay: Duration::from_secs(config.min_delay_secs),
            config: Arc::new(config),
        })
    }

    /// Overrides the first retry delay.
    #[must_use]
    pub const fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    /// True when an endpoint is configured.
    pub fn is_enabled(&self) -> bool {
        self.config.endpoint.is_some()
    }

    /// Shared secret used for signing and verification.
    pub fn secret(&self) -> &str {
        &self.config.secret
    }

    fn retry_policy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_times(self.config.max_attempts.saturating_sub(1))
    }

    /// Serializes, signs and delivers `event`, retrying on failure.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Disabled` when no endpoint is configured,
    /// otherwise the error of the final attempt.
    pub async fn deliver<T: Serialize + Sync>(&self, event: &T) -> Result<Delivery, WebhookError> {
        let endpoint = self.config.endpoint.as_deref().ok_or(WebhookError::Disabled)?;
        let body = serde_json::to_vec(event)?;
        let signature = sign_payload(&self.config.secret, &body).ok_or(WebhookError::Signing)?;
        let attempts = AtomicUsize::new(0);

        let status = (|| async {
            attempts.fetch_add(1, Ordering::Relaxed);
            self.post_once(endpoint, &signature, body.clone()).await
        })
        .retry(self.retry_policy())
        .when(|e: &WebhookError| matches!(e, WebhookError::Request(_) | WebhookError::Status(_)))
        .notify(|err, dur: Duration| {
            warn!(error = %err, delay = ?dur, "Webhook delivery failed, retrying");
        })
        .await?;

        let delivery = Delivery {
            status,
            attempts: attempts.load(Ordering::Relaxed),
        };
        info!(status = delivery.status, attempts = delivery.attempts, "Webhook delivered");
        Ok(delivery)
    }

    async fn post_once(
        &self,
        endpoint: &str,
        signature: &str,
        body: Vec<u8>,
    ) -> Result<u16, WebhookError> {
        debug!(endpoint, "Posting webhook");
        let response = self
            .http
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            Err(WebhookError::Status(status.as_u16()))
        }
    }
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod webhook_tests;
