//! Fire-and-forget quote notifications.
//!
//! Delivery runs on a spawned task so the request never waits on SMTP or
//! the webhook receiver, and a failed delivery is only logged.

use tracing::{debug, info, warn};

use crate::AppState;
use quotely_core::quote::{Quote, QuoteEvent, approval_email};
use quotely_shared::WebhookError;

/// Announces a newly created quote to the webhook receiver.
pub fn quote_created(state: &AppState, quote: &Quote) {
    send_webhook(state, quote, "created");
}

/// Emails the customer and announces the approval to the webhook receiver.
pub fn quote_approved(state: &AppState, quote: &Quote) {
    let email = approval_email(quote);
    let service = state.email_service.clone();
    let quote_id = quote.id;

    tokio::spawn(async move {
        match service.send(&email).await {
            Ok(()) => info!(quote_id = %quote_id, to = %email.to, "Approval email sent"),
            Err(e) => warn!(quote_id = %quote_id, error = %e, "Failed to send approval email"),
        }
    });

    send_webhook(state, quote, "approved");
}

fn send_webhook(state: &AppState, quote: &Quote, reason: &'static str) {
    let client = state.webhook.clone();
    let event = QuoteEvent::from(quote);
    let quote_id = quote.id;

    tokio::spawn(async move {
        match client.deliver(&event).await {
            Ok(delivery) => info!(
                quote_id = %quote_id,
                reason,
                status = delivery.status,
                attempts = delivery.attempts,
                "Webhook delivered"
            ),
            Err(WebhookError::Disabled) => {
                debug!(quote_id = %quote_id, reason, "Webhook endpoint not configured");
            }
            Err(e) => warn!(quote_id = %quote_id, reason, error = %e, "Webhook delivery failed"),
        }
    });
}
