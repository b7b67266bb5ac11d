//! Outbound notifications for quotes: the approval email and the webhook event.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write as _;
use uuid::Uuid;

use quotely_shared::OutgoingEmail;

use crate::quote::totals::round_money;
use crate::quote::types::{Quote, QuoteStatus};

/// Webhook body sent on quote creation and approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteEvent {
    /// Quote ID.
    pub id: Uuid,
    /// Customer name.
    pub customer_name: String,
    /// Customer email.
    pub customer_email: String,
    /// Amount due.
    pub total: Decimal,
    /// Status at the time of the event.
    pub status: QuoteStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Lines.
    pub items: Vec<QuoteEventItem>,
}

/// A line in a [`QuoteEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteEventItem {
    /// Product name.
    pub product_name: String,
    /// Quantity.
    pub quantity: u32,
    /// Unit price.
    pub unit_price: Decimal,
    /// Line subtotal.
    pub subtotal: Decimal,
}

impl From<&Quote> for QuoteEvent {
    fn from(quote: &Quote) -> Self {
        Self {
            id: quote.id,
            customer_name: quote.customer_name.clone(),
            customer_email: quote.customer_email.clone(),
            total: quote.total,
            status: quote.status,
            created_at: quote.created_at,
            items: quote
                .items
                .iter()
                .map(|item| QuoteEventItem {
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    subtotal: item.subtotal,
                })
                .collect(),
        }
    }
}

fn money(amount: Decimal) -> String {
    format!("${:.2}", round_money(amount))
}

/// Builds the "quote approved" email sent to the customer.
#[must_use]
pub fn approval_email(quote: &Quote) -> OutgoingEmail {
    let reference = quote.reference();

    let mut items = String::new();
    for item in &quote.items {
        let _ = writeln!(
            items,
            "  - {}\n    Quantity: {}\n    Unit Price: {}\n    Subtotal: {}",
            item.product_name,
            item.quantity,
            money(item.unit_price),
            money(item.subtotal),
        );
    }

    let mut body = format!(
        "Dear {name},\n\n\
         Your quote #{reference} has been approved. Here are the details:\n\n\
         Quote Details:\n\
         - Subtotal: {subtotal}\n\
         - Tax Amount: {tax}\n",
        name = quote.customer_name,
        subtotal = money(quote.subtotal),
        tax = money(quote.tax_amount),
    );
    if quote.advance_payment > Decimal::ZERO {
        let _ = writeln!(body, "- Advance Payment: {}", money(quote.advance_payment));
    }
    let _ = write!(
        body,
        "- Total Amount: {total}\n- Status: {status}\n\nItems:\n{items}\nThank you for your business!\n",
        total = money(quote.total),
        status = quote.status,
    );

    OutgoingEmail {
        to: quote.customer_email.clone(),
        subject: format!("Quote #{reference} Approved"),
        body,
    }
}
