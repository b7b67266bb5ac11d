//! Quote domain types.
//!
//! These are the shapes the rest of the system exchanges: the stored quote,
//! its embedded line items, and the inputs used to create or modify one.
//! Money fields are `Decimal` and serialize as decimal strings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Quote status.
///
/// The only transition is Draft → Approved, which requires a digital
/// signature. Approved quotes are frozen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuoteStatus {
    /// Being prepared; freely editable.
    #[default]
    Draft,
    /// Signed and approved by the customer.
    Approved,
}

impl QuoteStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Approved => "APPROVED",
        }
    }

    /// Parses a status from a string, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "APPROVED" => Some(Self::Approved),
            _ => None,
        }
    }

    /// Returns true if the quote can still be modified.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A priced line item as stored in the quote's JSON `items` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItem {
    /// Catalog product this line was priced from.
    pub product_id: Uuid,
    /// Product name at the time of pricing.
    pub product_name: String,
    /// Units ordered, always positive.
    pub quantity: u32,
    /// Price per unit.
    pub unit_price: Decimal,
    /// `quantity × unit_price`, rounded to cents.
    pub subtotal: Decimal,
}

/// A requested line before pricing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineInput {
    /// Catalog product to quote.
    pub product_id: Uuid,
    /// Units requested. Signed so that zero and negative input can be reported.
    pub quantity: i64,
    /// Price override. Defaults to the catalog price.
    #[serde(default)]
    pub unit_price: Option<Decimal>,
}

/// The slice of a catalog product needed to price a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedProduct {
    /// Product ID.
    pub id: Uuid,
    /// Product name.
    pub name: String,
    /// Catalog price.
    pub price: Decimal,
}

/// Computed money fields of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTotals {
    /// Sum of line subtotals.
    pub subtotal: Decimal,
    /// `subtotal × tax_percentage / 100`.
    pub tax_amount: Decimal,
    /// `subtotal + tax_amount − advance_payment`.
    pub total: Decimal,
}

/// Input for creating a quote.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuoteDraft {
    /// Customer display name.
    pub customer_name: String,
    /// Customer email; receives the approval notice.
    pub customer_email: String,
    /// Name of the terms-and-conditions template.
    pub template_name: Option<String>,
    /// Category the quote was prepared under.
    pub category_name: Option<String>,
    /// Tax rate in percent, 0..=100.
    pub tax_percentage: Decimal,
    /// Amount already paid, subtracted from the total.
    pub advance_payment: Decimal,
    /// Requested lines.
    pub lines: Vec<LineInput>,
    /// Initial status. Approved requires a signature.
    pub status: QuoteStatus,
    /// Signature (typically an image data URL).
    pub digital_signature: Option<String>,
}

/// Partial update of a quote. `None` leaves a field unchanged; an empty
/// string clears the optional text fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuotePatch {
    /// New customer name.
    pub customer_name: Option<String>,
    /// New customer email.
    pub customer_email: Option<String>,
    /// New template name.
    pub template_name: Option<String>,
    /// New category name.
    pub category_name: Option<String>,
    /// New tax rate.
    pub tax_percentage: Option<Decimal>,
    /// New advance payment.
    pub advance_payment: Option<Decimal>,
    /// Replacement lines; repriced from the catalog.
    pub lines: Option<Vec<LineInput>>,
    /// Target status.
    pub status: Option<QuoteStatus>,
    /// Signature to attach.
    pub digital_signature: Option<String>,
}

impl QuotePatch {
    /// True when the patch requests no changes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Validated, priced quote content ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedQuote {
    /// Customer display name.
    pub customer_name: String,
    /// Customer email.
    pub customer_email: String,
    /// Template name.
    pub template_name: Option<String>,
    /// Category name.
    pub category_name: Option<String>,
    /// Resulting status.
    pub status: QuoteStatus,
    /// Tax rate in percent.
    pub tax_percentage: Decimal,
    /// Advance payment.
    pub advance_payment: Decimal,
    /// Priced lines.
    pub items: Vec<QuoteItem>,
    /// Computed totals.
    pub totals: QuoteTotals,
    /// Signature.
    pub digital_signature: Option<String>,
    /// When the quote was signed and approved.
    pub signed_at: Option<DateTime<Utc>>,
}

/// A stored quote, as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Quote ID.
    pub id: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Customer display name.
    pub customer_name: String,
    /// Customer email.
    pub customer_email: String,
    /// Template name.
    pub template_name: Option<String>,
    /// Category name.
    pub category_name: Option<String>,
    /// Status.
    pub status: QuoteStatus,
    /// Sum of line subtotals.
    pub subtotal: Decimal,
    /// Tax rate in percent.
    pub tax_percentage: Decimal,
    /// Tax amount.
    pub tax_amount: Decimal,
    /// Amount due.
    pub total: Decimal,
    /// Advance payment.
    pub advance_payment: Decimal,
    /// Signature.
    pub digital_signature: Option<String>,
    /// Signing time.
    pub signed_at: Option<DateTime<Utc>>,
    /// Line items.
    pub items: Vec<QuoteItem>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    /// Short human reference used in emails, e.g. `3F2A9C1B`.
    #[must_use]
    pub fn reference(&self) -> String {
        self.id.simple().to_string()[..8].to_ascii_uppercase()
    }
}
