//! Printable quote document.
//!
//! PDF rendering happens in the client; this assembles everything the
//! renderer needs in one payload so it does not have to join resources.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::quote::types::{Quote, QuoteStatus};

/// Letterhead shown at the top of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Letterhead {
    /// Company name.
    pub company_name: String,
    /// Company logo URL.
    pub logo_url: String,
}

/// Terms-and-conditions section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsSection {
    /// Template name.
    pub name: String,
    /// Template body.
    pub content: String,
}

/// Signature block, present only on approved quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureBlock {
    /// Signature image data URL.
    pub image: String,
    /// Signing time.
    pub signed_at: Option<DateTime<Utc>>,
}

/// Everything needed to render a quote PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDocument {
    /// Letterhead.
    pub letterhead: Letterhead,
    /// Short quote number.
    pub reference: String,
    /// The quote with items and totals.
    pub quote: Quote,
    /// Whether to print the advance payment row.
    pub show_advance_payment: bool,
    /// Terms and conditions, when the template still exists.
    pub terms: Option<TermsSection>,
    /// Signature, when approved.
    pub signature: Option<SignatureBlock>,
}

impl QuoteDocument {
    /// Assembles the document. `templates` are `(name, content)` pairs from
    /// the company; the quote's `template_name` selects one by exact name.
    #[must_use]
    pub fn assemble(letterhead: Letterhead, quote: Quote, templates: &[(String, String)]) -> Self {
        let terms = quote.template_name.as_deref().and_then(|wanted| {
            templates
                .iter()
                .find(|(name, _)| name == wanted)
                .map(|(name, content)| TermsSection {
                    name: name.clone(),
                    content: content.clone(),
                })
        });

        let signature = match (quote.status, &quote.digital_signature) {
            (QuoteStatus::Approved, Some(image)) => Some(SignatureBlock {
                image: image.clone(),
                signed_at: quote.signed_at,
            }),
            _ => None,
        };

        Self {
            letterhead,
            reference: quote.reference(),
            show_advance_payment: !quote.advance_payment.is_zero(),
            quote,
            terms,
            signature,
        }
    }
}
