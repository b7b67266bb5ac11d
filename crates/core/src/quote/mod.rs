//! Quote lifecycle for Quotely.
//!
//! # Modules
//!
//! - `types` - Quote, line items, drafts and patches
//! - `totals` - Subtotal, tax and total arithmetic
//! - `service` - Validation, pricing and the Draft → Approved workflow
//! - `notify` - Approval email and webhook event payloads
//! - `document` - Data assembled for PDF rendering
//! - `error` - Quote-specific error types

pub mod document;
pub mod error;
pub mod notify;
pub mod service;
pub mod totals;
pub mod types;

#[cfg(test)]
mod totals_props;

pub use document::{Letterhead, QuoteDocument};
pub use error::QuoteError;
pub use notify::{QuoteEvent, approval_email};
pub use service::{QuoteService, Transition, price_lines};
pub use totals::compute_totals;
pub use types::{
    LineInput, PreparedQuote, PricedProduct, Quote, QuoteDraft, QuoteItem, QuotePatch,
    QuoteStatus, QuoteTotals,
};
