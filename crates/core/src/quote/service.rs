//! Quote preparation and workflow.
//!
//! Turns create/patch requests into a `PreparedQuote`: inputs validated,
//! lines priced against the company catalog, totals recomputed and the
//! status transition checked. Nothing here touches storage; callers load
//! the catalog and persist the result.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use validator::ValidateEmail;

use crate::quote::error::QuoteError;
use crate::quote::totals::{compute_totals, line_subtotal, round_money, round_rate};
use crate::quote::types::{
    LineInput, PreparedQuote, PricedProduct, Quote, QuoteDraft, QuotePatch, QuoteItem, QuoteStatus,
};

/// Largest quantity accepted on a single line.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Outcome of a status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Status does not change.
    Unchanged,
    /// Draft → Approved; side effects (email, webhook) should fire.
    Approve,
}

/// Stateless quote operations.
pub struct QuoteService;

impl QuoteService {
    /// Validates a new quote and prices its lines.
    ///
    /// # Errors
    ///
    /// Returns a `QuoteError` describing the first invalid field, an unknown
    /// product, or an approval without a signature.
    pub fn prepare(
        draft: QuoteDraft,
        catalog: &[PricedProduct],
        now: DateTime<Utc>,
    ) -> Result<PreparedQuote, QuoteError> {
        let customer_name = validate_customer_name(&draft.customer_name)?;
        let customer_email = validate_customer_email(&draft.customer_email)?;
        let (tax_percentage, advance_payment) =
            normalize_rates(draft.tax_percentage, draft.advance_payment)?;
        let items = price_lines(&draft.lines, catalog)?;

        let digital_signature = non_blank(draft.digital_signature);
        let transition = Self::check_transition(
            QuoteStatus::Draft,
            draft.status,
            digital_signature.as_deref(),
        )?;
        let signed_at = (transition == Transition::Approve).then_some(now);
        let totals = compute_totals(&items, tax_percentage, advance_payment);

        Ok(PreparedQuote {
            customer_name,
            customer_email,
            template_name: non_blank(draft.template_name),
            category_name: non_blank(draft.category_name),
            status: draft.status,
            tax_percentage,
            advance_payment,
            items,
            totals,
            digital_signature,
            signed_at,
        })
    }

    /// Applies a partial update to a stored quote.
    ///
    /// Items are repriced only when the patch replaces them; otherwise the
    /// stored prices are kept and only totals are recomputed.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::Locked` for approved quotes, otherwise the same
    /// validation errors as [`QuoteService::prepare`].
    pub fn apply_patch(
        current: &Quote,
        patch: QuotePatch,
        catalog: &[PricedProduct],
        now: DateTime<Utc>,
    ) -> Result<(PreparedQuote, Transition), QuoteError> {
        if !current.status.is_editable() {
            return Err(QuoteError::Locked);
        }

        let customer_name = match patch.customer_name {
            Some(name) => validate_customer_name(&name)?,
            None => current.customer_name.clone(),
        };
        let customer_email = match patch.customer_email {
            Some(email) => validate_customer_email(&email)?,
            None => current.customer_email.clone(),
        };
        let (tax_percentage, advance_payment) = normalize_rates(
            patch.tax_percentage.unwrap_or(current.tax_percentage),
            patch.advance_payment.unwrap_or(current.advance_payment),
        )?;

        let items = match patch.lines {
            Some(lines) => price_lines(&lines, catalog)?,
            None => current.items.clone(),
        };

        let digital_signature = match patch.digital_signature {
            Some(signature) => non_blank(Some(signature)),
            None => current.digital_signature.clone(),
        };
        let status = patch.status.unwrap_or(current.status);
        let transition =
            Self::check_transition(current.status, status, digital_signature.as_deref())?;
        let signed_at = match transition {
            Transition::Approve => Some(now),
            Transition::Unchanged => current.signed_at,
        };

        let prepared = PreparedQuote {
            customer_name,
            customer_email,
            template_name: replace_optional(patch.template_name, current.template_name.as_deref()),
            category_name: replace_optional(patch.category_name, current.category_name.as_deref()),
            status,
            tax_percentage,
            advance_payment,
            totals: compute_totals(&items, tax_percentage, advance_payment),
            items,
            digital_signature,
            signed_at,
        };

        Ok((prepared, transition))
    }

    /// Checks a status change.
    ///
    /// # Errors
    ///
    /// - `SignatureRequired` when moving to Approved without a signature
    /// - `InvalidTransition` when leaving Approved
    pub fn check_transition(
        from: QuoteStatus,
        to: QuoteStatus,
        signature: Option<&str>,
    ) -> Result<Transition, QuoteError> {
        match (from, to) {
            (QuoteStatus::Draft, QuoteStatus::Draft) => Ok(Transition::Unchanged),
            (QuoteStatus::Draft, QuoteStatus::Approved) => {
                if signature.is_some_and(|s| !s.trim().is_empty()) {
                    Ok(Transition::Approve)
                } else {
                    Err(QuoteError::SignatureRequired)
                }
            }
            (QuoteStatus::Approved, QuoteStatus::Approved) => Ok(Transition::Unchanged),
            (QuoteStatus::Approved, QuoteStatus::Draft) => {
                Err(QuoteError::InvalidTransition { from, to })
            }
        }
    }
}

/// Prices requested lines against the catalog.
///
/// # Errors
///
/// Returns `NoItems`, `InvalidQuantity`, `NegativeUnitPrice` or
/// `UnknownProduct`.
pub fn price_lines(
    lines: &[LineInput],
    catalog: &[PricedProduct],
) -> Result<Vec<QuoteItem>, QuoteError> {
    if lines.is_empty() {
        return Err(QuoteError::NoItems);
    }

    lines
        .iter()
        .map(|line| {
            let quantity = u32::try_from(line.quantity)
                .ok()
                .filter(|q| *q > 0 && i64::from(*q) <= MAX_LINE_QUANTITY)
                .ok_or(QuoteError::InvalidQuantity {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })?;

            let product = catalog
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or(QuoteError::UnknownProduct(line.product_id))?;

            let unit_price = line.unit_price.unwrap_or(product.price);
            if unit_price < Decimal::ZERO {
                return Err(QuoteError::NegativeUnitPrice {
                    product_id: line.product_id,
                });
            }

            Ok(QuoteItem {
                product_id: product.id,
                product_name: product.name.clone(),
                quantity,
                unit_price,
                subtotal: line_subtotal(quantity, unit_price),
            })
        })
        .collect()
}

fn validate_customer_name(name: &str) -> Result<String, QuoteError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(QuoteError::CustomerNameRequired);
    }
    Ok(name.to_string())
}

fn validate_customer_email(email: &str) -> Result<String, QuoteError> {
    let email = email.trim();
    if email.validate_email() {
        Ok(email.to_string())
    } else {
        Err(QuoteError::InvalidCustomerEmail(email.to_string()))
    }
}

/// Checks the rates and rounds them to the precision they are stored at,
/// so totals are computed from the persisted values.
fn normalize_rates(
    tax_percentage: Decimal,
    advance_payment: Decimal,
) -> Result<(Decimal, Decimal), QuoteError> {
    if tax_percentage < Decimal::ZERO || tax_percentage > Decimal::ONE_HUNDRED {
        return Err(QuoteError::InvalidTaxPercentage(tax_percentage));
    }
    if advance_payment < Decimal::ZERO {
        return Err(QuoteError::NegativeAdvancePayment(advance_payment));
    }
    Ok((round_rate(tax_percentage), round_money(advance_payment)))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn replace_optional(patch: Option<String>, current: Option<&str>) -> Option<String> {
    match patch {
        Some(value) => non_blank(Some(value)),
        None => current.map(str::to_string),
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod service_tests;
