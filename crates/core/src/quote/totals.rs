//! Quote arithmetic.
//!
//! All money is `Decimal` and every stored amount is rounded to cents with
//! midpoint-away-from-zero, matching how amounts are printed on the quote.
//!
//! - line subtotal = quantity × unit_price
//! - subtotal      = Σ line subtotals
//! - tax_amount    = subtotal × tax_percentage / 100
//! - total         = subtotal + tax_amount − advance_payment

use rust_decimal::{Decimal, RoundingStrategy};

use crate::quote::types::{QuoteItem, QuoteTotals};

/// Decimal places kept for money amounts.
pub const MONEY_SCALE: u32 = 2;

/// Decimal places kept for tax rates.
pub const RATE_SCALE: u32 = 4;

/// Rounds an amount to cents.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a tax percentage to the stored precision.
#[must_use]
pub fn round_rate(rate: Decimal) -> Decimal {
    rate.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Subtotal of a single line.
#[must_use]
pub fn line_subtotal(quantity: u32, unit_price: Decimal) -> Decimal {
    round_money(Decimal::from(quantity) * unit_price)
}

/// Tax on a subtotal at `tax_percentage` percent.
#[must_use]
pub fn tax_amount(subtotal: Decimal, tax_percentage: Decimal) -> Decimal {
    round_money(subtotal * tax_percentage / Decimal::ONE_HUNDRED)
}

/// Computes quote totals from priced items.
///
/// The total may be negative when the advance payment exceeds the amount
/// owed; that is reported as-is rather than clamped.
#[must_use]
pub fn compute_totals(
    items: &[QuoteItem],
    tax_percentage: Decimal,
    advance_payment: Decimal,
) -> QuoteTotals {
    let subtotal = round_money(items.iter().map(|item| item.subtotal).sum());
    let tax_amount = tax_amount(subtotal, tax_percentage);
    let total = round_money(subtotal + tax_amount - advance_payment);

    QuoteTotals {
        subtotal,
        tax_amount,
        total,
    }
}
