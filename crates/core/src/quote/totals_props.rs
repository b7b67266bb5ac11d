//! Property-based tests for quote arithmetic.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::quote::totals::{compute_totals, line_subtotal, round_money};
use crate::quote::types::QuoteItem;

/// Prices between 0.00 and 99,999.99.
fn arb_price() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Tax rates between 0.00% and 100.00%.
fn arb_tax() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|bp| Decimal::new(bp, 2))
}

fn arb_items() -> impl Strategy<Value = Vec<QuoteItem>> {
    prop::collection::vec((1u32..1_000, arb_price()), 1..20).prop_map(|lines| {
        lines
            .into_iter()
            .map(|(quantity, unit_price)| QuoteItem {
                product_id: Uuid::nil(),
                product_name: "p".to_string(),
                quantity,
                unit_price,
                subtotal: line_subtotal(quantity, unit_price),
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// total = subtotal + tax_amount − advance_payment, exactly, at cent precision.
    #[test]
    fn prop_total_identity(items in arb_items(), tax in arb_tax(), advance in arb_price()) {
        let totals = compute_totals(&items, tax, advance);
        prop_assert_eq!(totals.total, totals.subtotal + totals.tax_amount - advance);
    }

    /// Subtotal is the sum of line subtotals.
    #[test]
    fn prop_subtotal_is_sum(items in arb_items(), tax in arb_tax()) {
        let totals = compute_totals(&items, tax, Decimal::ZERO);
        let sum: Decimal = items.iter().map(|i| i.subtotal).sum();
        prop_assert_eq!(totals.subtotal, sum);
    }

    /// Tax never exceeds the subtotal and is never negative.
    #[test]
    fn prop_tax_bounded(items in arb_items(), tax in arb_tax()) {
        let totals = compute_totals(&items, tax, Decimal::ZERO);
        prop_assert!(totals.tax_amount >= Decimal::ZERO);
        prop_assert!(totals.tax_amount <= totals.subtotal);
    }

    /// Every stored amount has at most two decimal places.
    #[test]
    fn prop_amounts_are_cents(items in arb_items(), tax in arb_tax(), advance in arb_price()) {
        let totals = compute_totals(&items, tax, advance);
        for amount in [totals.subtotal, totals.tax_amount, totals.total] {
            prop_assert_eq!(round_money(amount), amount);
        }
    }
}
