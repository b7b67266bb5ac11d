use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::*;

fn widget() -> PricedProduct {
    PricedProduct {
        id: Uuid::from_u128(1),
        name: "Widget".to_string(),
        price: dec!(50.00),
    }
}

fn gadget() -> PricedProduct {
    PricedProduct {
        id: Uuid::from_u128(2),
        name: "Gadget".to_string(),
        price: dec!(25.50),
    }
}

fn catalog() -> Vec<PricedProduct> {
    vec![widget(), gadget()]
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn line(product: &PricedProduct, quantity: i64) -> LineInput {
    LineInput {
        product_id: product.id,
        quantity,
        unit_price: None,
    }
}

fn draft() -> QuoteDraft {
    QuoteDraft {
        customer_name: "  Jane Doe ".to_string(),
        customer_email: "jane@example.com".to_string(),
        template_name: Some("Standard Terms".to_string()),
        category_name: Some("Hardware".to_string()),
        tax_percentage: dec!(10),
        advance_payment: dec!(20.00),
        lines: vec![line(&widget(), 2), line(&gadget(), 1)],
        status: QuoteStatus::Draft,
        digital_signature: None,
    }
}

fn stored(prepared: PreparedQuote) -> Quote {
    Quote {
        id: Uuid::from_u128(0x3f2a_9c1b_0000_4000_8000_0000_0000_0000),
        company_id: Uuid::from_u128(99),
        customer_name: prepared.customer_name,
        customer_email: prepared.customer_email,
        template_name: prepared.template_name,
        category_name: prepared.category_name,
        status: prepared.status,
        subtotal: prepared.totals.subtotal,
        tax_percentage: prepared.tax_percentage,
        tax_amount: prepared.totals.tax_amount,
        total: prepared.totals.total,
        advance_payment: prepared.advance_payment,
        digital_signature: prepared.digital_signature,
        signed_at: prepared.signed_at,
        items: prepared.items,
        created_at: now(),
        updated_at: now(),
    }
}

#[test]
fn test_prepare_prices_from_catalog() {
    let prepared = QuoteService::prepare(draft(), &catalog(), now()).unwrap();

    assert_eq!(prepared.customer_name, "Jane Doe");
    assert_eq!(prepared.items.len(), 2);
    assert_eq!(prepared.items[0].product_name, "Widget");
    assert_eq!(prepared.items[0].unit_price, dec!(50.00));
    assert_eq!(prepared.items[0].subtotal, dec!(100.00));
    assert_eq!(prepared.totals.subtotal, dec!(125.50));
    assert_eq!(prepared.totals.tax_amount, dec!(12.55));
    assert_eq!(prepared.totals.total, dec!(118.05));
    assert_eq!(prepared.status, QuoteStatus::Draft);
    assert!(prepared.signed_at.is_none());
}

#[test]
fn test_prepare_uses_price_override() {
    let mut input = draft();
    input.lines = vec![LineInput {
        product_id: widget().id,
        quantity: 3,
        unit_price: Some(dec!(45.00)),
    }];

    let prepared = QuoteService::prepare(input, &catalog(), now()).unwrap();
    assert_eq!(prepared.items[0].unit_price, dec!(45.00));
    assert_eq!(prepared.totals.subtotal, dec!(135.00));
}

#[test]
fn test_prepare_rejects_empty_items() {
    let mut input = draft();
    input.lines.clear();
    assert_eq!(
        QuoteService::prepare(input, &catalog(), now()),
        Err(QuoteError::NoItems)
    );
}

#[test]
fn test_prepare_rejects_bad_quantity() {
    for quantity in [0, -1, MAX_LINE_QUANTITY + 1] {
        let mut input = draft();
        input.lines = vec![line(&widget(), quantity)];
        assert!(matches!(
            QuoteService::prepare(input, &catalog(), now()),
            Err(QuoteError::InvalidQuantity { .. })
        ));
    }
}

#[test]
fn test_prepare_rejects_unknown_product() {
    let mut input = draft();
    let stranger = Uuid::from_u128(404);
    input.lines = vec![LineInput {
        product_id: stranger,
        quantity: 1,
        unit_price: None,
    }];
    assert_eq!(
        QuoteService::prepare(input, &catalog(), now()),
        Err(QuoteError::UnknownProduct(stranger))
    );
}

#[test]
fn test_prepare_rejects_negative_override() {
    let mut input = draft();
    input.lines = vec![LineInput {
        product_id: widget().id,
        quantity: 1,
        unit_price: Some(dec!(-1)),
    }];
    assert!(matches!(
        QuoteService::prepare(input, &catalog(), now()),
        Err(QuoteError::NegativeUnitPrice { .. })
    ));
}

#[test]
fn test_prepare_validates_header() {
    let mut input = draft();
    input.customer_name = "   ".to_string();
    assert_eq!(
        QuoteService::prepare(input, &catalog(), now()),
        Err(QuoteError::CustomerNameRequired)
    );

    let mut input = draft();
    input.customer_email = "jane.example.com".to_string();
    assert!(matches!(
        QuoteService::prepare(input, &catalog(), now()),
        Err(QuoteError::InvalidCustomerEmail(_))
    ));

    let mut input = draft();
    input.tax_percentage = dec!(100.01);
    assert!(matches!(
        QuoteService::prepare(input, &catalog(), now()),
        Err(QuoteError::InvalidTaxPercentage(_))
    ));

    let mut input = draft();
    input.advance_payment = dec!(-5);
    assert!(matches!(
        QuoteService::prepare(input, &catalog(), now()),
        Err(QuoteError::NegativeAdvancePayment(_))
    ));
}

#[test]
fn test_prepare_approved_requires_signature() {
    let mut input = draft();
    input.status = QuoteStatus::Approved;
    input.digital_signature = Some("   ".to_string());
    assert_eq!(
        QuoteService::prepare(input, &catalog(), now()),
        Err(QuoteError::SignatureRequired)
    );

    let mut input = draft();
    input.status = QuoteStatus::Approved;
    input.digital_signature = Some("data:image/png;base64,AAAA".to_string());
    let prepared = QuoteService::prepare(input, &catalog(), now()).unwrap();
    assert_eq!(prepared.status, QuoteStatus::Approved);
    assert_eq!(prepared.signed_at, Some(now()));
}

#[test]
fn test_patch_keeps_stored_prices_and_recomputes_totals() {
    let quote = stored(QuoteService::prepare(draft(), &catalog(), now()).unwrap());
    // Catalog price changed since the quote was written.
    let repriced = vec![PricedProduct {
        price: dec!(75.00),
        ..widget()
    }];

    let patch = QuotePatch {
        tax_percentage: Some(dec!(0)),
        ..QuotePatch::default()
    };
    let (prepared, transition) =
        QuoteService::apply_patch(&quote, patch, &repriced, now()).unwrap();

    assert_eq!(transition, Transition::Unchanged);
    assert_eq!(prepared.items[0].unit_price, dec!(50.00));
    assert_eq!(prepared.totals.tax_amount, dec!(0.00));
    assert_eq!(prepared.totals.total, dec!(105.50));
}

#[test]
fn test_patch_replacing_lines_reprices() {
    let quote = stored(QuoteService::prepare(draft(), &catalog(), now()).unwrap());
    let patch = QuotePatch {
        lines: Some(vec![line(&gadget(), 4)]),
        ..QuotePatch::default()
    };

    let (prepared, _) = QuoteService::apply_patch(&quote, patch, &catalog(), now()).unwrap();
    assert_eq!(prepared.items.len(), 1);
    assert_eq!(prepared.totals.subtotal, dec!(102.00));
}

#[test]
fn test_patch_clears_template_with_empty_string() {
    let quote = stored(QuoteService::prepare(draft(), &catalog(), now()).unwrap());
    let patch = QuotePatch {
        template_name: Some(String::new()),
        ..QuotePatch::default()
    };

    let (prepared, _) = QuoteService::apply_patch(&quote, patch, &catalog(), now()).unwrap();
    assert!(prepared.template_name.is_none());
    assert_eq!(prepared.category_name.as_deref(), Some("Hardware"));
}

#[test]
fn test_patch_approve_flow() {
    let quote = stored(QuoteService::prepare(draft(), &catalog(), now()).unwrap());

    let unsigned = QuotePatch {
        status: Some(QuoteStatus::Approved),
        ..QuotePatch::default()
    };
    assert_eq!(
        QuoteService::apply_patch(&quote, unsigned, &catalog(), now()),
        Err(QuoteError::SignatureRequired)
    );

    let signed = QuotePatch {
        status: Some(QuoteStatus::Approved),
        digital_signature: Some("data:image/png;base64,AAAA".to_string()),
        ..QuotePatch::default()
    };
    let (prepared, transition) =
        QuoteService::apply_patch(&quote, signed, &catalog(), now()).unwrap();
    assert_eq!(transition, Transition::Approve);
    assert_eq!(prepared.status, QuoteStatus::Approved);
    assert_eq!(prepared.signed_at, Some(now()));

    let approved = stored(prepared);
    let edit = QuotePatch {
        customer_name: Some("Someone Else".to_string()),
        ..QuotePatch::default()
    };
    assert_eq!(
        QuoteService::apply_patch(&approved, edit, &catalog(), now()),
        Err(QuoteError::Locked)
    );
    assert_eq!(approved.reference(), "3F2A9C1B");
}

#[test]
fn test_check_transition_table() {
    use QuoteStatus::{Approved, Draft};

    assert_eq!(
        QuoteService::check_transition(Draft, Draft, None),
        Ok(Transition::Unchanged)
    );
    assert_eq!(
        QuoteService::check_transition(Draft, Approved, Some("sig")),
        Ok(Transition::Approve)
    );
    assert_eq!(
        QuoteService::check_transition(Draft, Approved, None),
        Err(QuoteError::SignatureRequired)
    );
    assert_eq!(
        QuoteService::check_transition(Approved, Draft, Some("sig")),
        Err(QuoteError::InvalidTransition {
            from: Approved,
            to: Draft
        })
    );
}

#[rstest::rstest]
#[case("jane@example.com", true)]
#[case("j.doe+quotes@mail.example.co", true)]
#[case("ops@localhost", true)]
#[case("  jane@example.com  ", true)]
#[case("a,b@acme.test", false)]
#[case("a@b..test", false)]
#[case("@example.com", false)]
#[case("jane@@example.com", false)]
#[case("jane doe@example.com", false)]
fn test_customer_email(#[case] email: &str, #[case] accepted: bool) {
    assert_eq!(validate_customer_email(email).is_ok(), accepted, "{email}");
}

#[test]
fn test_rates_rounded_before_totals() {
    let mut input = draft();
    input.lines = vec![line(&widget(), 1)];
    input.tax_percentage = dec!(7.12345);
    input.advance_payment = dec!(0.005);

    let prepared = QuoteService::prepare(input, &catalog(), now()).unwrap();
    assert_eq!(prepared.advance_payment, dec!(0.01));
    assert_eq!(prepared.tax_percentage, dec!(7.1235));
    // 50.00 × 7.1235% = 3.561750 → 3.56
    assert_eq!(prepared.totals.tax_amount, dec!(3.56));
    assert_eq!(
        prepared.totals.total,
        prepared.totals.subtotal + prepared.totals.tax_amount - prepared.advance_payment
    );
    assert_eq!(prepared.totals.total, dec!(53.55));
}

#[test]
fn test_patch_rounds_advance_payment() {
    let current = stored(QuoteService::prepare(draft(), &catalog(), now()).unwrap());
    let patch = QuotePatch {
        advance_payment: Some(dec!(10.004)),
        ..QuotePatch::default()
    };

    let (prepared, _) = QuoteService::apply_patch(&current, patch, &catalog(), now()).unwrap();
    assert_eq!(prepared.advance_payment, dec!(10.00));
    assert_eq!(
        prepared.totals.total,
        prepared.totals.subtotal + prepared.totals.tax_amount - prepared.advance_payment
    );
}
