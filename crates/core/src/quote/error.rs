//! Quote error types.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::quote::types::QuoteStatus;

/// Errors raised while validating, pricing or transitioning a quote.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuoteError {
    /// Customer name is blank.
    #[error("Customer name is required")]
    CustomerNameRequired,

    /// Customer email is not a plausible address.
    #[error("Invalid customer email: {0}")]
    InvalidCustomerEmail(String),

    /// No line items were supplied.
    #[error("Quote must have at least one item")]
    NoItems,

    /// A line quantity is zero, negative or too large.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity {
        /// The offending product.
        product_id: Uuid,
        /// The quantity supplied.
        quantity: i64,
    },

    /// A unit price override is negative.
    #[error("Unit price must not be negative for product {product_id}")]
    NegativeUnitPrice {
        /// The offending product.
        product_id: Uuid,
    },

    /// A line references a product outside the company catalog.
    #[error("Product {0} not found")]
    UnknownProduct(Uuid),

    /// Tax rate outside 0..=100.
    #[error("Tax percentage must be between 0 and 100, got {0}")]
    InvalidTaxPercentage(Decimal),

    /// Advance payment is negative.
    #[error("Advance payment must not be negative, got {0}")]
    NegativeAdvancePayment(Decimal),

    /// Approval without a signature.
    #[error("A digital signature is required to approve a quote")]
    SignatureRequired,

    /// Status change not allowed.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: QuoteStatus,
        /// The attempted target status.
        to: QuoteStatus,
    },

    /// Attempted to edit an approved quote.
    #[error("Approved quotes cannot be modified")]
    Locked,
}

impl QuoteError {
    /// True for input problems (400), false for rule violations (422).
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(
            self,
            Self::SignatureRequired | Self::InvalidTransition { .. } | Self::Locked
        )
    }
}
