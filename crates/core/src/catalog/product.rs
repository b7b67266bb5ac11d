//! Product and variant rules.

use rust_decimal::Decimal;

use crate::catalog::error::CatalogError;

/// Trims `value` and rejects it when blank.
///
/// # Errors
///
/// Returns `CatalogError::Required(field)` for blank input.
pub fn required(field: &'static str, value: &str) -> Result<String, CatalogError> {
    let value = value.trim();
    if value.is_empty() {
        Err(CatalogError::Required(field))
    } else {
        Ok(value.to_string())
    }
}

/// Rejects negative prices.
///
/// # Errors
///
/// Returns `CatalogError::NegativePrice`.
pub fn validate_price(price: Decimal) -> Result<Decimal, CatalogError> {
    if price < Decimal::ZERO {
        Err(CatalogError::NegativePrice)
    } else {
        Ok(price)
    }
}

/// Validated product fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    /// Name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Unit price.
    pub price: Decimal,
    /// Unit of sale, e.g. "piece" or "hour".
    pub unit: String,
    /// Category the product is listed under.
    pub category_name: Option<String>,
}

impl ProductFields {
    /// Validates raw product input.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` for a blank name or unit or a negative price.
    pub fn new(
        name: &str,
        description: Option<String>,
        price: Decimal,
        unit: &str,
        category_name: Option<String>,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            name: required("Product name", name)?,
            description: description.filter(|d| !d.trim().is_empty()),
            price: validate_price(price)?,
            unit: required("Unit", unit)?,
            category_name: category_name.filter(|c| !c.trim().is_empty()),
        })
    }
}

/// Combines the image URLs a client kept with freshly uploaded ones,
/// preserving order and dropping duplicates and blanks.
pub fn merge_image_urls(kept: Vec<String>, uploaded: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(kept.len() + uploaded.len());
    for url in kept.into_iter().chain(uploaded) {
        let url = url.trim().to_string();
        if !url.is_empty() && !merged.contains(&url) {
            merged.push(url);
        }
    }
    merged
}
