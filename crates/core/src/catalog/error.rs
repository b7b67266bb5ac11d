//! Catalog error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by catalog rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// A required text field is blank.
    #[error("{0} is required")]
    Required(&'static str),

    /// A price is negative.
    #[error("Price must not be negative")]
    NegativePrice,

    /// Parent category is not in this company.
    #[error("Parent category {0} not found")]
    UnknownParent(Uuid),

    /// Re-parenting would create a loop.
    #[error("Category cannot be its own ancestor")]
    CircularParent,

    /// Category still has subcategories.
    #[error("Category has subcategories and cannot be deleted")]
    HasChildren,

    /// Templates still reference the category.
    #[error("Category has templates and cannot be deleted")]
    HasTemplates,
}

impl CatalogError {
    /// True when the error describes a conflict with existing data (409).
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::HasChildren | Self::HasTemplates)
    }
}
