//! Catalog rules: the category tree and product validation.

pub mod category;
pub mod error;
pub mod product;

pub use category::{
    CategoryNode, CategoryRecord, ancestors, build_tree, children_of, descendants,
    ensure_deletable, validate_parent,
};
pub use error::CatalogError;
pub use product::{ProductFields, merge_image_urls, required, validate_price};
