//! `SeaORM` entity definitions.

pub mod prelude;

pub mod categories;
pub mod companies;
pub mod customers;
pub mod product_variants;
pub mod products;
pub mod quote_templates;
pub mod quotes;
pub mod sessions;
pub mod users;
