//! Entity re-exports.

pub use super::categories::Entity as Categories;
pub use super::companies::Entity as Companies;
pub use super::customers::Entity as Customers;
pub use super::product_variants::Entity as ProductVariants;
pub use super::products::Entity as Products;
pub use super::quote_templates::Entity as QuoteTemplates;
pub use super::quotes::Entity as Quotes;
pub use super::sessions::Entity as Sessions;
pub use super::users::Entity as Users;
