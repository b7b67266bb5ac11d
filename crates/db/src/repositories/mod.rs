//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every tenant-owned lookup takes the caller's `company_id`; a row from
//! another company is reported as missing.

pub mod category;
pub mod company;
pub mod customer;
pub mod product;
pub mod quote;
pub mod session;
pub mod template;
pub mod user;
pub mod variant;

pub use category::{CategoryError, CategoryInput, CategoryPatch, CategoryRepository};
pub use company::{CompanyError, CompanyRepository, DEFAULT_LOGO_URL, RegisterInput};
pub use customer::{CustomerInput, CustomerPatch, CustomerRepository};
pub use product::{ProductError, ProductRepository, image_urls};
pub use quote::{QuoteRepoError, QuoteRepository};
pub use session::{NewSession, SessionRepository};
pub use template::{TemplateError, TemplateInput, TemplatePatch, TemplateRepository};
pub use user::{CreateUserInput, UpdateUserInput, UserError, UserRepository};
pub use variant::{VariantError, VariantRepository};

use sea_orm::{DbErr, SqlErr};

/// Emails are stored trimmed and lowercased.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// True when the database rejected a write on a unique constraint.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
