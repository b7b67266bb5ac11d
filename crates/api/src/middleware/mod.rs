//! Request middleware.

pub mod auth;

pub use auth::{CurrentUser, session_middleware};
