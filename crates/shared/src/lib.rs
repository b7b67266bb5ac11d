//! Shared errors, configuration and outbound integrations for Quotely.
//!
//! This crate provides what every other crate leans on:
//! - Application-wide error type with HTTP status mapping
//! - Layered configuration (files + `QUOTELY__*` environment)
//! - SMTP email delivery
//! - Signed webhook delivery with retry

pub mod config;
pub mod email;
pub mod error;
pub mod webhook;

pub use config::{AppConfig, EmailConfig, StorageProvider, StorageSettings, WebhookConfig};
pub use email::{EmailError, EmailService, OutgoingEmail};
pub use error::{AppError, AppResult};
pub use webhook::{Delivery, WebhookClient, WebhookError};
