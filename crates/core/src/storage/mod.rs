//! Object storage for product images and company logos, via Apache OpenDAL.
//!
//! Supported backends:
//! - S3-compatible: AWS S3, Cloudflare R2, MinIO, DigitalOcean Spaces
//! - Azure Blob Storage
//! - Local filesystem (development only)
//!
//! Objects are written server-side and served from `public_base_url`:
//!
//! ```text
//! {company_id}/product-images/{uuid}.{ext}
//! {company_id}/logos/{uuid}.{ext}
//! ```

mod config;
mod error;
mod service;

pub use config::{StorageConfig, UploadKind};
pub use error::StorageError;
pub use quotely_shared::StorageProvider;
pub use service::{StorageService, StoredObject, Upload};
