//! Storage service implementation using Apache OpenDAL.

use bytes::Bytes;
use opendal::{Builder, Operator, services};
use tracing::{debug, info};
use uuid::Uuid;

use super::config::{StorageConfig, UploadKind};
use super::error::StorageError;
use quotely_shared::StorageProvider;

/// A file received from a client, ready to be stored.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Owning company; first key segment.
    pub company_id: Uuid,
    /// Product image or logo.
    pub kind: UploadKind,
    /// Original filename, used only for its extension.
    pub filename: String,
    /// Content type (MIME type).
    pub content_type: String,
    /// File content.
    pub data: Bytes,
}

/// An object written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Storage key.
    pub key: String,
    /// Public URL.
    pub url: String,
    /// Size in bytes.
    pub size: u64,
}

/// Storage service for uploaded images.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        info!(provider = config.provider.name(), "Storage initialised");
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => finish(
                services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region),
            ),
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => finish(
                services::Azblob::default()
                    .endpoint(&format!("https://{account}.blob.core.windows.net"))
                    .account_name(account)
                    .account_key(access_key)
                    .container(container),
            ),
            StorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?;
                finish(services::Fs::default().root(root))
            }
        }
    }

    /// Validate an upload against size and MIME constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is empty, too large or of a rejected type.
    pub fn validate_upload(
        &self,
        kind: UploadKind,
        content_type: &str,
        size: u64,
    ) -> Result<(), StorageError> {
        if size == 0 {
            return Err(StorageError::EmptyFile);
        }
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(size, self.config.max_file_size));
        }
        if !kind.allows(content_type) {
            return Err(StorageError::invalid_mime_type(content_type));
        }
        Ok(())
    }

    /// Generate a fresh storage key.
    ///
    /// Format: `{company_id}/{product-images|logos}/{uuid}.{ext}`
    #[must_use]
    pub fn generate_storage_key(
        company_id: Uuid,
        kind: UploadKind,
        filename: &str,
        content_type: &str,
    ) -> String {
        format!(
            "{company_id}/{}/{}.{}",
            kind.prefix(),
            Uuid::new_v4(),
            file_extension(filename, content_type)
        )
    }

    /// Public URL for a key.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.config.public_base_url, key.trim_start_matches('/'))
    }

    /// Inverse of [`StorageService::public_url`]. `None` for foreign URLs.
    #[must_use]
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.config.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }

    /// Validate and write an upload.
    ///
    /// # Errors
    ///
    /// Returns an error if validation or the write fails.
    pub async fn upload(&self, upload: Upload) -> Result<StoredObject, StorageError> {
        let size = upload.data.len() as u64;
        self.validate_upload(upload.kind, &upload.content_type, size)?;

        let key = Self::generate_storage_key(
            upload.company_id,
            upload.kind,
            &upload.filename,
            &upload.content_type,
        );
        self.operator
            .write_with(&key, upload.data)
            .content_type(&upload.content_type)
            .await?;

        debug!(key = %key, size, "Stored object");
        Ok(StoredObject {
            url: self.public_url(&key),
            key,
            size,
        })
    }

    /// Delete a file from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Delete the object behind a public URL, if it is one of ours.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete_url(&self, url: &str) -> Result<(), StorageError> {
        match self.key_from_url(url) {
            Some(key) => self.delete(&key).await,
            None => Ok(()),
        }
    }

    /// Check if a file exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        self.operator.stat(key).await.is_ok()
    }

    /// Verify the backend is reachable and credentials work.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the check fails.
    pub async fn health_check(&self) -> Result<(), StorageError> {
        self.operator.check().await.map_err(StorageError::from)
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &StorageConfig {
        &self.config
    }
}

/// Extension for a stored object: from the filename when it has a sane one,
/// otherwise from the MIME subtype.
fn file_extension(filename: &str, content_type: &str) -> String {
    let from_name = sanitize_filename(filename)
        .rsplit_once('.')
        .map(|(stem, ext)| (stem.is_empty(), ext.to_ascii_lowercase()))
        .filter(|(no_stem, ext)| !no_stem && (1..=5).contains(&ext.len()) && !ext.contains('_'))
        .map(|(_, ext)| ext);

    from_name.unwrap_or_else(|| {
        let subtype = content_type
            .split_once('/')
            .map_or("", |(_, sub)| sub)
            .split(['+', ';'])
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match subtype.as_str() {
            "jpeg" | "pjpeg" => "jpg".to_string(),
            "" => "bin".to_string(),
            other => sanitize_filename(other),
        }
    })
}

/// Sanitize filename for storage key.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Builds and type-erases a service operator.
fn finish(builder: impl Builder) -> Result<Operator, StorageError> {
    Operator::new(builder)
        .map(|b| b.finish())
        .map_err(|e| StorageError::configuration(e.to_string()))
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_sanitized_filename_is_key_safe(name in ".{0,64}") {
            let sanitized = sanitize_filename(&name);
            prop_assert!(sanitized
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')));
            prop_assert_eq!(sanitized.chars().count(), name.chars().count());
        }

        #[test]
        fn prop_storage_key_has_three_segments(
            name in "[a-zA-Z0-9 ._/-]{0,32}",
            logo in any::<bool>(),
        ) {
            let kind = if logo { UploadKind::Logo } else { UploadKind::ProductImage };
            let key = StorageService::generate_storage_key(Uuid::nil(), kind, &name, "image/png");
            prop_assert_eq!(key.split('/').count(), 3);
            prop_assert!(!key.contains(".."));
        }
    }
}
