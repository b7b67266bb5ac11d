//! Storage configuration types.

use quotely_shared::{StorageProvider, StorageSettings};

/// What an upload is for. Decides the key prefix and accepted MIME types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Product gallery image: any `image/*`.
    ProductImage,
    /// Company logo: JPEG, PNG or GIF.
    Logo,
}

impl UploadKind {
    /// Key segment under the company prefix.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::ProductImage => "product-images",
            Self::Logo => "logos",
        }
    }

    /// Check if a MIME type is allowed for this kind of upload.
    #[must_use]
    pub fn allows(&self, mime_type: &str) -> bool {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        match self {
            Self::ProductImage => mime_type
                .strip_prefix("image/")
                .is_some_and(|subtype| !subtype.is_empty()),
            Self::Logo => matches!(
                mime_type.as_str(),
                "image/jpeg" | "image/jpg" | "image/png" | "image/gif"
            ),
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Base URL public object URLs are built from.
    pub public_base_url: String,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
}

impl StorageConfig {
    /// Default max file size: 5MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider, public_base_url: impl Into<String>) -> Self {
        Self {
            provider,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Build from the application settings section.
    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(settings.provider.clone(), settings.public_base_url.clone())
            .with_max_file_size(settings.max_file_size)
    }

    /// Set maximum file size.
    #[must_use]
    pub const fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }
}
