//! Upload and object store errors.

use thiserror::Error;

/// Errors from validating or storing an upload.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Upload is bigger than `max_file_size`.
    #[error("File is {size} bytes; the limit is {max} bytes")]
    FileTooLarge {
        /// Upload size.
        size: u64,
        /// Configured limit.
        max: u64,
    },

    /// Content type not accepted for this kind of upload.
    #[error("File type '{mime_type}' is not allowed")]
    InvalidMimeType {
        /// Content type the client sent.
        mime_type: String,
    },

    /// Zero-byte upload.
    #[error("File is empty")]
    EmptyFile,

    /// No object under this key.
    #[error("object not found: {key}")]
    NotFound {
        /// Object key or backend message.
        key: String,
    },

    /// Provider settings could not build an operator.
    #[error("invalid storage configuration: {0}")]
    Configuration(String),

    /// Backend call failed.
    #[error("object store request failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Shorthand for [`StorageError::FileTooLarge`].
    #[must_use]
    pub const fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Shorthand for [`StorageError::InvalidMimeType`].
    #[must_use]
    pub fn invalid_mime_type(mime_type: impl Into<String>) -> Self {
        Self::InvalidMimeType {
            mime_type: mime_type.into(),
        }
    }

    /// Shorthand for [`StorageError::Configuration`].
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// True when the client sent an unacceptable file (400), false for
    /// backend trouble.
    #[must_use]
    pub const fn is_rejected_upload(&self) -> bool {
        matches!(
            self,
            Self::FileTooLarge { .. } | Self::InvalidMimeType { .. } | Self::EmptyFile
        )
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        if err.kind() == opendal::ErrorKind::NotFound {
            Self::NotFound {
                key: err.to_string(),
            }
        } else {
            Self::Operation(err.to_string())
        }
    }
}
