//! Storage-specific error type wrapping IO and JSON errors.

use yhk_domain::error::YhkError;

/// Errors originating from the JSON file storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading, writing or renaming a file failed.
    #[error("file error")]
    Io(#[from] std::io::Error),

    /// Failed to serialize a value.
    #[error("JSON serialization error")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    /// Convert into a [`YhkError::Storage`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> YhkError {
        YhkError::Storage(Box::new(self))
    }
}

impl From<StorageError> for YhkError {
    fn from(err: StorageError) -> Self {
        err.into_domain()
    }
}
