//! A single JSON document on disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;

/// Encode a value the way documents are written.
///
/// # Errors
///
/// Returns [`StorageError::Json`] if the value cannot be serialized.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StorageError> {
    Ok(serde_json::to_vec_pretty(value)?)
}

/// Location of one JSON document.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the document.
    ///
    /// A missing file and a file that does not decode both yield `None`;
    /// the latter is logged and left in place until the next write.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when the file exists but cannot be read.
    pub async fn read<T: DeserializeOwned>(&self) -> Result<Option<T>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "ignoring unreadable document"
                );
                Ok(None)
            }
        }
    }

    /// Replace the document with already encoded bytes.
    ///
    /// The bytes go to a sibling temporary file first, which is then renamed
    /// over the document, so readers never observe a partial write.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when the directory or file cannot be written.
    pub async fn write(&self, bytes: Vec<u8>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}
