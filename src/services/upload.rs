//! Upload storage
//!
//! Files are written under the configured upload directory with a generated
//! `<uuid>.<ext>` name and served back under `/uploads`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use uuid::Uuid;

use crate::config::UploadConfig;

/// URL prefix stored files are served under
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File type '{0}' is not allowed")]
    InvalidType(String),

    #[error("File is too large: {size} bytes (maximum {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("File is empty")]
    Empty,

    #[error("Failed to store file: {0}")]
    Storage(#[from] std::io::Error),
}

/// A file written to the upload directory
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoredFile {
    /// Generated name on disk
    pub file_name: String,
    /// URL the file is served at
    pub public_path: String,
    pub size: u64,
    pub mime_type: String,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    config: UploadConfig,
}

impl UploadStore {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    /// Validate and write a payload.
    pub async fn store(
        &self,
        payload: &[u8],
        original_name: &str,
        mime_type: &str,
    ) -> Result<StoredFile, UploadError> {
        if !self.config.is_type_allowed(mime_type) {
            return Err(UploadError::InvalidType(mime_type.to_string()));
        }
        if payload.is_empty() {
            return Err(UploadError::Empty);
        }
        let size = payload.len() as u64;
        if size > self.config.max_file_size {
            return Err(UploadError::TooLarge {
                size,
                max: self.config.max_file_size,
            });
        }

        ensure_upload_dir(&self.config.path).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension(original_name, mime_type));
        fs::write(self.config.path.join(&file_name), payload).await?;
        tracing::info!("Stored upload {} ({} bytes)", file_name, size);

        Ok(StoredFile {
            public_path: format!("{}/{}", PUBLIC_PREFIX, file_name),
            file_name,
            size,
            mime_type: mime_type.to_string(),
        })
    }

    /// Remove a stored file by its public path.
    ///
    /// A file that is already gone is logged and skipped. Paths outside the
    /// upload prefix are ignored.
    pub async fn remove(&self, public_path: &str) -> Result<(), UploadError> {
        let Some(path) = self.resolve(public_path) else {
            tracing::warn!("Refusing to remove non-upload path {}", public_path);
            return Ok(());
        };

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!("Removed upload {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Upload {} was already missing", path.display());
                Ok(())
            }
            Err(e) => Err(UploadError::Storage(e)),
        }
    }

    /// Map `/uploads/<name>` to a file in the upload directory
    fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let name = public_path.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        valid.then(|| self.config.path.join(name))
    }
}

async fn ensure_upload_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).await?;
    }
    Ok(())
}

/// Extension for a stored file: the original one when it looks sane,
/// otherwise one implied by the MIME type
fn extension(original_name: &str, mime_type: &str) -> String {
    if let Some((_, ext)) = original_name.rsplit_once('.') {
        if !ext.is_empty() && ext.len() < 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return ext.to_ascii_lowercase();
        }
    }

    match mime_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "application/pdf" => "pdf",
        _ => "bin",
    }
    .to_string()
}
