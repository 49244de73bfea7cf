//! Image storage for post attachments.
//!
//! Files land under `<media_root>/post_images/`; the stored path relative
//! to the media root is what goes into `Post::image`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::DomainError;

pub const UPLOAD_PREFIX: &str = "post_images";

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Stores the bytes and returns the media-relative path.
    async fn store(&self, filename: &str, data: &[u8]) -> Result<String, DomainError>;
}

pub struct LocalImageStorage {
    media_root: PathBuf,
}

impl LocalImageStorage {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }
}

/// Keeps the final path component and replaces anything outside
/// `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = Path::new(filename)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .last()
        .unwrap_or("");

    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn check_image(filename: &str, data: &[u8]) -> Result<(), DomainError> {
    if data.is_empty() {
        return Err(DomainError::ValidationError("Image is empty".to_string()));
    }

    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(DomainError::ValidationError(format!(
            "Unsupported image type: {}",
            filename
        ))),
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn store(&self, filename: &str, data: &[u8]) -> Result<String, DomainError> {
        check_image(filename, data)?;

        let unique_id = uuid::Uuid::new_v4().simple().to_string();
        let relative = format!(
            "{}/{}_{}",
            UPLOAD_PREFIX,
            &unique_id[..8],
            sanitize_filename(filename)
        );
        let path = self.media_root.join(&relative);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::StorageError(format!("Failed to create directory: {}", e)))?;
        }

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| DomainError::StorageError(format!("Failed to create file: {}", e)))?;
        file.write_all(data)
            .await
            .map_err(|e| DomainError::StorageError(format!("Failed to write file: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| DomainError::StorageError(format!("Failed to flush file: {}", e)))?;

        tracing::debug!(path = ?path, size = data.len(), "image stored");
        Ok(relative)
    }
}
