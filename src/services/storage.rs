//! Local file storage for uploaded packages and preview images.
//!
//! Files are addressed by keys relative to the data directory, which is what
//! the database stores.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Storage rooted at the configured data directory.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the directories written to at runtime.
    pub async fn ensure_dirs(&self) -> AppResult<()> {
        for dir in ["uploads", "previews/tmp"] {
            tokio::fs::create_dir_all(self.root.join(dir))
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create {}: {}", dir, e)))?;
        }
        info!("Storage initialized at {}", self.root.display());
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Detect the image type from its leading bytes.
    pub fn image_content_type(data: &[u8]) -> Option<&'static str> {
        if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some("image/png")
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some("image/jpeg")
        } else {
            None
        }
    }

    /// Key of an uploaded package.
    ///
    /// Format: uploads/{uuid}.zip
    pub fn upload_key(id: Uuid) -> String {
        format!("uploads/{}.zip", id.simple())
    }

    /// Key of an image uploaded before it is attached to an add-on.
    pub fn temp_image_key(upload_hash: &str) -> String {
        format!("previews/tmp/{}", upload_hash)
    }

    /// Format: previews/{addon_id}/{preview_id}.png
    pub fn preview_key(addon_id: i64, preview_id: i64) -> String {
        format!("previews/{}/{}.png", addon_id, preview_id)
    }

    /// Open a new file for `key`, creating parent directories.
    pub async fn create(&self, key: &str) -> AppResult<tokio::fs::File> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Storage(format!("Failed to create directory for {}: {}", key, e))
            })?;
        }
        tokio::fs::File::create(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create file {}: {}", key, e)))
    }

    pub async fn put(&self, key: &str, data: &[u8]) -> AppResult<()> {
        let mut file = self.create(key).await?;
        file.write_all(data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", key, e)))?;
        file.flush()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to flush {}: {}", key, e)))
    }

    pub async fn exists(&self, key: &str) -> bool {
        tokio::fs::try_exists(self.path(key)).await.unwrap_or(false)
    }

    /// Delete a file. Returns whether it existed.
    pub async fn delete(&self, key: &str) -> AppResult<bool> {
        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::Storage(format!("Failed to delete {}: {}", key, e))),
        }
    }

    /// Attach an uploaded image to a preview.
    pub async fn attach_preview(
        &self,
        upload_hash: &str,
        addon_id: i64,
        preview_id: i64,
    ) -> AppResult<()> {
        let from = self.path(&Self::temp_image_key(upload_hash));
        let key = Self::preview_key(addon_id, preview_id);
        let to = self.path(&key);
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&from, &to).await.map_err(|e| {
            AppError::Storage(format!("Failed to move image {} to {}: {}", upload_hash, key, e))
        })
    }

    pub async fn delete_preview(&self, addon_id: i64, preview_id: i64) -> AppResult<bool> {
        self.delete(&Self::preview_key(addon_id, preview_id)).await
    }
}
