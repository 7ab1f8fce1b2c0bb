//! Blob storage for uploaded product images.
//!
//! A [`BlobStore`] accepts raw upload bytes and returns the reference that
//! gets persisted on the product or image row. [`LocalBlobStore`] writes to
//! a directory served under a URL prefix (`/media` by default) and hands
//! back relative paths, which the presentation layer later resolves into
//! absolute URLs.

use std::path::PathBuf;

use async_trait::async_trait;
use image::ImageFormat;

use crate::error::CoreError;

/// File extensions accepted for image uploads.
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Subdirectory (under the media root) that product images are written to.
pub const PRODUCT_IMAGE_DIR: &str = "products";

/// One uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Lowercased extension of the client-supplied file name, if any.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.file_name.rsplit_once('.')?;
        Some(ext.to_ascii_lowercase())
    }
}

/// Check that an upload is a supported image, returning the sniffed format.
///
/// Both the file name extension and the leading magic bytes must agree on
/// one of the supported formats.
pub fn validate_image_upload(upload: &Upload) -> Result<ImageFormat, CoreError> {
    let ext = upload.extension().unwrap_or_default();
    if !ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CoreError::Validation(format!(
            "Unsupported image extension '.{ext}' for '{}'. Supported: {}",
            upload.file_name,
            ALLOWED_IMAGE_EXTENSIONS.join(", ")
        )));
    }
    if upload.bytes.is_empty() {
        return Err(CoreError::Validation(format!(
            "The submitted file '{}' is empty.",
            upload.file_name
        )));
    }

    let invalid = || {
        CoreError::Validation(format!(
            "Upload a valid image. '{}' is either not an image or a corrupted image.",
            upload.file_name
        ))
    };
    let format = image::guess_format(&upload.bytes).map_err(|_| invalid())?;
    match format {
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP => Ok(format),
        _ => Err(invalid()),
    }
}

/// Destination for uploaded image bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist `upload` and return the reference to store on the row.
    async fn store(&self, upload: &Upload) -> Result<String, CoreError>;

    /// Best-effort removal of a previously stored blob.
    async fn remove(&self, reference: &str) -> Result<(), CoreError>;
}

/// Filesystem-backed blob store.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalBlobStore {
    /// Store files under `root`, referenced as `{url_prefix}/{relative path}`.
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let url_prefix = url_prefix.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            url_prefix,
        }
    }

    /// Map a stored reference back to its file path, if it belongs to this store.
    fn path_for(&self, reference: &str) -> Option<PathBuf> {
        let relative = reference
            .strip_prefix(&self.url_prefix)?
            .trim_start_matches('/');
        if relative.is_empty() || relative.split('/').any(|part| part == "..") {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, upload: &Upload) -> Result<String, CoreError> {
        let format = validate_image_upload(upload)?;
        let ext = format.extensions_str().first().copied().unwrap_or("img");

        let dir = self.root.join(PRODUCT_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to create {}: {e}", dir.display())))?;

        let file_name = format!("{}.{ext}", uuid::Uuid::new_v4());
        let path = dir.join(&file_name);
        tokio::fs::write(&path, &upload.bytes)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to write {}: {e}", path.display())))?;

        tracing::debug!(path = %path.display(), bytes = upload.bytes.len(), "Stored image upload");
        Ok(format!("{}/{PRODUCT_IMAGE_DIR}/{file_name}", self.url_prefix))
    }

    async fn remove(&self, reference: &str) -> Result<(), CoreError> {
        let Some(path) = self.path_for(reference) else {
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Internal(format!(
                "Failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}
