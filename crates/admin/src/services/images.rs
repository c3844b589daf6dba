//! Variant image storage.
//!
//! Uploaded images are written below a root directory as
//! `{root}/{folder}/{uuid}.{ext}` and addressed by the public URL
//! `{base_url}/{folder}/{uuid}.{ext}`.

use std::future::Future;
use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// File extensions accepted for uploads.
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "avif"];

/// Errors that can occur while storing images.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no files were uploaded")]
    Empty,

    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("invalid folder name: {0}")]
    InvalidFolder(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One file from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    /// Lowercased extension of the original file name.
    fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
    }
}

/// Storage backend for uploaded images.
pub trait ImageStorage: Send + Sync {
    /// Store `files` under `folder`, returning one public URL per file in
    /// upload order.
    fn upload(
        &self,
        folder: &str,
        files: Vec<UploadedImage>,
    ) -> impl Future<Output = Result<Vec<String>, StorageError>> + Send;
}

/// Image storage on the local filesystem, served by `ServeDir`.
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalImageStorage {
    /// Create a storage writing under `root` with URLs prefixed by `base_url`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl ImageStorage for LocalImageStorage {
    async fn upload(
        &self,
        folder: &str,
        files: Vec<UploadedImage>,
    ) -> Result<Vec<String>, StorageError> {
        if folder.is_empty()
            || !folder
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(StorageError::InvalidFolder(folder.to_string()));
        }
        if files.is_empty() {
            return Err(StorageError::Empty);
        }

        // Reject the whole batch before writing anything.
        let extensions = files
            .iter()
            .map(|file| {
                file.extension()
                    .ok_or_else(|| StorageError::UnsupportedType(file.file_name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await?;

        let mut batch = Vec::with_capacity(files.len());
        let mut urls = Vec::with_capacity(files.len());
        for (file, ext) in files.into_iter().zip(extensions) {
            let name = format!("{}.{ext}", Uuid::new_v4());
            urls.push(format!("{}/{folder}/{name}", self.base_url));
            batch.push((dir.join(name), file.bytes));
        }
        write_batch(&batch).await?;

        tracing::info!(folder, count = urls.len(), "images stored");
        Ok(urls)
    }
}

/// Write every file of a batch. If one write fails, the files written so far
/// (and any partial file) are removed before the error is returned.
async fn write_batch(batch: &[(PathBuf, Vec<u8>)]) -> std::io::Result<()> {
    for (done, (path, bytes)) in batch.iter().enumerate() {
        if let Err(err) = tokio::fs::write(path, bytes).await {
            for (written, _) in batch.iter().take(done + 1) {
                match tokio::fs::remove_file(written).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        tracing::warn!(path = %written.display(), error = %e, "failed to remove image");
                    }
                }
            }
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn image(name: &str) -> UploadedImage {
        UploadedImage {
            file_name: name.to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }
    }

    #[tokio::test]
    async fn test_upload_writes_files_and_returns_urls() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(dir.path(), "/uploads/");

        let urls = storage
            .upload("product-variants", vec![image("front.PNG"), image("back.jpg")])
            .await
            .unwrap();

        assert_eq!(urls.len(), 2);
        assert!(urls[0].starts_with("/uploads/product-variants/"));
        assert!(urls[0].ends_with(".png"));
        assert!(urls[1].ends_with(".jpg"));

        let stored = std::fs::read_dir(dir.path().join("product-variants"))
            .unwrap()
            .count();
        assert_eq!(stored, 2);
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_type() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(dir.path(), "/uploads");

        let err = storage
            .upload("product-variants", vec![image("a.png"), image("notes.txt")])
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::UnsupportedType(name) if name == "notes.txt"));
        assert!(!dir.path().join("product-variants").exists());
    }

    #[tokio::test]
    async fn test_upload_rejects_path_like_folder() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(dir.path(), "/uploads");

        let err = storage
            .upload("../etc", vec![image("a.png")])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidFolder(_)));
    }

    #[tokio::test]
    async fn test_failed_batch_removes_written_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.png");
        let batch = vec![
            (first.clone(), vec![1, 2, 3]),
            (dir.path().join("missing").join("second.png"), vec![4, 5, 6]),
        ];

        let err = write_batch(&batch).await.unwrap_err();

        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        assert!(!first.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(dir.path(), "/uploads");
        assert!(matches!(
            storage.upload("product-variants", vec![]).await,
            Err(StorageError::Empty)
        ));
    }
}
