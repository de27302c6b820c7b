//! Blob storage: poll images.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::error::ErrorCode;

/// Upload chunk size reported by `MemoryBlobStorage` progress callbacks.
pub const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("blob storage unavailable: {0}")]
    Unavailable(String),
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("upload rejected: {0}")]
    Rejected(String),
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "E_STORAGE_UNAVAILABLE",
            Self::NotFound(_) => "E_BLOB_NOT_FOUND",
            Self::Rejected(_) => "E_UPLOAD_REJECTED",
        }
    }
}

/// Bytes transferred so far out of the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Whole percent, 100 for an empty upload.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        u8::try_from(self.bytes_transferred.min(self.total_bytes) * 100 / self.total_bytes)
            .unwrap_or(100)
    }
}

pub type ProgressFn<'a> = &'a (dyn Fn(UploadProgress) + Send + Sync);

#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        progress: ProgressFn<'_>,
    ) -> Result<(), StorageError>;

    async fn download_url(&self, path: &str) -> Result<String, StorageError>;
}

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
struct BlobInner {
    blobs: BTreeMap<String, StoredBlob>,
    offline: bool,
}

/// In-memory blob storage. URLs use the `memory://` scheme.
#[derive(Clone, Default)]
pub struct MemoryBlobStorage {
    inner: Arc<Mutex<BlobInner>>,
}

impl MemoryBlobStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    #[must_use]
    pub fn blob(&self, path: &str) -> Option<StoredBlob> {
        self.lock().blobs.get(path).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, BlobInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        progress: ProgressFn<'_>,
    ) -> Result<(), StorageError> {
        if self.lock().offline {
            return Err(StorageError::Unavailable("storage is offline".into()));
        }
        if !content_type.starts_with("image/") {
            return Err(StorageError::Rejected(format!("{content_type} is not an image")));
        }
        let total = bytes.len() as u64;
        let mut transferred = 0u64;
        progress(UploadProgress { bytes_transferred: transferred, total_bytes: total });
        for chunk in bytes.chunks(CHUNK_SIZE) {
            transferred += chunk.len() as u64;
            progress(UploadProgress { bytes_transferred: transferred, total_bytes: total });
            tokio::task::yield_now().await;
        }
        debug!(%path, total, "blob uploaded");
        self.lock()
            .blobs
            .insert(path.to_string(), StoredBlob { content_type: content_type.to_string(), bytes });
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String, StorageError> {
        let inner = self.lock();
        if inner.offline {
            return Err(StorageError::Unavailable("storage is offline".into()));
        }
        if !inner.blobs.contains_key(path) {
            return Err(StorageError::NotFound(path.to_string()));
        }
        Ok(format!("memory://{path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_reports_progress_to_completion() {
        let storage = MemoryBlobStorage::new();
        let seen = Mutex::new(Vec::new());
        let record = |p: UploadProgress| seen.lock().unwrap().push(p.percent());
        storage
            .upload("images/a.png", vec![0; CHUNK_SIZE * 2 + 1], "image/png", &record)
            .await
            .unwrap();
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert_eq!(seen.len(), 4);
        assert_eq!(storage.download_url("images/a.png").await.unwrap(), "memory://images/a.png");
    }

    #[tokio::test]
    async fn non_image_rejected() {
        let storage = MemoryBlobStorage::new();
        let result = storage.upload("images/a.txt", vec![1], "text/plain", &|_: UploadProgress| {}).await;
        assert!(matches!(result, Err(StorageError::Rejected(_))));
    }

    #[tokio::test]
    async fn missing_blob_has_no_url() {
        let storage = MemoryBlobStorage::new();
        assert!(matches!(
            storage.download_url("images/x").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn empty_upload_is_complete() {
        assert_eq!(UploadProgress { bytes_transferred: 0, total_bytes: 0 }.percent(), 100);
        assert_eq!(UploadProgress { bytes_transferred: 5, total_bytes: 10 }.percent(), 50);
    }
}
