//! Object storage behind a small file-service interface.
//!
//! `ObjectStore` is the seam any bucket SDK plugs into; `FileService` holds
//! the media-library rules (key layout, classification, rename) on top of it.

mod files;
mod memory;
mod s3;

pub use files::{
    classify, rewrite_urls, FileKind, FileService, RenameOutcome, StorageUsage, StoredFile,
    UploadedFile, UPLOAD_PREFIX,
};
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("file exceeds the upload limit of {max} bytes")]
    TooLarge { max: usize },

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Message shown to the admin client.
    pub fn user_message(&self) -> String {
        match self {
            StorageError::NotFound(_) => "File not found".to_string(),
            StorageError::AccessDenied(_) => "Access to the storage bucket was denied".to_string(),
            StorageError::InvalidRequest(msg) => msg.clone(),
            StorageError::TooLarge { .. } => self.to_string(),
            StorageError::Backend(msg) => format!("Storage operation failed: {}", msg),
        }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object with public-read visibility.
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Every object under `prefix`, across all result pages.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Server-side copy; the copy is public-read.
    async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Cheap reachability probe used by the health endpoint.
    async fn ping(&self) -> Result<(), StorageError>;

    fn backend(&self) -> &'static str;
}
