//! Remote store abstraction trait
//!
//! This module defines the RemoteStore trait the services program against.

use async_trait::async_trait;
use thiserror::Error;
use vaultlift_core::AppError;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Copy failed: {0}")]
    CopyFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConfigError(msg) => AppError::Configuration(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// One page of a listing. `next_token` is `None` on the last page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<String>,
    pub next_token: Option<String>,
}

/// Remote object store abstraction
///
/// Every client is bound to one bucket. Calls are independent awaits; the
/// services never issue two at once.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Write `body` under `key` with the given content type.
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> StorageResult<()>;

    /// Connectivity probe. Fails when the bucket is unreachable or credentials are rejected.
    async fn head_bucket(&self) -> StorageResult<()>;

    /// List keys under `prefix` (empty for the whole bucket), resuming after
    /// `continuation_token` when given.
    async fn list_objects_page(
        &self,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> StorageResult<ListPage>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete_object(&self, key: &str) -> StorageResult<()>;

    /// Server-side copy within the bucket.
    async fn copy_object(&self, source_key: &str, dest_key: &str) -> StorageResult<()>;

    /// Bucket this client is bound to.
    fn bucket(&self) -> &str;
}
