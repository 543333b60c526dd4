//! Document store abstraction trait

use async_trait::async_trait;
use thiserror::Error;
use vaultlift_core::{AppError, FileRef};

/// Document store errors
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid vault path: {0}")]
    InvalidPath(String),

    #[error("File is not valid UTF-8 text: {0}")]
    NotText(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for document store operations
pub type VaultResult<T> = Result<T, VaultError>;

impl From<VaultError> for AppError {
    fn from(err: VaultError) -> Self {
        AppError::Vault(err.to_string())
    }
}

/// Document store abstraction
///
/// The pipelines never cache document bodies: every rewrite is a fresh
/// read-modify-write through this trait.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read_text(&self, path: &str) -> VaultResult<String>;

    async fn read_bytes(&self, path: &str) -> VaultResult<Vec<u8>>;

    async fn write_text(&self, path: &str, content: &str) -> VaultResult<()>;

    async fn delete_file(&self, path: &str) -> VaultResult<()>;

    /// Every file in the vault, in stable path order.
    async fn list_all_files(&self) -> VaultResult<Vec<FileRef>>;

    async fn list_markdown_files(&self) -> VaultResult<Vec<FileRef>> {
        Ok(self
            .list_all_files()
            .await?
            .into_iter()
            .filter(FileRef::is_markdown)
            .collect())
    }

    /// The document the operator is focused on, if any.
    fn active_file(&self) -> Option<FileRef>;

    /// Look up an existing file by vault-relative path.
    async fn resolve_path(&self, path: &str) -> VaultResult<Option<FileRef>>;
}
