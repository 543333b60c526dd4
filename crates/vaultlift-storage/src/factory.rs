#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{RemoteStore, StorageError, StorageResult};
use std::sync::Arc;
use vaultlift_core::UploadSettings;

/// Create the remote store client for the given settings.
///
/// Must be called again whenever credentials, region, bucket, endpoint or
/// path-style change; clients are never mutated in place.
pub fn create_storage(settings: &UploadSettings) -> StorageResult<Arc<dyn RemoteStore>> {
    settings
        .validate()
        .map_err(|e| StorageError::ConfigError(e.to_string()))?;

    #[cfg(feature = "storage-s3")]
    {
        let storage = S3Storage::new(settings)?;
        tracing::debug!(
            bucket = %settings.bucket_name,
            region = %settings.region,
            endpoint = ?settings.endpoint,
            path_style = settings.use_path_style,
            "Remote store client created"
        );
        Ok(Arc::new(storage))
    }

    #[cfg(not(feature = "storage-s3"))]
    Err(StorageError::ConfigError(
        "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
    ))
}
