use crate::traits::{ListPage, RemoteStore, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{
    Attribute, Attributes, ObjectMeta, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::sync::Arc;
use vaultlift_core::UploadSettings;

/// Maximum number of keys returned per listing page (matches S3 ListObjectsV2).
pub const LIST_PAGE_SIZE: usize = 1000;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance from explicit settings.
    ///
    /// Credentials come from the settings only, never from the ambient AWS
    /// environment, so a vault without credentials stays disabled.
    /// `endpoint` selects an S3-compatible provider
    /// (e.g. "http://localhost:9000" for MinIO).
    pub fn new(settings: &UploadSettings) -> StorageResult<Self> {
        settings
            .validate()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let mut builder = AmazonS3Builder::new()
            .with_region(settings.region.clone())
            .with_bucket_name(settings.bucket_name.clone())
            .with_access_key_id(settings.access_key_id.clone())
            .with_secret_access_key(settings.secret_access_key.clone());

        if let Some(ref endpoint) = settings.endpoint {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        } else {
            builder = builder.with_virtual_hosted_style_request(!settings.use_path_style);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store: Arc::new(store),
            bucket: settings.bucket_name.clone(),
        })
    }

    /// In-process store with the same semantics, for dry runs and tests.
    pub fn in_memory(bucket: impl Into<String>) -> Self {
        Self::from_store(Arc::new(InMemory::new()), bucket)
    }

    pub fn from_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        S3Storage {
            store,
            bucket: bucket.into(),
        }
    }

    fn location(key: &str) -> StorageResult<Path> {
        if key.is_empty()
            || key.starts_with('/')
            || key.ends_with('/')
            || key.split('/').any(|part| part == "..")
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        // The stored key must equal `key` exactly; no segment rewriting.
        Path::parse(key).map_err(|_| StorageError::InvalidKey(key.to_string()))
    }
}

#[async_trait]
impl RemoteStore for S3Storage {
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> StorageResult<()> {
        let location = Self::location(key)?;
        let size = body.len() as u64;
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());

        let result: ObjectResult<_> = self
            .store
            .put_opts(
                &location,
                PutPayload::from(Bytes::from(body)),
                PutOptions::from(attributes),
            )
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn head_bucket(&self) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let result: ObjectResult<_> = self.store.list_with_delimiter(None).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 connectivity check failed"
            );
            StorageError::BackendError(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 connectivity check successful"
        );

        Ok(())
    }

    async fn list_objects_page(
        &self,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> StorageResult<ListPage> {
        let start = std::time::Instant::now();
        let prefix_path = match prefix.trim_matches('/') {
            "" => None,
            p => Some(Path::from(p)),
        };

        let offset = continuation_token.map(Self::location).transpose()?;

        let stream = match offset {
            Some(ref offset) => self.store.list_with_offset(prefix_path.as_ref(), offset),
            None => self.store.list(prefix_path.as_ref()),
        };

        let metas: Vec<ObjectMeta> = stream
            .take(LIST_PAGE_SIZE)
            .try_collect()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    prefix = %prefix,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 list failed"
                );
                StorageError::ListFailed(e.to_string())
            })?;

        let keys: Vec<String> = metas
            .into_iter()
            .map(|meta| meta.location.to_string())
            .collect();
        let next_token = if keys.len() == LIST_PAGE_SIZE {
            keys.last().cloned()
        } else {
            None
        };

        tracing::debug!(
            bucket = %self.bucket,
            prefix = %prefix,
            count = keys.len(),
            has_more = next_token.is_some(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 list page fetched"
        );

        Ok(ListPage { keys, next_token })
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let location = Self::location(key)?;

        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 delete failed"
            );
            StorageError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn copy_object(&self, source_key: &str, dest_key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let from = Self::location(source_key)?;
        let to = Self::location(dest_key)?;

        let copy_result: ObjectResult<_> = self.store.copy(&from, &to).await;

        copy_result.map_err(|e| match e {
            object_store::Error::NotFound { .. } => StorageError::NotFound(source_key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    from_key = %source_key,
                    to_key = %dest_key,
                    "S3 copy failed"
                );
                StorageError::CopyFailed(other.to_string())
            }
        })?;

        tracing::info!(
            from_key = %source_key,
            to_key = %dest_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 copy successful"
        );

        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
