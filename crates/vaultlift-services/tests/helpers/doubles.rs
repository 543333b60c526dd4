use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use vaultlift_services::{
    Confirm, ProgressSink, RemoteStore, S3Storage, StorageError,
};
use vaultlift_core::FileRef;
use vaultlift_storage::{ListPage, StorageResult};
use vaultlift_vault::{DocumentStore, FsVault, VaultError, VaultResult};

/// Remote store that fails on demand and forwards everything else.
pub struct FlakyStore {
    inner: S3Storage,
    put_failures_left: AtomicUsize,
    pub put_attempts: AtomicUsize,
    fail_listing: bool,
    failing_deletes: HashSet<String>,
    reject_credentials: bool,
}

impl FlakyStore {
    pub fn new(inner: S3Storage) -> Self {
        FlakyStore {
            inner,
            put_failures_left: AtomicUsize::new(0),
            put_attempts: AtomicUsize::new(0),
            fail_listing: false,
            failing_deletes: HashSet::new(),
            reject_credentials: false,
        }
    }

    /// The next `n` uploads fail.
    pub fn failing_puts(self, n: usize) -> Self {
        self.put_failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn failing_delete(mut self, key: &str) -> Self {
        self.failing_deletes.insert(key.to_string());
        self
    }

    /// Every write or delete fails as if the credentials were revoked.
    pub fn rejecting_credentials(mut self) -> Self {
        self.reject_credentials = true;
        self
    }

    pub fn inner(&self) -> &S3Storage {
        &self.inner
    }
}

#[async_trait]
impl RemoteStore for FlakyStore {
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> StorageResult<()> {
        self.put_attempts.fetch_add(1, Ordering::SeqCst);
        if self.reject_credentials {
            return Err(StorageError::ConfigError("access denied".to_string()));
        }
        let failing = self
            .put_failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StorageError::UploadFailed("connection reset".to_string()));
        }
        self.inner.put_object(key, body, content_type).await
    }

    async fn head_bucket(&self) -> StorageResult<()> {
        self.inner.head_bucket().await
    }

    async fn list_objects_page(
        &self,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> StorageResult<ListPage> {
        if self.fail_listing {
            return Err(StorageError::ListFailed("503 Slow Down".to_string()));
        }
        self.inner
            .list_objects_page(prefix, continuation_token)
            .await
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        if self.reject_credentials {
            return Err(StorageError::ConfigError("access denied".to_string()));
        }
        if self.failing_deletes.contains(key) {
            return Err(StorageError::DeleteFailed(format!("{} is locked", key)));
        }
        self.inner.delete_object(key).await
    }

    async fn copy_object(&self, source_key: &str, dest_key: &str) -> StorageResult<()> {
        self.inner.copy_object(source_key, dest_key).await
    }

    fn bucket(&self) -> &str {
        self.inner.bucket()
    }
}

/// Vault whose document writes fail; reads and deletes go through.
pub struct ReadOnlyNotes {
    inner: Arc<FsVault>,
    pub write_attempts: AtomicUsize,
}

impl ReadOnlyNotes {
    pub fn new(inner: Arc<FsVault>) -> Self {
        ReadOnlyNotes {
            inner,
            write_attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DocumentStore for ReadOnlyNotes {
    async fn read_text(&self, path: &str) -> VaultResult<String> {
        self.inner.read_text(path).await
    }

    async fn read_bytes(&self, path: &str) -> VaultResult<Vec<u8>> {
        self.inner.read_bytes(path).await
    }

    async fn write_text(&self, _path: &str, _content: &str) -> VaultResult<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        Err(VaultError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only file system",
        )))
    }

    async fn delete_file(&self, path: &str) -> VaultResult<()> {
        self.inner.delete_file(path).await
    }

    async fn list_all_files(&self) -> VaultResult<Vec<FileRef>> {
        self.inner.list_all_files().await
    }

    fn active_file(&self) -> Option<FileRef> {
        self.inner.active_file()
    }

    async fn resolve_path(&self, path: &str) -> VaultResult<Option<FileRef>> {
        self.inner.resolve_path(path).await
    }
}

/// Confirmation gate with a fixed answer that remembers whether it was asked.
pub struct FixedAnswer {
    answer: bool,
    pub asked: AtomicBool,
    pub shown: Mutex<Vec<String>>,
}

impl FixedAnswer {
    pub fn yes() -> Self {
        Self::new(true)
    }

    pub fn no() -> Self {
        Self::new(false)
    }

    fn new(answer: bool) -> Self {
        FixedAnswer {
            answer,
            asked: AtomicBool::new(false),
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn was_asked(&self) -> bool {
        self.asked.load(Ordering::SeqCst)
    }
}

impl Confirm for FixedAnswer {
    fn confirm(&self, unused: &[String]) -> bool {
        self.asked.store(true, Ordering::SeqCst);
        self.shown.lock().unwrap().extend(unused.iter().cloned());
        self.answer
    }
}

/// Progress sink that raises the cancellation token after `after` items.
pub struct CancelAfter {
    token: CancellationToken,
    after: usize,
    seen: AtomicUsize,
}

impl CancelAfter {
    pub fn new(token: CancellationToken, after: usize) -> Self {
        CancelAfter {
            token,
            after,
            seen: AtomicUsize::new(0),
        }
    }
}

impl ProgressSink for CancelAfter {
    fn item_done(&self, _label: &str, _success: bool) {
        if self.seen.fetch_add(1, Ordering::SeqCst) + 1 == self.after {
            self.token.cancel();
        }
    }
}

/// Progress sink that records every event.
#[derive(Default)]
pub struct RecordingProgress {
    pub events: Mutex<Vec<String>>,
}

impl ProgressSink for RecordingProgress {
    fn begin(&self, phase: &str, total: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("begin {} {}", phase, total));
    }

    fn item_done(&self, label: &str, success: bool) {
        self.events
            .lock()
            .unwrap()
            .push(format!("{} {}", label, if success { "ok" } else { "failed" }));
    }

    fn finish(&self) {
        self.events.lock().unwrap().push("finish".to_string());
    }
}
