use crate::progress::ProgressSink;
use crate::upload::rewriter::ReferenceRewriter;
use chrono::Local;
use percent_encoding::percent_decode_str;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use vaultlift_core::{
    compute_key, compute_url, content_type_for, extract_attachment_paths, AppError, FileRef,
    UploadFailure, UploadSettings, UploadSummary, UploadedAttachment,
};
use vaultlift_storage::RemoteStore;
use vaultlift_vault::DocumentStore;

/// Base delay between upload attempts; attempt `n` waits `n` times this.
const RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Final error of an upload together with the attempts actually made.
struct RetryFailure {
    attempts: u32,
    error: AppError,
}

/// Moves local attachments to the remote store and repoints the notes that
/// reference them.
#[derive(Clone)]
pub struct UploadService {
    vault: Arc<dyn DocumentStore>,
    storage: Arc<dyn RemoteStore>,
    settings: UploadSettings,
    rewriter: ReferenceRewriter,
    retry_delay: Duration,
}

impl UploadService {
    pub fn new(
        vault: Arc<dyn DocumentStore>,
        storage: Arc<dyn RemoteStore>,
        settings: UploadSettings,
    ) -> Self {
        Self {
            rewriter: ReferenceRewriter::new(vault.clone()),
            vault,
            storage,
            settings,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Override the linear backoff unit.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    /// Upload one attachment, rewrite its references, then delete the local copy.
    ///
    /// Each attempt runs the whole sequence; the local file is only removed
    /// after both the remote write and the rewrite succeeded. Returns the
    /// attachment's public URL.
    pub async fn upload_and_replace(
        &self,
        attachment: &FileRef,
        target: Option<&FileRef>,
    ) -> Result<String, AppError> {
        self.settings.validate()?;
        self.upload_with_retries(attachment, target)
            .await
            .map_err(|failure| failure.error)
    }

    #[tracing::instrument(skip(self, attachment, target), fields(attachment = %attachment.path))]
    async fn upload_with_retries(
        &self,
        attachment: &FileRef,
        target: Option<&FileRef>,
    ) -> Result<String, RetryFailure> {
        let attempts = self.settings.retry_count.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.attempt_upload(attachment, target).await {
                Ok(url) => {
                    tracing::info!(
                        attachment = %attachment.path,
                        url = %url,
                        attempt,
                        "Attachment uploaded and references rewritten"
                    );
                    return Ok(url);
                }
                Err(e) if !e.is_recoverable() => {
                    tracing::error!(
                        error = %e,
                        attachment = %attachment.path,
                        attempt,
                        "Upload failed without retry, local file kept"
                    );
                    return Err(RetryFailure {
                        attempts: attempt,
                        error: e,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        attachment = %attachment.path,
                        attempt,
                        max_attempts = attempts,
                        "Upload attempt failed"
                    );
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(self.retry_delay * attempt).await;
                    }
                }
            }
        }

        tracing::error!(
            attachment = %attachment.path,
            attempts,
            error = %last_error,
            "Upload failed after all retries, local file kept"
        );

        Err(RetryFailure {
            attempts,
            error: AppError::UploadExhausted {
                file: attachment.name.clone(),
                attempts,
                message: last_error,
            },
        })
    }

    async fn attempt_upload(
        &self,
        attachment: &FileRef,
        target: Option<&FileRef>,
    ) -> Result<String, AppError> {
        let body = self.vault.read_bytes(&attachment.path).await?;
        let key = compute_key(&attachment.name, &self.settings, Local::now().naive_local());
        let url = compute_url(&key, &self.settings);
        let content_type = content_type_for(&attachment.extension);

        self.storage.put_object(&key, body, content_type).await?;
        self.rewriter
            .replace_references(attachment, &url, target)
            .await?;
        self.vault.delete_file(&attachment.path).await?;

        Ok(url)
    }

    /// Upload every attachment in the vault, one at a time in listing order.
    #[tracing::instrument(skip(self, progress))]
    pub async fn upload_all_attachments(
        &self,
        progress: &dyn ProgressSink,
    ) -> Result<UploadSummary, AppError> {
        self.settings.validate()?;

        let attachments: Vec<FileRef> = self
            .vault
            .list_all_files()
            .await?
            .into_iter()
            .filter(|file| self.is_attachment(file))
            .collect();

        tracing::info!(count = attachments.len(), "Uploading all vault attachments");
        Ok(self
            .upload_batch(&attachments, None, 0, progress)
            .await)
    }

    /// Upload the attachments referenced by the active document, in the
    /// order they appear in it.
    #[tracing::instrument(skip(self, progress))]
    pub async fn upload_current_file_attachments(
        &self,
        progress: &dyn ProgressSink,
    ) -> Result<UploadSummary, AppError> {
        self.settings.validate()?;

        let document = self
            .vault
            .active_file()
            .ok_or_else(|| AppError::InvalidInput("no active document".to_string()))?;
        let content = self.vault.read_text(&document.path).await?;
        let references = extract_attachment_paths(&content, &self.settings.allowed_extensions);

        let mut all_files: Option<Vec<FileRef>> = None;
        let mut seen = HashSet::new();
        let mut attachments = Vec::new();
        let mut skipped = 0;

        for reference in references {
            match self
                .resolve_attachment(&reference, &document, &mut all_files)
                .await?
            {
                Some(file) if self.is_attachment(&file) => {
                    if seen.insert(file.path.clone()) {
                        attachments.push(file);
                    }
                }
                _ => {
                    tracing::debug!(reference = %reference, "Reference is not a local attachment");
                    skipped += 1;
                }
            }
        }

        tracing::info!(
            document = %document.path,
            count = attachments.len(),
            skipped,
            "Uploading attachments of active document"
        );
        Ok(self
            .upload_batch(&attachments, Some(&document), skipped, progress)
            .await)
    }

    async fn upload_batch(
        &self,
        attachments: &[FileRef],
        target: Option<&FileRef>,
        skipped: usize,
        progress: &dyn ProgressSink,
    ) -> UploadSummary {
        let mut summary = UploadSummary {
            skipped,
            ..UploadSummary::default()
        };

        progress.begin("upload", attachments.len());
        for attachment in attachments {
            match self.upload_with_retries(attachment, target).await {
                Ok(url) => {
                    summary.succeeded += 1;
                    summary.uploaded.push(UploadedAttachment {
                        file: attachment.path.clone(),
                        url,
                    });
                    progress.item_done(&attachment.name, true);
                }
                Err(RetryFailure { attempts, error }) => {
                    summary.failed += 1;
                    let message = match error {
                        AppError::UploadExhausted { message, .. } => message,
                        other => other.to_string(),
                    };
                    summary.failures.push(UploadFailure {
                        file: attachment.path.clone(),
                        attempts,
                        message,
                    });
                    progress.item_done(&attachment.name, false);
                }
            }
        }
        progress.finish();

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "Upload batch finished"
        );
        summary
    }

    fn is_attachment(&self, file: &FileRef) -> bool {
        !file.is_markdown() && self.settings.is_allowed_extension(&file.extension)
    }

    /// Find the vault file a link target points at: the path as written, then
    /// relative to the document's folder, then a unique-by-name match anywhere
    /// in the vault (how wikilinks resolve).
    async fn resolve_attachment(
        &self,
        reference: &str,
        document: &FileRef,
        all_files: &mut Option<Vec<FileRef>>,
    ) -> Result<Option<FileRef>, AppError> {
        let decoded = percent_decode_str(reference).decode_utf8_lossy().into_owned();

        let mut candidates = vec![decoded.clone()];
        if !document.parent().is_empty() {
            candidates.push(format!("{}/{}", document.parent(), decoded));
        }
        if decoded != reference {
            candidates.push(reference.to_string());
        }

        for candidate in &candidates {
            if let Some(file) = self.vault.resolve_path(candidate).await? {
                return Ok(Some(file));
            }
        }

        let name = decoded.rsplit('/').next().unwrap_or(&decoded);
        if all_files.is_none() {
            *all_files = Some(self.vault.list_all_files().await?);
        }
        Ok(all_files
            .as_ref()
            .and_then(|files| files.iter().find(|file| file.name == name))
            .cloned())
    }
}
