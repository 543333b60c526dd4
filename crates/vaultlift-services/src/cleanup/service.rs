use crate::cleanup::collector::collect_referenced_keys;
use crate::cleanup::inventory::list_remote_objects;
use crate::progress::ProgressSink;
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vaultlift_core::{AppError, CleanupState, LogLevel, ReconciliationResult, UploadSettings};
use vaultlift_storage::{RemoteStore, StorageError};
use vaultlift_vault::DocumentStore;

/// Gate consulted before anything is removed from the bucket.
pub trait Confirm: Send + Sync {
    /// Return `true` to remove every key in `unused`.
    fn confirm(&self, unused: &[String]) -> bool;
}

/// Outcome of the inventory, normalize and diff phases.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupPlan {
    pub inventory: Vec<String>,
    pub referenced: BTreeSet<String>,
    pub unused: Vec<String>,
}

/// Terminal report of an interactive cleanup run.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    pub state: CleanupState,
    pub inventory: usize,
    pub referenced: usize,
    pub unused: Vec<String>,
    pub result: ReconciliationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CleanupReport {
    fn new() -> Self {
        CleanupReport {
            state: CleanupState::Ready,
            inventory: 0,
            referenced: 0,
            unused: Vec::new(),
            result: ReconciliationResult::default(),
            error: None,
        }
    }

    fn transition(&mut self, next: CleanupState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid cleanup transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "Cleanup state changed");
        self.state = next;
    }

    fn fail(&mut self, error: AppError) {
        match error.log_level() {
            LogLevel::Warn => {
                tracing::warn!(error = %error, code = error.error_code(), state = %self.state, "Cleanup failed")
            }
            LogLevel::Error => {
                tracing::error!(error = %error, code = error.error_code(), state = %self.state, "Cleanup failed")
            }
        }
        self.error = Some(error.to_string());
        self.transition(CleanupState::Errored);
    }
}

/// Removes remote objects no vault document references any more.
#[derive(Clone)]
pub struct CleanupService {
    vault: Arc<dyn DocumentStore>,
    storage: Arc<dyn RemoteStore>,
    settings: UploadSettings,
}

impl CleanupService {
    pub fn new(
        vault: Arc<dyn DocumentStore>,
        storage: Arc<dyn RemoteStore>,
        settings: UploadSettings,
    ) -> Self {
        Self {
            vault,
            storage,
            settings,
        }
    }

    /// List the bucket, collect references and compute the unused keys.
    /// Nothing is modified.
    #[tracing::instrument(skip(self), fields(cleanup.operation = "scan"))]
    pub async fn scan(&self) -> Result<CleanupPlan, AppError> {
        self.settings.validate()?;

        let inventory = list_remote_objects(self.storage.as_ref(), &self.settings).await?;
        let collected = collect_referenced_keys(self.vault.as_ref(), &self.settings).await?;
        let referenced = normalize_references(&collected, &inventory, &self.settings);
        let unused = find_unused(&inventory, &referenced, &self.settings);

        tracing::info!(
            inventory = inventory.len(),
            referenced = referenced.len(),
            unused = unused.len(),
            "Cleanup scan finished"
        );

        Ok(CleanupPlan {
            inventory,
            referenced,
            unused,
        })
    }

    /// Remove `unused` one key at a time, checking `cancel` before each.
    ///
    /// Per-object failures are tallied in `result` and the loop goes on. A
    /// configuration or credential failure stops the run with an error; the
    /// tally so far stays in `result`.
    #[tracing::instrument(skip_all, fields(cleanup.operation = "execute", count = unused.len()))]
    pub async fn execute(
        &self,
        unused: &[String],
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
        result: &mut ReconciliationResult,
    ) -> Result<(), AppError> {
        let mut last_stamp = 0i64;

        progress.begin("cleanup", unused.len());
        for key in unused {
            if cancel.is_cancelled() {
                tracing::info!(processed = result.processed, "Cleanup cancelled");
                result.cancelled = true;
                break;
            }

            let stamp = Utc::now().timestamp_millis().max(last_stamp + 1);
            last_stamp = stamp;

            let outcome = self.remove_object(key, stamp).await;
            result.processed += 1;
            match outcome {
                Ok(()) => {
                    result.deleted += 1;
                    progress.item_done(key, true);
                }
                Err(StorageError::ConfigError(msg)) => {
                    result.failed += 1;
                    progress.item_done(key, false);
                    progress.finish();
                    return Err(AppError::Configuration(msg));
                }
                Err(e) => {
                    tracing::warn!(error = %e, key = %key, "Failed to remove unused object");
                    result.failed += 1;
                    progress.item_done(key, false);
                }
            }
        }
        progress.finish();

        tracing::info!(
            processed = result.processed,
            deleted = result.deleted,
            failed = result.failed,
            cancelled = result.cancelled,
            "Cleanup execution finished"
        );
        Ok(())
    }

    /// Soft delete copies to the trash first and only deletes once the copy
    /// succeeded.
    async fn remove_object(&self, key: &str, stamp: i64) -> Result<(), StorageError> {
        if self.settings.move_to_trash {
            let trash_key = trash_key_for(key, &self.settings.trash_path, stamp);
            self.storage.copy_object(key, &trash_key).await?;
            tracing::debug!(key = %key, trash_key = %trash_key, "Object copied to trash");
        }
        self.storage.delete_object(key).await
    }

    /// Full interactive run: scan, confirm, execute.
    ///
    /// Never returns an error; failures end in [`CleanupState::Errored`] with
    /// the message in the report.
    #[tracing::instrument(skip_all, fields(cleanup.operation = "run"))]
    pub async fn run(
        &self,
        confirm: &dyn Confirm,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> CleanupReport {
        let mut report = CleanupReport::new();
        report.transition(CleanupState::Scanning);

        if cancel.is_cancelled() {
            report.result.cancelled = true;
            report.transition(CleanupState::Cancelled);
            return report;
        }

        let plan = match self.scan().await {
            Ok(plan) => plan,
            Err(e) => {
                report.fail(e);
                return report;
            }
        };
        report.inventory = plan.inventory.len();
        report.referenced = plan.referenced.len();
        report.unused = plan.unused;

        if cancel.is_cancelled() {
            report.result.cancelled = true;
            report.transition(CleanupState::Cancelled);
            return report;
        }

        if report.unused.is_empty() {
            tracing::info!("No unused remote objects, nothing to do");
            report.transition(CleanupState::Completed);
            return report;
        }

        report.transition(CleanupState::AwaitingConfirmation);
        if !confirm.confirm(&report.unused) || cancel.is_cancelled() {
            tracing::info!(unused = report.unused.len(), "Cleanup not confirmed");
            report.result.cancelled = true;
            report.transition(CleanupState::Cancelled);
            return report;
        }

        report.transition(CleanupState::Executing);
        let mut result = ReconciliationResult::default();
        let outcome = self
            .execute(&report.unused, cancel, progress, &mut result)
            .await;
        report.result = result;

        match outcome {
            Err(e) => report.fail(e),
            Ok(()) if report.result.cancelled => report.transition(CleanupState::Cancelled),
            Ok(()) => report.transition(CleanupState::Completed),
        }
        report
    }
}

/// `{trash}/{basename}_{stamp}`.
fn trash_key_for(key: &str, trash_path: &str, stamp: i64) -> String {
    let name = key.rsplit('/').next().unwrap_or(key);
    format!("{}/{}_{}", trash_path.trim_matches('/'), name, stamp)
}

/// Widen collected references so that a live object is never reported unused.
///
/// Adds each reference without a leading `bucket/` and without a leading
/// `folder/` segment, and every inventory key that a reference ends with.
pub fn normalize_references(
    collected: &BTreeSet<String>,
    inventory: &[String],
    settings: &UploadSettings,
) -> BTreeSet<String> {
    let bucket_prefix = format!("{}/", settings.bucket_name.trim_matches('/'));
    let folder = settings.folder_path.trim_matches('/');
    let folder_prefix = (!folder.is_empty()).then(|| format!("{}/", folder));

    let mut normalized = BTreeSet::new();
    for reference in collected {
        normalized.insert(reference.clone());

        let without_bucket = reference.strip_prefix(&bucket_prefix);
        if let Some(stripped) = without_bucket {
            normalized.insert(stripped.to_string());
        }

        if let Some(prefix) = &folder_prefix {
            for candidate in [Some(reference.as_str()), without_bucket].into_iter().flatten() {
                if let Some(stripped) = candidate.strip_prefix(prefix.as_str()) {
                    normalized.insert(stripped.to_string());
                }
            }
        }
    }

    for key in inventory {
        if collected.iter().any(|reference| reference.ends_with(key.as_str())) {
            normalized.insert(key.clone());
        }
    }

    normalized
}

/// Inventory keys absent from `referenced`, directly and as `folder/key`.
/// Keeps inventory order.
pub fn find_unused(
    inventory: &[String],
    referenced: &BTreeSet<String>,
    settings: &UploadSettings,
) -> Vec<String> {
    let folder = settings.folder_path.trim_matches('/');
    inventory
        .iter()
        .filter(|key| {
            if referenced.contains(key.as_str()) {
                return false;
            }
            folder.is_empty() || !referenced.contains(&format!("{}/{}", folder, key))
        })
        .cloned()
        .collect()
}
