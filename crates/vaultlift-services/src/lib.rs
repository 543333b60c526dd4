//! Vaultlift Services Layer
//!
//! Orchestration over the vault and the remote store: moving attachments to
//! the bucket and rewriting the notes that reference them (`upload`), and
//! reconciling the bucket against current references (`cleanup`). Each entry
//! point takes its settings explicitly; nothing here holds global state.

pub mod cleanup;
pub mod progress;
pub mod upload;

pub use cleanup::{
    collect_referenced_keys, find_unused, list_remote_objects, normalize_references,
    referenced_keys_in_text, CleanupPlan, CleanupReport, CleanupService, Confirm,
};
pub use progress::{NoProgress, ProgressSink};
pub use upload::{rewrite_document, ReferenceRewriter, UploadService};
pub use vaultlift_storage::{create_storage, RemoteStore, S3Storage, StorageError};
pub use vaultlift_vault::{DocumentStore, FsVault, VaultError};
