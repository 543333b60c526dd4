//! Vaultlift Core Library
//!
//! Domain models, settings, error types and the pure pieces of the attachment
//! pipeline (link extraction and remote key mapping) shared by every vaultlift
//! crate. Nothing in here performs I/O.

pub mod config;
pub mod content_type;
pub mod error;
pub mod keys;
pub mod links;
pub mod models;

// Re-export commonly used types
pub use config::UploadSettings;
pub use content_type::content_type_for;
pub use error::{AppError, LogLevel};
pub use keys::{compute_key, compute_url, format_date, key_from_url, sanitize_file_name};
pub use links::{extract_attachment_paths, extract_attachment_references};
pub use models::{
    AttachmentReference, CleanupState, FileRef, LinkSyntax, ReconciliationResult, UploadFailure,
    UploadSummary, UploadedAttachment,
};
