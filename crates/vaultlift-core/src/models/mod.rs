pub mod attachment;
pub mod cleanup;
pub mod file;
pub mod upload;

pub use attachment::{AttachmentReference, LinkSyntax};
pub use cleanup::{CleanupState, ReconciliationResult};
pub use file::FileRef;
pub use upload::{UploadFailure, UploadSummary, UploadedAttachment};
