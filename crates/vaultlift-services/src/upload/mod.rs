pub mod rewriter;
pub mod service;

pub use rewriter::{rewrite_document, ReferenceRewriter};
pub use service::UploadService;
