use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFailure {
    pub file: String,
    pub attempts: u32,
    pub message: String,
}

/// Outcome of a batch upload. Every attachment lands in exactly one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// References that did not resolve to an uploadable vault file.
    pub skipped: usize,
    pub uploaded: Vec<UploadedAttachment>,
    pub failures: Vec<UploadFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAttachment {
    pub file: String,
    pub url: String,
}

impl UploadSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}
