/// Receives progress for batch operations. All methods default to no-ops.
pub trait ProgressSink: Send + Sync {
    /// A batch of `total` items is starting.
    fn begin(&self, _phase: &str, _total: usize) {}

    /// One item finished, successfully or not.
    fn item_done(&self, _label: &str, _success: bool) {}

    fn finish(&self) {}
}

/// Progress sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}
