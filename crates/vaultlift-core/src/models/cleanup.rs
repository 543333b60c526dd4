use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Tally of one cleanup execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub processed: usize,
    pub deleted: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Lifecycle of an interactive cleanup run.
///
/// `Ready -> Scanning -> AwaitingConfirmation -> Executing -> {Completed | Cancelled | Errored}`.
/// `Scanning` may also end in `Completed` (nothing to do), `Cancelled` or `Errored`, and
/// `AwaitingConfirmation` may end in `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupState {
    Ready,
    Scanning,
    AwaitingConfirmation,
    Executing,
    Completed,
    Cancelled,
    Errored,
}

impl CleanupState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CleanupState::Completed | CleanupState::Cancelled | CleanupState::Errored
        )
    }

    pub fn can_transition_to(self, next: CleanupState) -> bool {
        use CleanupState::*;
        matches!(
            (self, next),
            (Ready, Scanning)
                | (Scanning, AwaitingConfirmation)
                | (Scanning, Completed)
                | (Scanning, Cancelled)
                | (Scanning, Errored)
                | (AwaitingConfirmation, Executing)
                | (AwaitingConfirmation, Cancelled)
                | (Executing, Completed)
                | (Executing, Cancelled)
                | (Executing, Errored)
        )
    }
}

impl Display for CleanupState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            CleanupState::Ready => "ready",
            CleanupState::Scanning => "scanning",
            CleanupState::AwaitingConfirmation => "awaiting_confirmation",
            CleanupState::Executing => "executing",
            CleanupState::Completed => "completed",
            CleanupState::Cancelled => "cancelled",
            CleanupState::Errored => "errored",
        };
        write!(f, "{}", name)
    }
}
