// Recovery policy for adaptive-streaming errors.
//
// Live streams over imperfect networks produce frequent transient errors;
// only genuinely unrecoverable ones may surface to the user. Everything
// else self-heals: non-fatal errors get a watchdog nudge, fatal media
// errors use the engine's in-place decoder recovery, fatal network errors
// re-arm the segment loader.

use crate::events::{EngineError, ErrorCategory};

/// What the session should do about an engine error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Attempt forward progress without restarting anything.
    Nudge,
    /// Reset the decode pipeline in place.
    RecoverMedia,
    /// Re-arm the segment loader (soft retry).
    RearmLoader,
    /// Unrecoverable: end the session with an error status.
    Fail,
}

pub fn classify(error: &EngineError) -> RecoveryAction {
    if !error.fatal {
        return RecoveryAction::Nudge;
    }
    match error.category {
        ErrorCategory::Media => RecoveryAction::RecoverMedia,
        ErrorCategory::Network => RecoveryAction::RearmLoader,
        ErrorCategory::Mux | ErrorCategory::Key | ErrorCategory::Other => RecoveryAction::Fail,
    }
}
