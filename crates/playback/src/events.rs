// Engine callbacks represented as a tagged variant instead of ad hoc
// branching on opaque platform codes. The error classifier consumes these;
// see `classifier.rs` for the recovery policy.

use std::fmt;

/// Broad category of an engine-level error, mapped from the platform
/// engine's own taxonomy (hls.js ErrorTypes, AVPlayer failure domains).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Playlist or segment fetch failures.
    Network,
    /// Decode/media pipeline failures.
    Media,
    /// Container/remux failures.
    Mux,
    /// Key/session acquisition failures.
    Key,
    /// Anything the platform engine does not classify further.
    Other,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Media => "media",
            ErrorCategory::Mux => "mux",
            ErrorCategory::Key => "key",
            ErrorCategory::Other => "other",
        };
        f.write_str(s)
    }
}

/// An adaptive-streaming error event as reported by the engine.
#[derive(Debug, Clone)]
pub struct EngineError {
    pub fatal: bool,
    pub category: ErrorCategory,
    pub detail: String,
}

impl EngineError {
    pub fn new(fatal: bool, category: ErrorCategory, detail: impl Into<String>) -> Self {
        Self {
            fatal,
            category,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} error: {}",
            if self.fatal { "fatal" } else { "non-fatal" },
            self.category,
            self.detail
        )
    }
}

/// Events a streaming engine instance emits while bound to a playlist.
/// Within one session these are delivered and processed in emission order.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The manifest was parsed and the stream is playable; playback may
    /// begin and the watchdog is armed.
    ManifestParsed,
    /// A variant level finished loading. Used as a hint to keep the segment
    /// loader armed.
    LevelLoaded,
    /// An adaptive-streaming error. Routed through the classifier.
    Error(EngineError),
}
