// Platform-neutral contract over the adaptive-streaming engine.
//
// Both original viewers reimplement the same session/watchdog/classifier
// triad against their platform player (hls.js on web, AVPlayer on iOS).
// This trait centralizes that contract so the behavior around it lives in
// one place and is testable without a real decoder. Commands are
// synchronous, mirroring the platform call surfaces; engine callbacks come
// back as [`EngineEvent`]s over the channel the factory returns.

use tokio::sync::mpsc;
use url::Url;

use crate::error::PlaybackError;
use crate::events::EngineEvent;

pub trait StreamingEngine: Send {
    /// Bind the engine to a playlist URL and begin loading. Events follow on
    /// the instance's event channel; `ManifestParsed` signals playability.
    fn load(&mut self, url: &Url) -> Result<(), PlaybackError>;

    /// Begin or resume playback.
    fn play(&mut self);

    /// Suspend playback without releasing the pipeline.
    fn pause(&mut self);

    fn set_muted(&mut self, muted: bool);

    /// Current playback position in seconds.
    fn position(&self) -> f64;

    /// End of the buffered range in seconds, if anything is buffered.
    fn buffered_end(&self) -> Option<f64>;

    fn is_paused(&self) -> bool;

    fn seek(&mut self, position: f64);

    /// Re-arm the segment loader in case it silently stopped fetching.
    fn start_load(&mut self);

    /// The engine's in-place decoder recovery primitive (no full restart).
    fn recover_media_error(&mut self);

    /// Tear the instance down, releasing decoders and network resources.
    /// Must be safe to call more than once.
    fn shutdown(&mut self);
}

/// Constructs engine instances. Each instance comes with its own event
/// channel; the session owning the instance drains it serially.
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> (Box<dyn StreamingEngine>, mpsc::UnboundedReceiver<EngineEvent>);
}
