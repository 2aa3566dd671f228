// Live role activation and adaptive-playback resilience engine.
//
// This crate is the platform-neutral core shared by the HomeCam viewers:
// it activates on-demand roles and waits for their playlists to become
// servable, owns playback sessions over an abstract streaming engine, keeps
// them healthy through a stall watchdog and an error classifier, and
// reconciles a pool of grid sessions against view/app lifecycle changes.
// The actual adaptive-streaming engine (hls.js, AVPlayer) lives behind the
// [`StreamingEngine`] trait; nothing here decodes media.

pub mod activator;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod pool;
pub mod prober;
pub mod session;
pub mod watchdog;

#[cfg(test)]
pub(crate) mod testing;

pub use activator::{Activation, RoleActivator, RoleControl};
pub use classifier::{RecoveryAction, classify};
pub use config::{GridFocusPolicy, PlaybackConfig, PoolConfig, ProberConfig, WatchdogConfig};
pub use engine::{EngineFactory, StreamingEngine};
pub use error::PlaybackError;
pub use events::{EngineError, EngineEvent, ErrorCategory};
pub use pool::{Focus, GridCamera, PoolContext, SessionPool};
pub use prober::{ProbeOutcome, ProbeTransport, ReadinessProber};
pub use session::{PlaybackSession, SessionKey, SessionStatus};
pub use watchdog::StallWatchdog;
