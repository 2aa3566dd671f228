// One playback session: one engine instance bound to one playlist URL.
//
// The session owns a single event-loop task that drains engine events,
// applies the error-recovery policy, and runs the stall watchdog. All
// engine access happens inside that task, so events are processed one at a
// time and the "at most one live engine instance" invariant reduces to
// tearing down the previous runtime before spawning the next.

use std::fmt;
use std::sync::Arc;

use homecam_api::Role;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use url::Url;

use crate::classifier::{RecoveryAction, classify};
use crate::config::WatchdogConfig;
use crate::engine::{EngineFactory, StreamingEngine};
use crate::error::PlaybackError;
use crate::events::EngineEvent;
use crate::watchdog::StallWatchdog;

/// Identity of a session: which camera and which role it plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub camera_id: u64,
    pub role: Role,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "camera {} {}", self.camera_id, self.role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Starting,
    Playing,
    /// Lifecycle suspend (background, detail focus). Engine kept alive.
    Paused,
    /// Unrecoverable playback fault; only restart/stop leave this state.
    Error,
}

enum SessionCommand {
    Pause,
    Resume,
}

struct Runtime {
    token: CancellationToken,
    handle: JoinHandle<()>,
    commands: mpsc::UnboundedSender<SessionCommand>,
}

#[derive(Clone)]
struct BoundSource {
    url: Url,
    muted: bool,
}

pub struct PlaybackSession {
    key: SessionKey,
    factory: Arc<dyn EngineFactory>,
    config: WatchdogConfig,
    status: Arc<watch::Sender<SessionStatus>>,
    runtime: Option<Runtime>,
    bound: Option<BoundSource>,
}

impl PlaybackSession {
    pub fn new(key: SessionKey, factory: Arc<dyn EngineFactory>, config: WatchdogConfig) -> Self {
        let (status, _) = watch::channel(SessionStatus::Idle);
        Self {
            key,
            factory,
            config,
            status: Arc::new(status),
            runtime: None,
            bound: None,
        }
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Bind a fresh engine instance to `url` and spawn the session loop.
    /// Any previous runtime is torn down first, so the session never holds
    /// two live engines.
    pub async fn start(&mut self, url: Url, muted: bool) -> Result<(), PlaybackError> {
        self.teardown_runtime().await;
        self.status.send_replace(SessionStatus::Starting);
        debug!(session = %self.key, %url, muted, "starting playback session");

        let (mut engine, events) = self.factory.create();
        engine.set_muted(muted);
        if let Err(err) = engine.load(&url) {
            engine.shutdown();
            self.status.send_replace(SessionStatus::Error);
            return Err(err);
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let handle = tokio::spawn(run_session_loop(
            self.key,
            engine,
            events,
            command_rx,
            token.clone(),
            Arc::clone(&self.status),
            self.config.clone(),
        ));

        self.runtime = Some(Runtime {
            token,
            handle,
            commands: command_tx,
        });
        self.bound = Some(BoundSource { url, muted });
        Ok(())
    }

    /// Tear down the engine and return to idle. Safe to call repeatedly and
    /// from any status.
    pub async fn stop(&mut self) {
        self.teardown_runtime().await;
        self.status.send_replace(SessionStatus::Idle);
    }

    /// Stop, then start again with the same URL and mute flag. Used for the
    /// user-facing "Restart" action and for recovery paths that need a
    /// clean engine.
    pub async fn restart(&mut self) -> Result<(), PlaybackError> {
        let bound = self.bound.clone().ok_or(PlaybackError::NotStarted)?;
        self.teardown_runtime().await;
        self.start(bound.url, bound.muted).await
    }

    /// Lifecycle suspend: keep the engine but stop playback. No-op unless
    /// the session is starting or playing.
    pub fn pause(&self) {
        if let Some(rt) = &self.runtime {
            let _ = rt.commands.send(SessionCommand::Pause);
        }
    }

    /// Undo a lifecycle suspend. No-op unless the session is paused.
    pub fn resume(&self) {
        if let Some(rt) = &self.runtime {
            let _ = rt.commands.send(SessionCommand::Resume);
        }
    }

    async fn teardown_runtime(&mut self) {
        if let Some(rt) = self.runtime.take() {
            rt.token.cancel();
            // The loop shuts the engine down on its way out; waiting here is
            // what upholds the single-instance invariant across restarts.
            let _ = rt.handle.await;
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        // Dropping without stop() must not leave the loop ticking with a
        // live engine. The loop releases the engine once the token fires.
        if let Some(rt) = &self.runtime {
            rt.token.cancel();
        }
    }
}

async fn run_session_loop(
    key: SessionKey,
    mut engine: Box<dyn StreamingEngine>,
    mut events: mpsc::UnboundedReceiver<EngineEvent>,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    token: CancellationToken,
    status: Arc<watch::Sender<SessionStatus>>,
    config: WatchdogConfig,
) {
    let mut watchdog = StallWatchdog::new(config.clone());
    let mut manifest_seen = false;
    let start = tokio::time::Instant::now() + config.interval;
    let mut ticker = tokio::time::interval_at(start, config.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,

            Some(command) = commands.recv() => {
                let current = *status.borrow();
                match command {
                    SessionCommand::Pause => {
                        if matches!(current, SessionStatus::Playing | SessionStatus::Starting) {
                            engine.pause();
                            status.send_replace(SessionStatus::Paused);
                        }
                    }
                    SessionCommand::Resume => {
                        if current == SessionStatus::Paused {
                            if manifest_seen {
                                engine.play();
                                watchdog.reset();
                                status.send_replace(SessionStatus::Playing);
                            } else {
                                // Paused before the stream was playable;
                                // the manifest event promotes it later.
                                status.send_replace(SessionStatus::Starting);
                            }
                        }
                    }
                }
            }

            event = events.recv() => {
                // A closed event channel means the engine side is gone.
                let Some(event) = event else { break };
                match event {
                    EngineEvent::ManifestParsed => {
                        manifest_seen = true;
                        // A pause that landed while the manifest was still
                        // loading wins; stay suspended.
                        if *status.borrow() == SessionStatus::Paused {
                            continue;
                        }
                        debug!(session = %key, "manifest parsed, playback begins");
                        engine.play();
                        watchdog.reset();
                        status.send_replace(SessionStatus::Playing);
                    }
                    EngineEvent::LevelLoaded => {
                        engine.start_load();
                    }
                    EngineEvent::Error(err) => match classify(&err) {
                        RecoveryAction::Nudge => {
                            debug!(session = %key, error = %err, "transient error, nudging");
                            watchdog.nudge(engine.as_mut());
                        }
                        RecoveryAction::RecoverMedia => {
                            warn!(session = %key, error = %err, "recovering decode pipeline in place");
                            engine.recover_media_error();
                        }
                        RecoveryAction::RearmLoader => {
                            warn!(session = %key, error = %err, "re-arming segment loader");
                            engine.start_load();
                        }
                        RecoveryAction::Fail => {
                            error!(session = %key, error = %err, "unrecoverable playback error");
                            status.send_replace(SessionStatus::Error);
                            break;
                        }
                    },
                }
            }

            _ = ticker.tick() => {
                if *status.borrow() == SessionStatus::Playing {
                    let position = engine.position();
                    if watchdog.sample(position) {
                        debug!(session = %key, position, "playback stalled, nudging");
                        watchdog.nudge(engine.as_mut());
                    }
                }
            }
        }
    }

    engine.shutdown();
    debug!(session = %key, "session loop finished");
}
