// Session pool: reconciles live playback sessions against what the viewer
// is currently showing.
//
// The pool is declarative. Callers describe the desired view (visible grid
// tiles, an optional focused detail view, app foreground state) and
// `reconcile` makes the session set match: it creates sessions for tiles
// that scrolled in, tears down sessions for tiles that scrolled out, opens
// and closes the detail session, and suspends or resumes playback on
// lifecycle changes. Suspended sessions keep their engine; only membership
// changes release engines.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use homecam_api::{Role, RoleConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::activator::{Activation, RoleActivator};
use crate::config::{GridFocusPolicy, PlaybackConfig};
use crate::engine::EngineFactory;
use crate::error::PlaybackError;
use crate::session::{PlaybackSession, SessionKey, SessionStatus};

/// One visible grid tile.
#[derive(Debug, Clone)]
pub struct GridCamera {
    pub camera_id: u64,
    pub name: String,
    pub grid_url: Url,
}

/// The focused detail view, if any.
#[derive(Debug, Clone)]
pub struct Focus {
    pub camera_id: u64,
    pub camera_name: String,
    pub role: Role,
    /// Role configuration when the caller has it; lets activation reject a
    /// disabled role without network traffic.
    pub roles: Option<RoleConfig>,
}

/// Desired view state, handed to [`SessionPool::reconcile`].
#[derive(Debug, Clone, Default)]
pub struct PoolContext {
    pub visible: Vec<GridCamera>,
    pub focus: Option<Focus>,
    /// False while the app is backgrounded; everything suspends.
    pub foreground: bool,
}

pub struct SessionPool {
    factory: Arc<dyn EngineFactory>,
    activator: RoleActivator,
    config: PlaybackConfig,
    grid: HashMap<u64, PlaybackSession>,
    detail: Option<PlaybackSession>,
}

impl SessionPool {
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        activator: RoleActivator,
        config: PlaybackConfig,
    ) -> Self {
        Self {
            factory,
            activator,
            config,
            grid: HashMap::new(),
            detail: None,
        }
    }

    pub fn grid_session(&self, camera_id: u64) -> Option<&PlaybackSession> {
        self.grid.get(&camera_id)
    }

    pub fn detail_session(&self) -> Option<&PlaybackSession> {
        self.detail.as_ref()
    }

    /// Restart the grid session for one camera, the user-facing recovery
    /// action for a tile stuck in the error state.
    pub async fn restart_grid(&mut self, camera_id: u64) -> Result<(), PlaybackError> {
        match self.grid.get_mut(&camera_id) {
            Some(session) => session.restart().await,
            None => Err(PlaybackError::NotStarted),
        }
    }

    /// Make the live session set match `ctx`.
    ///
    /// Returns the activation outcome when this pass opened (or tried to
    /// open) a detail view, so the caller can surface a rejection or a
    /// timeout. Grid tile start failures are soft: the tile lands in the
    /// error state and the rest of the grid keeps running.
    pub async fn reconcile(
        &mut self,
        ctx: &PoolContext,
        token: &CancellationToken,
    ) -> Result<Option<Activation>, PlaybackError> {
        // Membership: drop tiles that scrolled out, admit the ones that
        // scrolled in.
        let visible: HashSet<u64> = ctx.visible.iter().map(|c| c.camera_id).collect();
        let gone: Vec<u64> = self
            .grid
            .keys()
            .filter(|id| !visible.contains(id))
            .copied()
            .collect();
        for camera_id in gone {
            if let Some(mut session) = self.grid.remove(&camera_id) {
                debug!(camera_id, "grid tile no longer visible, releasing session");
                session.stop().await;
            }
        }
        for cam in &ctx.visible {
            self.grid.entry(cam.camera_id).or_insert_with(|| {
                PlaybackSession::new(
                    SessionKey {
                        camera_id: cam.camera_id,
                        role: Role::Grid,
                    },
                    Arc::clone(&self.factory),
                    self.config.watchdog.clone(),
                )
            });
        }

        // Detail lifecycle. Closing a detail view never sends a server-side
        // stop; the role's idle timeout reclaims the pipeline.
        let wanted = ctx.focus.as_ref().map(|f| SessionKey {
            camera_id: f.camera_id,
            role: f.role,
        });
        if self.detail.as_ref().is_some_and(|s| Some(s.key()) != wanted)
            && let Some(mut session) = self.detail.take()
        {
            debug!(session = %session.key(), "closing detail session");
            session.stop().await;
        }

        let mut activation = None;
        if let Some(focus) = &ctx.focus
            && self.detail.is_none()
            && ctx.foreground
        {
            let outcome = self
                .activator
                .activate(
                    focus.camera_id,
                    &focus.camera_name,
                    focus.roles.as_ref(),
                    focus.role,
                    token,
                )
                .await?;
            if let Activation::Ready(url) = &outcome {
                let mut session = PlaybackSession::new(
                    SessionKey {
                        camera_id: focus.camera_id,
                        role: focus.role,
                    },
                    Arc::clone(&self.factory),
                    self.config.watchdog.clone(),
                );
                session.start(url.clone(), false).await?;
                self.detail = Some(session);
            }
            activation = Some(outcome);
        }

        // Play state. Error tiles are left alone until an explicit restart.
        for cam in &ctx.visible {
            let suspend = !ctx.foreground
                || ctx.focus.as_ref().is_some_and(|f| {
                    match self.config.pool.grid_focus_policy {
                        GridFocusPolicy::PauseAll => true,
                        GridFocusPolicy::PauseFocusedOnly => f.camera_id == cam.camera_id,
                    }
                });
            let Some(session) = self.grid.get_mut(&cam.camera_id) else {
                continue;
            };
            match (suspend, session.status()) {
                (true, SessionStatus::Playing | SessionStatus::Starting) => session.pause(),
                (false, SessionStatus::Paused) => session.resume(),
                (false, SessionStatus::Idle) => {
                    if let Err(err) = session.start(cam.grid_url.clone(), true).await {
                        warn!(camera_id = cam.camera_id, error = %err,
                            "grid session failed to start");
                    }
                }
                _ => {}
            }
        }
        if let Some(detail) = &self.detail {
            if ctx.foreground {
                detail.resume();
            } else {
                detail.pause();
            }
        }

        Ok(activation)
    }

    /// Release every session. Used on app teardown.
    pub async fn shutdown(&mut self) {
        for (_, mut session) in self.grid.drain() {
            session.stop().await;
        }
        if let Some(mut session) = self.detail.take() {
            session.stop().await;
        }
    }
}
