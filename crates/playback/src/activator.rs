// Role activation: turn "the user wants to watch camera X at role R" into a
// playlist URL that is actually servable.
//
// Grid output is always on, so grid activation only waits for the playlist.
// Medium and high are produced on demand: the server must accept a start
// command first, and the pipeline then takes several seconds to publish its
// first playlist. Activation is strictly command-then-verify; a start that
// the server rejects never reaches the prober.

use std::sync::Arc;

use async_trait::async_trait;
use homecam_api::{ApiClient, ApiError, Role, RoleConfig, RoleMode, StartResponse};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::PlaybackError;
use crate::prober::{ProbeOutcome, ReadinessProber};

/// Outcome of an activation attempt. Only `Ready` carries a URL a session
/// may attach to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The playlist is servable right now.
    Ready(Url),
    /// The server (or local configuration) refused to start the role.
    Rejected(String),
    /// The server accepted the start but the playlist never appeared
    /// within the readiness budget.
    TimedOut,
}

impl Activation {
    pub fn is_ready(&self) -> bool {
        matches!(self, Activation::Ready(_))
    }
}

/// Server-side role start commands. Split out so activation logic can be
/// tested without a backend; [`ApiClient`] is the production implementation.
#[async_trait]
pub trait RoleControl: Send + Sync {
    async fn start_role(&self, camera_id: u64, role: Role) -> Result<StartResponse, ApiError>;
}

#[async_trait]
impl RoleControl for ApiClient {
    async fn start_role(&self, camera_id: u64, role: Role) -> Result<StartResponse, ApiError> {
        ApiClient::start_role(self, camera_id, role).await
    }
}

pub struct RoleActivator {
    control: Arc<dyn RoleControl>,
    prober: ReadinessProber,
    base: Url,
}

impl RoleActivator {
    pub fn new(control: Arc<dyn RoleControl>, prober: ReadinessProber, base: Url) -> Self {
        Self {
            control,
            prober,
            base,
        }
    }

    /// Activate `role` on a camera and wait until its playlist is servable.
    ///
    /// `roles` is the camera's role configuration when the caller has it; a
    /// locally known disabled role is rejected without any network traffic.
    /// Start failures are soft (`Rejected`), not errors: the viewer shows
    /// them inline and the grid keeps running. Only cancellation and
    /// malformed URLs surface as `Err`.
    pub async fn activate(
        &self,
        camera_id: u64,
        camera_name: &str,
        roles: Option<&RoleConfig>,
        role: Role,
        token: &CancellationToken,
    ) -> Result<Activation, PlaybackError> {
        if role == Role::Recording {
            return Err(PlaybackError::RoleNotPlayable { role });
        }

        let path = role.playlist_path(camera_name);
        let url = self
            .base
            .join(&path)
            .map_err(|e| PlaybackError::invalid_url(&path, e.to_string()))?;

        if role.is_on_demand() {
            if let Some(roles) = roles
                && roles.effective_mode(role) == RoleMode::Disabled
            {
                debug!(camera_id, %role, "role disabled in configuration, not starting");
                return Ok(Activation::Rejected("disabled".to_string()));
            }

            match self.control.start_role(camera_id, role).await {
                Ok(StartResponse { ok: true, .. }) => {
                    info!(camera_id, %role, "role start accepted");
                }
                Ok(StartResponse { ok: false, reason }) => {
                    let reason = reason.unwrap_or_else(|| "rejected".to_string());
                    info!(camera_id, %role, %reason, "role start rejected by server");
                    return Ok(Activation::Rejected(reason));
                }
                Err(err) => {
                    warn!(camera_id, %role, error = %err, "role start request failed");
                    return Ok(Activation::Rejected("network".to_string()));
                }
            }
        }

        match self.prober.wait_until_ready(&url, token).await? {
            ProbeOutcome::Ready => Ok(Activation::Ready(url)),
            ProbeOutcome::TimedOut => Ok(Activation::TimedOut),
        }
    }
}
