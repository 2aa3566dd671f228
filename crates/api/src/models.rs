// Wire models for the HomeCam backend.
//
// A camera owns an ordered list of source streams and a role configuration
// mapping each transcoded role (grid/medium/high/recording) to a mode and an
// optional bound stream. The viewer consumes `CameraSummary`; the admin
// surface works with the full `Camera`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One transcoded output of a camera, independently controllable server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Always-on low-resolution output for the grid view.
    Grid,
    /// On-demand medium-fidelity output.
    Medium,
    /// On-demand high-fidelity output.
    High,
    /// Background recording output; never played live by the viewer.
    Recording,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Grid => "grid",
            Role::Medium => "medium",
            Role::High => "high",
            Role::Recording => "recording",
        }
    }

    /// Roles that must be explicitly started before they produce output.
    pub fn is_on_demand(self) -> bool {
        matches!(self, Role::Medium | Role::High)
    }

    /// Path of the adaptive playlist for this role on a given camera,
    /// relative to the server base.
    pub fn playlist_path(self, camera_name: &str) -> String {
        format!("/live/{camera_name}/{}/index.m3u8", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(Role::Grid),
            "medium" => Ok(Role::Medium),
            "high" => Ok(Role::High),
            "recording" => Ok(Role::Recording),
            other => Err(format!("unknown role `{other}`")),
        }
    }
}

/// How a role picks its source stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleMode {
    #[default]
    Auto,
    Manual,
    Disabled,
}

/// A camera source stream with optional probed metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub id: u64,
    pub name: String,
    /// Opaque source locator; the client never interprets it.
    pub rtsp_url: String,
    #[serde(default)]
    pub is_master: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub bitrate_kbps: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl Stream {
    /// A stream is probed once width and height are known.
    pub fn is_probed(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }
}

/// Per-role resolved configuration as carried on the admin camera object.
/// The backend serializes these as flat `{role}_mode` / `{role}_stream_id`
/// fields, with target dimensions only for grid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleConfig {
    #[serde(default)]
    pub grid_mode: RoleMode,
    #[serde(default)]
    pub grid_stream_id: Option<u64>,
    #[serde(default = "default_grid_w")]
    pub grid_target_w: u32,
    #[serde(default = "default_grid_h")]
    pub grid_target_h: u32,
    #[serde(default)]
    pub medium_mode: RoleMode,
    #[serde(default)]
    pub medium_stream_id: Option<u64>,
    #[serde(default)]
    pub high_mode: RoleMode,
    #[serde(default)]
    pub high_stream_id: Option<u64>,
    #[serde(default)]
    pub recording_mode: RoleMode,
    #[serde(default)]
    pub recording_stream_id: Option<u64>,
}

fn default_grid_w() -> u32 {
    640
}

fn default_grid_h() -> u32 {
    360
}

/// One role's slice of a [`RoleConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSetting {
    pub mode: RoleMode,
    pub bound_stream_id: Option<u64>,
    /// Present only for grid.
    pub target: Option<(u32, u32)>,
}

/// Outcome of resolving one role against the camera's streams.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRole {
    /// Mode after invariants are applied (grid never resolves to disabled).
    pub mode: RoleMode,
    /// The manually bound stream, when mode is manual and the binding is valid.
    pub bound: Option<Stream>,
    /// True when a manual binding references a stream that has not been
    /// probed yet; derived dimensions must not be trusted until it is.
    pub needs_probe: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RoleConfigError {
    #[error("role `{role}` is bound to unknown stream {stream_id}")]
    UnknownBinding { role: Role, stream_id: u64 },

    #[error("role `{role}` is manual but has no bound stream")]
    MissingBinding { role: Role },
}

impl RoleConfig {
    pub fn setting(&self, role: Role) -> RoleSetting {
        match role {
            Role::Grid => RoleSetting {
                mode: self.grid_mode,
                bound_stream_id: self.grid_stream_id,
                target: Some((self.grid_target_w, self.grid_target_h)),
            },
            Role::Medium => RoleSetting {
                mode: self.medium_mode,
                bound_stream_id: self.medium_stream_id,
                target: None,
            },
            Role::High => RoleSetting {
                mode: self.high_mode,
                bound_stream_id: self.high_stream_id,
                target: None,
            },
            Role::Recording => RoleSetting {
                mode: self.recording_mode,
                bound_stream_id: self.recording_stream_id,
                target: None,
            },
        }
    }

    /// Mode with invariants applied: grid is never disabled, a stored
    /// `disabled` for grid is treated as `auto`.
    pub fn effective_mode(&self, role: Role) -> RoleMode {
        let mode = self.setting(role).mode;
        if role == Role::Grid && mode == RoleMode::Disabled {
            RoleMode::Auto
        } else {
            mode
        }
    }

    /// Resolve one role against the camera's streams, checking the manual
    /// binding invariants.
    pub fn resolve(&self, role: Role, streams: &[Stream]) -> Result<ResolvedRole, RoleConfigError> {
        let mode = self.effective_mode(role);
        if mode != RoleMode::Manual {
            return Ok(ResolvedRole {
                mode,
                bound: None,
                needs_probe: false,
            });
        }

        let stream_id = self
            .setting(role)
            .bound_stream_id
            .ok_or(RoleConfigError::MissingBinding { role })?;
        let bound = streams
            .iter()
            .find(|s| s.id == stream_id)
            .cloned()
            .ok_or(RoleConfigError::UnknownBinding { role, stream_id })?;
        let needs_probe = !bound.is_probed();

        Ok(ResolvedRole {
            mode,
            bound: Some(bound),
            needs_probe,
        })
    }
}

/// Pick the stream auto mode would use for a given target size.
///
/// Preference order: streams exceeding the target (smallest overshoot
/// first), then streams at or under the target (nearest first), larger pixel
/// counts breaking ties. Unprobed or disabled streams are never candidates.
/// This mirrors the server's auto resolution so a client can predict it.
pub fn best_stream_for(streams: &[Stream], target_w: u32, target_h: u32) -> Option<&Stream> {
    streams
        .iter()
        .filter(|s| s.enabled && s.is_probed())
        .min_by_key(|s| {
            let (w, h) = (s.width.unwrap_or(0), s.height.unwrap_or(0));
            let over = w.saturating_sub(target_w) as u64 + h.saturating_sub(target_h) as u64;
            let under = target_w.saturating_sub(w) as u64 + target_h.saturating_sub(h) as u64;
            let group = if over > 0 { 0u64 } else { 1 };
            let distance = if over > 0 { over } else { under };
            (group, distance, std::cmp::Reverse(w as u64 * h as u64))
        })
}

/// Admin view of a camera, including streams and role configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub id: u64,
    pub name: String,
    pub rtsp_url: String,
    #[serde(default)]
    pub retention_days: u32,
    #[serde(default)]
    pub streams: Vec<Stream>,
    #[serde(flatten)]
    pub roles: RoleConfig,
}

/// Viewer-facing camera summary with per-role playback URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSummary {
    pub id: u64,
    pub name: String,
    /// Always-on grid playlist URL ("low" in the original wire format).
    #[serde(alias = "low_url")]
    pub grid_url: String,
    #[serde(default)]
    pub medium_url: Option<String>,
    #[serde(default)]
    pub high_url: Option<String>,
}

impl CameraSummary {
    pub fn playback_url(&self, role: Role) -> Option<&str> {
        match role {
            Role::Grid => Some(self.grid_url.as_str()),
            Role::Medium => self.medium_url.as_deref(),
            Role::High => self.high_url.as_deref(),
            Role::Recording => None,
        }
    }
}

/// Response of the role start/stop commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResponse {
    pub ok: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Actual server-side running state per role, polled by admin surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleStatus {
    #[serde(default)]
    pub roles: HashMap<Role, bool>,
}

impl RoleStatus {
    pub fn is_running(&self, role: Role) -> bool {
        self.roles.get(&role).copied().unwrap_or(false)
    }
}

/// Body for `PUT /api/admin/cameras/{id}/roles`. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_mode: Option<RoleMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_stream_id: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_target_w: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_target_h: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium_mode: Option<RoleMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium_stream_id: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_mode: Option<RoleMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_stream_id: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_mode: Option<RoleMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_stream_id: Option<Option<u64>>,
}

/// Body for `PUT /api/admin/cameras/{id}`. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CameraUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtsp_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_days: Option<u32>,
}

/// Body for adding a camera.
#[derive(Debug, Clone, Serialize)]
pub struct NewCamera {
    pub name: String,
    pub rtsp_url: String,
    pub retention_days: u32,
}

/// Body for adding a stream to a camera.
#[derive(Debug, Clone, Serialize)]
pub struct NewStream {
    pub name: String,
    pub rtsp_url: String,
}
