// HomeCam API surface: wire models for cameras/streams/roles and the HTTP
// client the viewer and admin surfaces talk through.

pub mod client;
pub mod error;
pub mod models;
pub mod status;

pub use client::ApiClient;
pub use error::ApiError;
pub use models::{
    Camera, CameraSummary, CameraUpdate, NewCamera, NewStream, ResolvedRole, Role, RoleConfig,
    RoleConfigError, RoleMode, RoleSetting, RoleStatus, RoleUpdate, StartResponse, Stream,
    best_stream_for,
};
pub use status::StatusPoller;
