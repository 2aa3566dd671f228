// HTTP client for the HomeCam backend.
//
// Two surfaces share one client: the viewer surface (`/api/cameras`) and the
// admin surface (camera/stream CRUD, role settings, on-demand role control).
// All methods are plain request/response; polling lives in `status.rs`.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::ApiError;
use crate::models::{
    Camera, CameraSummary, CameraUpdate, NewCamera, NewStream, Role, RoleStatus, RoleUpdate,
    StartResponse, Stream,
};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

#[derive(serde::Deserialize)]
struct CamerasEnvelope {
    cameras: Vec<CameraSummary>,
}

impl ApiClient {
    /// Build a client for the given server base URL, e.g. `http://nvr:8000`.
    pub fn new(base: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base).map_err(|e| ApiError::invalid_base_url(base, e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::invalid_base_url(
                base.as_str(),
                "not a valid HTTP base",
            ));
        }
        let http = Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, base })
    }

    /// Build with a caller-supplied `reqwest::Client` (custom timeouts, TLS).
    pub fn with_client(http: Client, base: Url) -> Self {
        Self { http, base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL of a role's playlist for a camera. This is the well-known
    /// location the readiness prober checks after activation.
    pub fn playlist_url(&self, camera_name: &str, role: Role) -> Result<Url, ApiError> {
        self.url(&role.playlist_path(camera_name))
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::invalid_base_url(self.base.as_str(), e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        operation: &'static str,
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        debug!(%url, operation, "GET");
        let resp = self.http.get(url.clone()).send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::http_status(resp.status(), url, operation));
        }
        Ok(resp.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
        operation: &'static str,
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        debug!(%url, operation, "POST");
        let mut req = self.http.post(url.clone());
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::http_status(resp.status(), url, operation));
        }
        Ok(resp.json().await?)
    }

    async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        operation: &'static str,
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        debug!(%url, operation, "PUT");
        let resp = self.http.put(url.clone()).json(body).send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::http_status(resp.status(), url, operation));
        }
        Ok(resp.json().await?)
    }

    // --- Viewer surface ---

    /// Camera summaries with per-role playback URLs.
    pub async fn cameras(&self) -> Result<Vec<CameraSummary>, ApiError> {
        let envelope: CamerasEnvelope = self.get_json("/api/cameras", "list cameras").await?;
        Ok(envelope.cameras)
    }

    // --- Admin surface: cameras ---

    pub async fn admin_cameras(&self) -> Result<Vec<Camera>, ApiError> {
        self.get_json("/api/admin/cameras", "list cameras (admin)")
            .await
    }

    pub async fn admin_camera(&self, camera_id: u64) -> Result<Camera, ApiError> {
        self.get_json(&format!("/api/admin/cameras/{camera_id}"), "get camera")
            .await
    }

    pub async fn add_camera(&self, camera: &NewCamera) -> Result<Camera, ApiError> {
        self.post_json("/api/admin/cameras", Some(camera), "add camera")
            .await
    }

    pub async fn update_camera(
        &self,
        camera_id: u64,
        update: &CameraUpdate,
    ) -> Result<Camera, ApiError> {
        self.put_json(
            &format!("/api/admin/cameras/{camera_id}"),
            update,
            "update camera",
        )
        .await
    }

    pub async fn delete_camera(&self, camera_id: u64) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/admin/cameras/{camera_id}"))?;
        debug!(%url, "DELETE");
        let resp = self.http.delete(url.clone()).send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::http_status(resp.status(), url, "delete camera"));
        }
        Ok(())
    }

    /// Update the per-role settings of a camera. Only fields set on the
    /// update are sent; the server merges them.
    pub async fn update_roles(
        &self,
        camera_id: u64,
        update: &RoleUpdate,
    ) -> Result<Camera, ApiError> {
        self.put_json(
            &format!("/api/admin/cameras/{camera_id}/roles"),
            update,
            "update roles",
        )
        .await
    }

    // --- Admin surface: streams ---

    pub async fn streams(&self, camera_id: u64) -> Result<Vec<Stream>, ApiError> {
        self.get_json(
            &format!("/api/admin/cameras/{camera_id}/streams"),
            "list streams",
        )
        .await
    }

    pub async fn add_stream(
        &self,
        camera_id: u64,
        stream: &NewStream,
    ) -> Result<Stream, ApiError> {
        self.post_json(
            &format!("/api/admin/cameras/{camera_id}/streams"),
            Some(stream),
            "add stream",
        )
        .await
    }

    /// Ask the backend to probe a stream's metadata (dimensions, fps,
    /// bitrate). Returns the stream as known after the probe.
    pub async fn probe_stream(&self, camera_id: u64, stream_id: u64) -> Result<Stream, ApiError> {
        self.post_json::<(), _>(
            &format!("/api/admin/cameras/{camera_id}/streams/{stream_id}/probe"),
            None,
            "probe stream",
        )
        .await
    }

    /// Return the stream with probed dimensions, triggering a probe first if
    /// it has none yet. Callers binding a manual role must not trust derived
    /// dimensions before this succeeds.
    pub async fn ensure_probed(&self, camera_id: u64, stream_id: u64) -> Result<Stream, ApiError> {
        let streams = self.streams(camera_id).await?;
        match streams.iter().find(|s| s.id == stream_id) {
            Some(s) if s.is_probed() => return Ok(s.clone()),
            Some(_) => {}
            None => {
                return Err(ApiError::UnknownStream {
                    camera_id,
                    stream_id,
                });
            }
        }
        self.probe_stream(camera_id, stream_id).await?;
        let streams = self.streams(camera_id).await?;
        streams
            .into_iter()
            .find(|s| s.id == stream_id)
            .ok_or(ApiError::UnknownStream {
                camera_id,
                stream_id,
            })
    }

    // --- Admin surface: role control and status ---

    /// Issue the start command for an on-demand role. Only medium and high
    /// have start/stop controls.
    pub async fn start_role(&self, camera_id: u64, role: Role) -> Result<StartResponse, ApiError> {
        if !role.is_on_demand() {
            return Err(ApiError::UnsupportedRole { role });
        }
        self.post_json::<(), _>(
            &format!("/api/admin/cameras/{camera_id}/{role}/start"),
            None,
            "start role",
        )
        .await
    }

    pub async fn stop_role(&self, camera_id: u64, role: Role) -> Result<StartResponse, ApiError> {
        if !role.is_on_demand() {
            return Err(ApiError::UnsupportedRole { role });
        }
        self.post_json::<(), _>(
            &format!("/api/admin/cameras/{camera_id}/{role}/stop"),
            None,
            "stop role",
        )
        .await
    }

    /// Actual server-side running state of the camera's roles.
    pub async fn camera_status(&self, camera_id: u64) -> Result<RoleStatus, ApiError> {
        self.get_json(
            &format!("/api/admin/cameras/{camera_id}/status"),
            "camera status",
        )
        .await
    }
}
