use reqwest::StatusCode;

use crate::models::Role;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid server URL `{input}`: {reason}")]
    InvalidBaseUrl { input: String, reason: String },

    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("request failed with HTTP {status} during {operation} for {url}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        operation: &'static str,
    },

    #[error("role `{role}` has no start/stop control")]
    UnsupportedRole { role: Role },

    #[error("camera {camera_id} has no stream with id {stream_id}")]
    UnknownStream { camera_id: u64, stream_id: u64 },
}

impl ApiError {
    pub fn invalid_base_url(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBaseUrl {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn http_status(
        status: StatusCode,
        url: impl Into<String>,
        operation: &'static str,
    ) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
            operation,
        }
    }

    /// True for failures worth retrying on the next poll tick: transport
    /// errors and server-side 5xx. Client errors are configuration problems
    /// and will not fix themselves.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { source } => {
                source.is_connect() || source.is_timeout() || source.is_request()
            }
            Self::HttpStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::InvalidBaseUrl { .. } | Self::UnsupportedRole { .. } => false,
            Self::UnknownStream { .. } => false,
        }
    }
}
