use homecam_api::Role;

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("role `{role}` cannot be played live")]
    RoleNotPlayable { role: Role },

    #[error("invalid playlist URL `{input}`: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("streaming engine error: {reason}")]
    Engine { reason: String },

    #[error("session has no bound source to restart")]
    NotStarted,
}

impl PlaybackError {
    pub fn invalid_url(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn engine(reason: impl Into<String>) -> Self {
        Self::Engine {
            reason: reason.into(),
        }
    }
}
