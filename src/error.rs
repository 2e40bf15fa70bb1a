use thiserror::Error;

pub type Result<T> = core::result::Result<T, KickError>;

#[derive(Error, Debug)]
pub enum KickError {
    #[error("Missing field: {path}")]
    MissingField { path: String },

    #[error("Invalid field {path}: expected {expected}")]
    InvalidField { path: String, expected: &'static str },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Channel {channel_id} is not being watched")]
    NotTracked { channel_id: i64 },

    #[error("User not found: {slug}")]
    NotFound { slug: String },

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Logging setup error: {0}")]
    LoggingSetup(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl KickError {
    pub(crate) fn missing(path: impl Into<String>) -> Self {
        Self::MissingField { path: path.into() }
    }

    pub(crate) fn invalid(path: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidField {
            path: path.into(),
            expected,
        }
    }
}

impl From<reqwest::Error> for KickError {
    fn from(err: reqwest::Error) -> Self {
        KickError::RequestFailed(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for KickError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        KickError::Transport(err.to_string())
    }
}
