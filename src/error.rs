use crate::config::ConfigError;
use crate::session::StoreError;
use reqwest::StatusCode;
use thiserror::Error;

/// Why a refresh cycle failed. Every request queued behind the cycle
/// receives its own clone of the same value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("no refresh token in session")]
    MissingRefreshToken,
    #[error("refresh rejected ({status})")]
    Rejected { status: StatusCode, body: String },
    #[error("refresh request failed: {0}")]
    Network(String),
    #[error("malformed refresh response: {0}")]
    Malformed(String),
    #[error("could not persist refreshed session: {0}")]
    Storage(String),
    #[error("refresh was abandoned before it completed")]
    Abandoned,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error")]
    Network(#[from] reqwest::Error),
    #[error("api error ({status})")]
    Status { status: StatusCode, body: String },
    #[error("session expired: {0}")]
    Refresh(#[from] RefreshError),
    #[error("invalid json")]
    Decode(#[from] serde_json::Error),
    #[error("session storage error")]
    Storage(#[from] StoreError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<ConfigError> for ApiError {
    fn from(value: ConfigError) -> Self {
        ApiError::InvalidRequest(value.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Refresh(RefreshError::Rejected { status, .. }) => Some(*status),
            ApiError::Network(err) => err.status(),
            _ => None,
        }
    }

    /// True when the session is gone and the user must sign in again. An
    /// abandoned refresh leaves the session in place, so it does not count.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::Refresh(err) if *err != RefreshError::Abandoned)
    }

    /// The server's `detail` message, when the error body carries one.
    pub fn detail(&self) -> Option<String> {
        let body = match self {
            ApiError::Status { body, .. } => body,
            ApiError::Refresh(RefreshError::Rejected { body, .. }) => body,
            _ => return None,
        };
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        value
            .get("detail")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}
