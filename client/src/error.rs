use thiserror::Error;

/// Failure of a Registry call, classified the way callers react to it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Server unreachable, connection dropped, or the request timed out.
    #[error("cannot reach the registry: {0}")]
    Network(String),

    /// HTTP 401. The stored token has already been cleared.
    #[error("session expired, please log in again")]
    Unauthorized,

    /// Non-success status; `message` is the server's `error` field verbatim.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("invalid response from registry: {0}")]
    InvalidResponse(String),

    #[error("Server returned empty response. Make sure the backend is running.")]
    EmptyResponse,

    #[error("session storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Whether "Try Again" can reasonably succeed without operator action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Network(format!("request timed out: {e}"))
        } else if e.is_connect() {
            ApiError::Network(format!("connection failed: {e}"))
        } else if e.is_decode() {
            ApiError::InvalidResponse(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}
