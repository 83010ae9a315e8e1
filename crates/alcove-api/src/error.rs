use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure: DNS, connect, timeout, or a malformed body.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status other than the
    /// recoverable 401 handled by the refresh flow.
    #[error("server returned {status}")]
    Status { status: StatusCode },

    /// Credential refresh failed, or the retried call was rejected again.
    /// The caller must drop the session and return to the login entry point.
    #[error("session expired")]
    SessionExpired,

    /// Client-side validation rejected the input before any call was made.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// Local file access failed (profile photo upload).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn status(status: StatusCode) -> Self {
        Self::Status { status }
    }
}
