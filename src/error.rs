// Error types for homeroom.
// Covers auth failures, upstream LMS errors, and general application errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HomeroomError {
    /// 401 from the relay: the stored token is invalid or expired.
    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    /// Malformed input caught before any network call.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Non-401, non-success response relayed from the LMS.
    #[error("Upstream error {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Network failure reaching the relay itself.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, HomeroomError>;
