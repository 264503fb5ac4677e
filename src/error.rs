//! Error type for talking to the RobotEvents API.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("access token is missing; set {0}")]
    MissingToken(&'static str),
    #[error("access token contains characters not allowed in an HTTP header")]
    InvalidToken,
    #[error("access token rejected ({status}) for {url}")]
    Unauthorized { status: StatusCode, url: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API returned status {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("malformed response from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("gave up on {url} after {attempts} retries")]
    RetriesExhausted { url: String, attempts: u32 },
    #[error("invalid URL {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Authentication failures get their own exit message in the CLI.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ApiError::MissingToken(_) | ApiError::InvalidToken | ApiError::Unauthorized { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
