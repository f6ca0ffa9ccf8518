use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    /// Non-success response from the resource API. Carries the upstream
    /// status and raw body verbatim for diagnostics.
    #[error("graph api error ({status}): {body}")]
    Api { status: StatusCode, body: String },
    #[error("drive '{drive}' not found in site '{site}'")]
    DriveNotFound { site: String, drive: String },
    #[error("{0}")]
    Validation(String),
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache backend error: {0}")]
    Cache(anyhow::Error),
}
