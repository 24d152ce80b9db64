//! Error taxonomy shared by both pipelines.

use reqwest::StatusCode;

/// Failure of the single outbound GET performed by [`crate::fetch::fetch_json`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("feed request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("feed returned HTTP {0}")]
    HttpStatus(StatusCode),

    #[error("feed body is not JSON: {0}")]
    BodyNotJson(#[source] serde_json::Error),
}

impl FetchError {
    /// Numeric HTTP status, if the failure was a non-2xx response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::HttpStatus(code) => Some(code.as_u16()),
            _ => None,
        }
    }
}

/// Payload-level failures raised while normalizing a fetched payload.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A record passed the route/direction filter but has no display mapping.
    /// This indicates a configuration or programming error, not bad feed data.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Debug, thiserror::Error)]
#[error("snapshot store: {0}")]
pub struct StoreError(#[from] pub sqlx::Error);

/// Umbrella error returned by the composed pipelines in [`crate::pipeline`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
