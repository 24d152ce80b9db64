mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use reqwest::{Method, Request, Url};
use tracing::debug;

use crate::error::FetchError;

/// Decoded response body, before any feed-specific interpretation.
pub type RawPayload = serde_json::Value;

/// Issues one GET against `endpoint` with `params` appended as query pairs
/// and decodes the body as JSON.
///
/// No retries and no caching. Parameters are passed through unvalidated.
///
/// # Errors
///
/// * [`FetchError::Network`] if the request could not be sent or the body
///   could not be read.
/// * [`FetchError::HttpStatus`] for any non-2xx response.
/// * [`FetchError::BodyNotJson`] if the body does not parse as JSON.
pub async fn fetch_json<C: HttpClient>(
    client: &C,
    endpoint: &Url,
    params: &[(&str, &str)],
) -> Result<RawPayload, FetchError> {
    let mut url = endpoint.clone();
    {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in params {
            pairs.append_pair(name, value);
        }
    }

    debug!(path = url.path(), params = params.len(), "Sending feed request");
    let resp = client
        .execute(Request::new(Method::GET, url))
        .await
        .map_err(FetchError::Network)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status));
    }

    let body = resp.bytes().await.map_err(FetchError::Network)?;
    debug!(bytes = body.len(), "Feed response received");
    serde_json::from_slice(&body).map_err(FetchError::BodyNotJson)
}
