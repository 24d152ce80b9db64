use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use std::fmt;

/// An [`HttpClient`] wrapper that appends an API key as a URL query parameter.
///
/// The transit API authenticates every call with `key=<secret>`, so the
/// pipelines build bare URLs and this wrapper adds the credential last.
pub struct UrlParam<C> {
    pub inner: C,
    pub param_name: String,
    pub key: String,
}

impl<C> UrlParam<C> {
    /// Uses the `key` parameter name expected by the train tracker API.
    pub fn api_key(inner: C, key: impl Into<String>) -> Self {
        Self {
            inner,
            param_name: "key".to_string(),
            key: key.into(),
        }
    }
}

impl<C> fmt::Debug for UrlParam<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlParam")
            .field("param_name", &self.param_name)
            .field("key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for UrlParam<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.url_mut()
            .query_pairs_mut()
            .append_pair(&self.param_name, &self.key);
        self.inner.execute(req).await
    }
}
