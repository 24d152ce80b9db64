//! Credential-injecting [`super::HttpClient`] wrappers.

mod url_param;

pub use url_param::UrlParam;
