//! [`HttpClient`] backed by reqwest.

use crate::{HttpClient, HttpRequest, HttpResponse};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::collections::HashMap;
use std::time::Duration;
use tollgate_error::{ConfigError, NetworkError};
use tracing::{debug, instrument, warn};

/// Sends requests relative to a base URL with a default timeout.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl ReqwestClient {
    /// Create a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL or the underlying
    /// client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = normalize_base(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build HTTP client: {}", e)))?;

        debug!(
            base_url = %base_url,
            timeout_ms = timeout.as_millis() as u64,
            "Created HTTP client"
        );
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The base URL request paths are joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The default request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve `path` under the base URL.
    ///
    /// Credentials are attached before this point, so a path that would leave
    /// the base origin or path prefix is refused.
    fn url_for(&self, path: &str) -> Result<Url, NetworkError> {
        if path.starts_with("//") || path.starts_with("\\\\") || Url::parse(path).is_ok() {
            warn!(path, "Refusing request path that names its own host");
            return Err(NetworkError::new(format!(
                "Request path '{}' must be relative to the base URL",
                path
            )));
        }

        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| NetworkError::new(format!("Invalid request path '{}': {}", path, e)))?;

        let same_origin = url.scheme() == self.base_url.scheme()
            && url.host_str() == self.base_url.host_str()
            && url.port_or_known_default() == self.base_url.port_or_known_default();
        if !same_origin || !url.path().starts_with(self.base_url.path()) {
            warn!(path, "Refusing request path that escapes the base URL");
            return Err(NetworkError::new(format!(
                "Request path '{}' escapes the base URL {}",
                path, self.base_url
            )));
        }
        Ok(url)
    }
}

/// Parse a base URL and make sure relative joins append to its path.
fn normalize_base(base_url: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| ConfigError::new(format!("Invalid base URL '{}': {}", base_url, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[async_trait]
impl HttpClient for ReqwestClient {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError> {
        let url = self.url_for(&request.path)?;
        let mut builder = self.client.request(request.method, url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(json) = &request.json {
            builder = builder.json(json);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, timed_out = e.is_timeout(), "Request failed without a response");
            if e.is_timeout() {
                NetworkError::timeout(e.to_string())
            } else {
                NetworkError::new(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let body = response.bytes().await.map_err(|e| {
            warn!(error = %e, "Response body could not be read");
            if e.is_timeout() {
                NetworkError::timeout(e.to_string())
            } else {
                NetworkError::new(e.to_string())
            }
        })?;

        debug!(status, bytes = body.len(), "Response received");
        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client =
            ReqwestClient::new("https://api.example.com/v1", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.example.com/v1/");
    }

    #[test]
    fn test_paths_join_under_base() {
        let client =
            ReqwestClient::new("https://api.example.com/v1/", Duration::from_secs(5)).unwrap();
        let url = client.url_for("/users/42").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/users/42");
    }

    #[test]
    fn test_absolute_paths_cannot_leave_base() {
        let client =
            ReqwestClient::new("https://api.example.com/v1", Duration::from_secs(5)).unwrap();

        for path in [
            "https://evil.example/steal",
            "http://api.example.com/v1/users",
            "//evil.example/steal",
            "mailto:someone@example.com",
        ] {
            assert!(client.url_for(path).is_err(), "{} should be refused", path);
        }
    }

    #[test]
    fn test_dot_segments_cannot_escape_prefix() {
        let client =
            ReqwestClient::new("https://api.example.com/v1", Duration::from_secs(5)).unwrap();

        assert!(client.url_for("../admin").is_err());
        assert!(client.url_for("/users/../../admin").is_err());

        let url = client.url_for("users/7/../8?expand=true").unwrap();
        assert_eq!(url.host_str(), Some("api.example.com"));
        assert_eq!(url.as_str(), "https://api.example.com/v1/users/8?expand=true");
    }

    #[test]
    fn test_relative_base_is_rejected() {
        assert!(ReqwestClient::new("api.example.com", Duration::from_secs(5)).is_err());
    }
}
