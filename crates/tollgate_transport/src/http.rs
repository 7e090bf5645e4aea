//! The HTTP primitive the transport drives.
//!
//! [`HttpClient`] is the seam between the retry/auth state machine and the
//! wire. It returns `Ok` for every response that carries a status line,
//! whatever the status, and `Err` only when no response arrived.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tollgate_error::NetworkError;

pub use reqwest::{Method, Url};

/// A fully prepared outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the client's base URL
    pub path: String,
    /// Header name/value pairs, credentials included
    pub headers: Vec<(String, String)>,
    /// JSON body
    pub json: Option<serde_json::Value>,
    /// Per-request timeout overriding the client default
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A received response, returned to callers unchanged on success.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Headers with lowercase names
    pub headers: HashMap<String, String>,
    /// Raw body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response with a status and body and no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Add a header, lowercasing its name.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body deserialized from JSON.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Sends one request and reports what came back.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send `request`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError`] only when no response was received (DNS
    /// failure, refused connection, timeout). Non-2xx responses are `Ok`.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError>;
}
