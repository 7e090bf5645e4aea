//! Scripted HTTP client for testing.

use async_trait::async_trait;
use std::sync::Mutex;
use tollgate_error::NetworkError;
use tollgate_transport::{HttpClient, HttpRequest, HttpResponse};

/// A single scripted outcome.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Respond with a status and body
    Status(u16, String),
    /// Respond with a fully built response
    Response(HttpResponse),
    /// Fail without a response
    Network { timed_out: bool },
}

/// HTTP client that replays a script and records every request.
///
/// Once the script runs out, the last entry repeats.
pub struct MockHttpClient {
    script: Vec<MockResponse>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    /// Replay `script` in order.
    pub fn new_sequence(script: Vec<MockResponse>) -> Self {
        assert!(!script.is_empty(), "script needs at least one response");
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `status` and `body`.
    pub fn new_status(status: u16, body: impl Into<String>) -> Self {
        Self::new_sequence(vec![MockResponse::Status(status, body.into())])
    }

    /// Always answer 200 with an empty JSON object.
    pub fn new_success() -> Self {
        Self::new_status(200, "{}")
    }

    /// Number of requests sent.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests sent so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError> {
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len() - 1
        };

        match self.script[index.min(self.script.len() - 1)].clone() {
            MockResponse::Status(status, body) => Ok(HttpResponse::new(status, body)),
            MockResponse::Response(response) => Ok(response),
            MockResponse::Network { timed_out: true } => Err(NetworkError::timeout("timed out")),
            MockResponse::Network { timed_out: false } => {
                Err(NetworkError::new("connection refused"))
            }
        }
    }
}
