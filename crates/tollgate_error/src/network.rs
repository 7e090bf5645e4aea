//! Transport-level (no response received) error types.

/// A request that never produced an HTTP response.
///
/// Raised by an `HttpClient` for DNS failures, refused connections, resets and
/// timeouts. Anything that yields a status line is a response, not a
/// `NetworkError`.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Network Error: {} at line {} in {}", message, line, file)]
pub struct NetworkError {
    /// The underlying error message
    pub message: String,
    /// Whether the request hit its deadline
    pub timed_out: bool,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl NetworkError {
    /// Create a new NetworkError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use tollgate_error::NetworkError;
    ///
    /// let err = NetworkError::new("Connection refused");
    /// assert!(!err.timed_out);
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            timed_out: false,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Create a NetworkError for a request that exceeded its timeout.
    #[track_caller]
    pub fn timeout(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            timed_out: true,
            line: location.line(),
            file: location.file(),
        }
    }
}
