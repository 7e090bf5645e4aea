//! Rate limiter construction errors.
//!
//! A denied acquire is not an error; these only cover invalid limiter setup.

/// Error kinds for rate limiter setup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum RateLimitErrorKind {
    /// Capacity must be at least one call per window.
    #[display("Rate limit capacity must be greater than zero")]
    InvalidCapacity,
    /// Window must be a positive duration.
    #[display("Rate limit window must be greater than zero")]
    InvalidWindow,
    /// Configuration named an operation class that does not exist.
    #[display("Unknown operation class: {}", _0)]
    UnknownClass(String),
}

/// Rate limiting error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Rate Limit Error: {} at line {} in {}", kind, line, file)]
pub struct RateLimitError {
    kind: RateLimitErrorKind,
    line: u32,
    file: &'static str,
}

impl RateLimitError {
    /// Create a new rate limiting error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RateLimitErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RateLimitErrorKind {
        &self.kind
    }
}

impl From<RateLimitErrorKind> for RateLimitError {
    #[track_caller]
    fn from(kind: RateLimitErrorKind) -> Self {
        Self::new(kind)
    }
}
