//! Classified API call failures.
//!
//! Every non-success outcome of a transport call maps to exactly one
//! [`TransportErrorKind`]. The set is closed: call sites can match it
//! exhaustively to decide how to present a failure.

use std::time::Duration;

/// How loudly a failure should be surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum Severity {
    /// Informational notice
    #[display("info")]
    Info,
    /// Recoverable problem the user can act on
    #[display("warning")]
    Warning,
    /// Failure the user cannot fix from here
    #[display("error")]
    Error,
}

/// Closed taxonomy of API call failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum TransportErrorKind {
    /// No response was received (DNS, refused connection, timeout).
    #[display("network")]
    Network,
    /// Credentials expired and could not be renewed.
    #[display("auth-expired")]
    AuthExpired,
    /// Credentials are valid but insufficient (HTTP 403).
    #[display("forbidden")]
    Forbidden,
    /// HTTP 404.
    #[display("not-found")]
    NotFound,
    /// HTTP 409.
    #[display("conflict")]
    Conflict,
    /// HTTP 422.
    #[display("validation")]
    Validation,
    /// Server-side throttling (HTTP 429).
    #[display("rate-limited")]
    RateLimited,
    /// HTTP 5xx.
    #[display("server-error")]
    ServerError,
    /// Any other non-2xx status.
    #[display("unknown")]
    Unknown,
}

impl TransportErrorKind {
    /// Map a non-2xx HTTP status to its kind.
    ///
    /// 401 maps to `AuthExpired`; the transport only reaches this mapping for a
    /// 401 once its single retry is spent.
    ///
    /// # Examples
    ///
    /// ```
    /// use tollgate_error::TransportErrorKind;
    ///
    /// assert_eq!(TransportErrorKind::from_status(409), TransportErrorKind::Conflict);
    /// assert_eq!(TransportErrorKind::from_status(503), TransportErrorKind::ServerError);
    /// assert_eq!(TransportErrorKind::from_status(418), TransportErrorKind::Unknown);
    /// ```
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => TransportErrorKind::AuthExpired,
            403 => TransportErrorKind::Forbidden,
            404 => TransportErrorKind::NotFound,
            409 => TransportErrorKind::Conflict,
            422 => TransportErrorKind::Validation,
            429 => TransportErrorKind::RateLimited,
            s if s >= 500 => TransportErrorKind::ServerError,
            _ => TransportErrorKind::Unknown,
        }
    }

    /// Message shown when the server supplied none.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            TransportErrorKind::Network => {
                "Unable to reach the server. Check your connection and try again."
            }
            TransportErrorKind::AuthExpired => "Your session has expired. Please sign in again.",
            TransportErrorKind::Forbidden => "You do not have permission to perform this action.",
            TransportErrorKind::NotFound => "The requested resource was not found.",
            TransportErrorKind::Conflict => "The request conflicts with the current state.",
            TransportErrorKind::Validation => "The submitted data is invalid.",
            TransportErrorKind::RateLimited => "Too many requests. Please wait and try again.",
            TransportErrorKind::ServerError => {
                "The server encountered an error. Please try again later."
            }
            TransportErrorKind::Unknown => "An unexpected error occurred.",
        }
    }

    /// Whether a server-supplied message may replace the fallback.
    ///
    /// 5xx bodies and transport failures carry internals, not user-facing text.
    pub fn accepts_server_message(&self) -> bool {
        !matches!(
            self,
            TransportErrorKind::Network | TransportErrorKind::ServerError
        )
    }

    /// Severity handed to the notification sink.
    pub fn severity(&self) -> Severity {
        match self {
            TransportErrorKind::AuthExpired
            | TransportErrorKind::NotFound
            | TransportErrorKind::Conflict
            | TransportErrorKind::Validation
            | TransportErrorKind::RateLimited => Severity::Warning,
            TransportErrorKind::Network
            | TransportErrorKind::Forbidden
            | TransportErrorKind::ServerError
            | TransportErrorKind::Unknown => Severity::Error,
        }
    }
}

/// A classified, terminal API call failure.
///
/// # Examples
///
/// ```
/// use tollgate_error::{TransportError, TransportErrorKind};
///
/// let err = TransportError::new(TransportErrorKind::NotFound, "Profile not found")
///     .with_status(404);
/// assert_eq!(err.kind, TransportErrorKind::NotFound);
/// assert_eq!(err.status_code, Some(404));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Transport Error ({}): {} at line {} in {}", kind, message, line, file)]
pub struct TransportError {
    /// Failure classification
    pub kind: TransportErrorKind,
    /// Human-readable message, either server-supplied or a fallback
    pub message: String,
    /// HTTP status, absent for network failures and pre-dispatch aborts
    pub status_code: Option<u16>,
    /// Server-requested delay before retrying (`Retry-After`)
    pub retry_after: Option<Duration>,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl TransportError {
    /// Create a new TransportError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            status_code: None,
            retry_after: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Create an error carrying the kind's fallback message.
    #[track_caller]
    pub fn fallback(kind: TransportErrorKind) -> Self {
        Self::new(kind, kind.fallback_message())
    }

    /// Attach the HTTP status that produced this failure.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Attach a server-requested retry delay.
    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// Severity handed to the notification sink.
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}
