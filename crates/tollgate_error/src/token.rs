//! Token provider errors.

/// Reasons a token refresh can fail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TokenErrorKind {
    /// The identity provider answered and refused the refresh.
    #[display("Token endpoint rejected refresh (HTTP {}): {}", status, message)]
    Rejected {
        /// HTTP status returned by the token endpoint
        status: u16,
        /// Error description from the token endpoint
        message: String,
    },
    /// The token endpoint could not be reached.
    #[display("Token endpoint unreachable: {}", _0)]
    Network(String),
    /// The token endpoint answered with something that is not a token response.
    #[display("Malformed token response: {}", _0)]
    Parse(String),
    /// There is no session to refresh.
    #[display("No active session to refresh")]
    NoSession,
}

/// Token error with location tracking.
///
/// `Clone` so that one shared refresh outcome can be handed to every caller
/// waiting on it.
///
/// # Examples
///
/// ```
/// use tollgate_error::{TokenError, TokenErrorKind};
///
/// let err = TokenError::new(TokenErrorKind::NoSession);
/// assert!(format!("{}", err).contains("No active session"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Token Error: {} at line {} in {}", kind, line, file)]
pub struct TokenError {
    /// The kind of error that occurred
    pub kind: TokenErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl TokenError {
    /// Create a new TokenError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TokenErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TokenErrorKind {
        &self.kind
    }
}
