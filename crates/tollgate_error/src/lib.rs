//! Error types for the Tollgate crates.
//!
//! # Error Hierarchy
//!
//! Errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - Constructors use `#[track_caller]` for automatic location capture
//!
//! [`TransportError`] is the odd one out: alongside its kind it carries the
//! user-facing message and HTTP status, since it is what call sites present.
//!
//! # Examples
//!
//! ```
//! use tollgate_error::{TollgateResult, NetworkError};
//!
//! fn fetch_data() -> TollgateResult<String> {
//!     Err(NetworkError::new("Connection refused"))?
//! }
//!
//! assert!(fetch_data().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod network;
mod rate_limit;
mod token;
mod transport;

pub use config::ConfigError;
pub use error::{TollgateError, TollgateErrorKind, TollgateResult};
pub use network::NetworkError;
pub use rate_limit::{RateLimitError, RateLimitErrorKind};
pub use token::{TokenError, TokenErrorKind};
pub use transport::{Severity, TransportError, TransportErrorKind};
