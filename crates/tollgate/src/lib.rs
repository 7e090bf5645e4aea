//! Tollgate - client-side API gateway
//!
//! Tollgate sits between application code and a remote HTTP API and provides:
//!
//! - **Client-side throttling**: a sliding-window limiter per operation class
//!   (`login`, `register`, `search`, ...), checked before a request is built
//! - **Credential handling**: bearer token attachment, proactive refresh shortly
//!   before expiry, shared between concurrent calls
//! - **Bounded retry**: exactly one retry after a 401, with renewed credentials
//! - **Failure classification**: a closed set of error kinds with user-facing
//!   messages, each reported to a notification sink once
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tollgate::{
//!     ApiGateway, Method, OperationClass, RequestOptions, StaticTokenProvider, TollgateConfig,
//!     TracingNotifier,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TollgateConfig::load()?;
//!     let gateway = ApiGateway::from_config(
//!         &config,
//!         Arc::new(StaticTokenProvider::new(std::env::var("TOLLGATE_ACCESS_TOKEN")?)),
//!         Arc::new(TracingNotifier),
//!     )?;
//!
//!     let response = gateway
//!         .call(OperationClass::Search, Method::GET, "/search?q=rust", RequestOptions::default())
//!         .await?;
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `tollgate_error` - Error types
//! - `tollgate_core` - Clock abstraction
//! - `tollgate_rate_limit` - Sliding-window limiters and the per-class registry
//! - `tollgate_transport` - The resilient transport and its collaborators
//!
//! This crate (`tollgate`) adds configuration, logging setup and the
//! [`ApiGateway`] composition root, and re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod gateway;
pub mod observability;

pub use config::{AuthConfig, TollgateConfig, TransportConfig};
pub use gateway::{ApiGateway, GatewayError};

// Re-export error types
pub use tollgate_error::{
    ConfigError, NetworkError, RateLimitError, RateLimitErrorKind, Severity, TokenError,
    TokenErrorKind, TollgateError, TollgateErrorKind, TollgateResult, TransportError,
    TransportErrorKind,
};

// Re-export time
pub use tollgate_core::{Clock, ManualClock, SharedClock, SystemClock};

// Re-export rate limiting
pub use tollgate_rate_limit::{
    LimiterSnapshot, LimiterStatus, OperationClass, RateLimitConfig, RateLimitOverride,
    RateLimiters, SlidingWindowLimiter,
};

// Re-export transport
pub use tollgate_transport::{
    AccessToken, CallState, CollectingNotifier, ContextCredentials, HttpClient, HttpRequest,
    HttpResponse, Method, Notifier, RefreshGrantProvider, ReqwestClient, RequestOptions,
    RequestOptionsBuilder, ResilientTransport, StaticTokenProvider, TokenProvider, TokenResponse,
    TracingNotifier, TransportSettings,
};
