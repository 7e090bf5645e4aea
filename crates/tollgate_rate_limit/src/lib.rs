//! Advisory, client-local rate limiting.
//!
//! Each guarded operation class (`login`, `register`, `profile-update`,
//! `search`, generic `api`) gets its own [`SlidingWindowLimiter`]. A call site
//! asks its limiter before building a request; a denial is a plain `false`,
//! never an error, and what to do about it (drop, queue, show a countdown) is
//! the call site's decision.
//!
//! This throttles the client for user experience only. It is trivially
//! bypassable and must never be treated as a security boundary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod class;
mod config;
mod limiter;
mod registry;

pub use class::OperationClass;
pub use config::{RateLimitConfig, RateLimitOverride, resolve_limits};
pub use limiter::{LimiterSnapshot, SlidingWindowLimiter};
pub use registry::{LimiterStatus, RateLimiters};
