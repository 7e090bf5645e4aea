//! Tracing subscriber setup.

use tollgate_error::{ConfigError, TollgateResult};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,tollgate=debug";

/// Install the global subscriber with [`DEFAULT_FILTER`].
///
/// `RUST_LOG` takes precedence over the default filter. With `json` set,
/// events are written as one JSON object per line.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(json: bool) -> TollgateResult<()> {
    init_tracing_with_default(DEFAULT_FILTER, json)
}

/// Install the global subscriber with a custom fallback filter.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing_with_default(default_filter: &str, json: bool) -> TollgateResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()
    };

    result.map_err(|e| ConfigError::new(format!("Failed to initialize tracing: {}", e)).into())
}
