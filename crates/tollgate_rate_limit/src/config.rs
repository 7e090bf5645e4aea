//! Per-class limit configuration.

use crate::{OperationClass, SlidingWindowLimiter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use strum::IntoEnumIterator;
use tollgate_error::{RateLimitError, RateLimitErrorKind};
use tracing::warn;

/// Capacity and window for one operation class.
///
/// ```toml
/// [rate_limits.login]
/// capacity = 5
/// window_ms = 300_000
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum calls allowed per window
    pub capacity: u32,
    /// Window length in milliseconds
    pub window_ms: u64,
}

impl RateLimitConfig {
    /// Create a limit of `capacity` calls per `window_ms` milliseconds.
    pub const fn new(capacity: u32, window_ms: u64) -> Self {
        Self {
            capacity,
            window_ms,
        }
    }

    /// Build a limiter enforcing this limit.
    ///
    /// # Errors
    ///
    /// Returns an error if capacity or window is zero.
    pub fn build(&self) -> Result<SlidingWindowLimiter, RateLimitError> {
        SlidingWindowLimiter::from_millis(self.capacity, self.window_ms)
    }
}

/// A possibly partial limit for one class, as found in configuration.
///
/// Missing fields fall back to the class's [`default_limit`]. This lets an
/// environment variable such as
/// `TOLLGATE_RATE_LIMITS__PROFILE_UPDATE__CAPACITY=20` stand on its own.
///
/// [`default_limit`]: crate::OperationClass::default_limit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitOverride {
    /// Maximum calls allowed per window
    pub capacity: Option<u32>,
    /// Window length in milliseconds
    pub window_ms: Option<u64>,
}

impl RateLimitOverride {
    /// Fields set in `other` win over fields set in `self`.
    pub fn merge(self, other: RateLimitOverride) -> Self {
        Self {
            capacity: other.capacity.or(self.capacity),
            window_ms: other.window_ms.or(self.window_ms),
        }
    }

    /// Fill unset fields from `base`.
    pub fn resolve(&self, base: RateLimitConfig) -> RateLimitConfig {
        RateLimitConfig::new(
            self.capacity.unwrap_or(base.capacity),
            self.window_ms.unwrap_or(base.window_ms),
        )
    }
}

impl From<RateLimitConfig> for RateLimitOverride {
    fn from(limit: RateLimitConfig) -> Self {
        Self {
            capacity: Some(limit.capacity),
            window_ms: Some(limit.window_ms),
        }
    }
}

/// Resolve configured overrides into a complete limit for every class.
///
/// Keys may use either `profile-update` or `profile_update`. When both name
/// the same class, fields from the underscore spelling win, since that is the
/// only spelling environment variables can produce.
///
/// # Errors
///
/// Returns an error if a key is not a known class.
pub fn resolve_limits(
    overrides: &HashMap<String, RateLimitOverride>,
) -> Result<BTreeMap<OperationClass, RateLimitConfig>, RateLimitError> {
    let mut parsed = Vec::with_capacity(overrides.len());
    for (name, limit) in overrides {
        let class = OperationClass::from_str(name).map_err(|_| {
            warn!(class = %name, "Unknown operation class in rate limit configuration");
            RateLimitError::new(RateLimitErrorKind::UnknownClass(name.clone()))
        })?;
        let canonical = class.as_ref() == name.as_str();
        parsed.push((class, !canonical, *limit));
    }
    // Canonical spellings first, aliases layered on top
    parsed.sort_by_key(|(class, alias, _)| (*class, *alias));

    let mut merged: BTreeMap<OperationClass, RateLimitOverride> = BTreeMap::new();
    for (class, _, limit) in parsed {
        let entry = merged.entry(class).or_default();
        *entry = entry.merge(limit);
    }

    Ok(OperationClass::iter()
        .map(|class| {
            let base = class.default_limit();
            let limit = merged.get(&class).map_or(base, |o| o.resolve(base));
            (class, limit)
        })
        .collect())
}
