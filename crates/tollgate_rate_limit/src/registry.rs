//! One limiter per operation class, owned by the composition root.

use crate::{LimiterSnapshot, OperationClass, RateLimitOverride, SlidingWindowLimiter};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use strum::IntoEnumIterator;
use tollgate_core::{SharedClock, SystemClock};
use tollgate_error::RateLimitError;
use tracing::{debug, instrument};

/// Status of one class's limiter, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterStatus {
    /// The guarded class
    pub class: OperationClass,
    /// The limiter's current state
    pub snapshot: LimiterSnapshot,
}

/// The set of limiters guarding each operation class.
///
/// Built once at startup and injected into call sites. Instances are
/// independent: exhausting `login` never affects `search`.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use tollgate_rate_limit::{OperationClass, RateLimitConfig, RateLimiters};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut overrides = HashMap::new();
/// overrides.insert("login".to_string(), RateLimitConfig::new(2, 60_000).into());
/// let limiters = RateLimiters::from_config(&overrides)?;
///
/// assert!(limiters.try_acquire(OperationClass::Login));
/// assert!(limiters.try_acquire(OperationClass::Login));
/// assert!(!limiters.try_acquire(OperationClass::Login));
/// assert!(limiters.try_acquire(OperationClass::Search));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RateLimiters {
    limiters: BTreeMap<OperationClass, Arc<SlidingWindowLimiter>>,
}

impl RateLimiters {
    /// Limiters for every class using the built-in defaults.
    pub fn with_defaults() -> Self {
        Self::with_defaults_and_clock(SystemClock::shared())
    }

    /// Limiters for every class using the built-in defaults and a given clock.
    pub fn with_defaults_and_clock(clock: SharedClock) -> Self {
        let limiters = OperationClass::iter()
            .filter_map(|class| {
                // Built-in defaults are all non-zero.
                let limiter = class.default_limit().build().ok()?;
                Some((class, Arc::new(limiter.with_clock(Arc::clone(&clock)))))
            })
            .collect();
        Self { limiters }
    }

    /// Limiters from configuration keyed by class name.
    ///
    /// Classes missing from `overrides`, and fields an override leaves unset,
    /// use the class's default limit.
    ///
    /// # Errors
    ///
    /// Returns an error if a key is not a known class or a limit is zero.
    pub fn from_config(
        overrides: &HashMap<String, RateLimitOverride>,
    ) -> Result<Self, RateLimitError> {
        Self::from_config_with_clock(overrides, SystemClock::shared())
    }

    /// Limiters from configuration keyed by class name, using a given clock.
    ///
    /// # Errors
    ///
    /// Returns an error if a key is not a known class or a limit is zero.
    #[instrument(skip(overrides, clock), fields(overrides = overrides.len()))]
    pub fn from_config_with_clock(
        overrides: &HashMap<String, RateLimitOverride>,
        clock: SharedClock,
    ) -> Result<Self, RateLimitError> {
        let mut limiters = BTreeMap::new();
        for (class, limit) in crate::resolve_limits(overrides)? {
            debug!(
                %class,
                capacity = limit.capacity,
                window_ms = limit.window_ms,
                "Configuring limiter"
            );
            let limiter = limit.build()?.with_clock(Arc::clone(&clock));
            limiters.insert(class, Arc::new(limiter));
        }

        Ok(Self { limiters })
    }

    /// The limiter guarding `class`.
    pub fn get(&self, class: OperationClass) -> Option<Arc<SlidingWindowLimiter>> {
        self.limiters.get(&class).cloned()
    }

    /// Try to record a call for `class`.
    ///
    /// Unguarded classes are always admitted.
    pub fn try_acquire(&self, class: OperationClass) -> bool {
        match self.limiters.get(&class) {
            Some(limiter) => {
                let permitted = limiter.try_acquire();
                if !permitted {
                    debug!(%class, "Operation throttled locally");
                }
                permitted
            }
            None => true,
        }
    }

    /// Forget recorded calls in every limiter.
    pub fn reset_all(&self) {
        for limiter in self.limiters.values() {
            limiter.reset();
        }
    }

    /// Status of every limiter, ordered by class.
    pub fn snapshot(&self) -> Vec<LimiterStatus> {
        self.limiters
            .iter()
            .map(|(class, limiter)| LimiterStatus {
                class: *class,
                snapshot: limiter.snapshot(),
            })
            .collect()
    }
}

impl Default for RateLimiters {
    fn default() -> Self {
        Self::with_defaults()
    }
}
