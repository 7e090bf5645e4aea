//! Sliding-window log rate limiter.
//!
//! Admission is always evaluated against the true trailing window ending
//! "now", so a burst straddling a window boundary cannot double the effective
//! rate the way fixed buckets allow.
//!
//! The limiter is advisory and client-local. It throttles the user interface;
//! it is not a security control.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tollgate_core::{SharedClock, SystemClock};
use tollgate_error::{RateLimitError, RateLimitErrorKind};
use tracing::{debug, instrument, trace};

/// Point-in-time view of a limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_getters::Getters)]
pub struct LimiterSnapshot {
    /// Maximum calls per window
    capacity: u32,
    /// Window length
    window: Duration,
    /// Calls recorded inside the current window
    current: u32,
    /// Calls still permitted inside the current window
    remaining: u32,
    /// Time until the oldest recorded call leaves the window
    retry_after: Duration,
}

/// Advisory rate limiter over a rolling time window.
///
/// Holds the instants of calls accepted inside the current window. Entries
/// older than the window are pruned oldest-first on every query, so the log
/// never exceeds `capacity` entries.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tollgate_core::ManualClock;
/// use tollgate_rate_limit::SlidingWindowLimiter;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let clock = ManualClock::new();
/// let limiter = SlidingWindowLimiter::try_new(3, Duration::from_millis(1000))?
///     .with_clock(clock.shared());
///
/// assert!(limiter.try_acquire());
/// assert!(limiter.try_acquire());
/// assert!(limiter.try_acquire());
/// assert!(!limiter.try_acquire());
///
/// clock.advance(Duration::from_millis(1001));
/// assert!(limiter.try_acquire());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    capacity: u32,
    window: Duration,
    clock: SharedClock,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter allowing `capacity` calls per `window`.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` is zero or `window` is zero.
    pub fn try_new(capacity: u32, window: Duration) -> Result<Self, RateLimitError> {
        if capacity == 0 {
            return Err(RateLimitErrorKind::InvalidCapacity.into());
        }
        if window.is_zero() {
            return Err(RateLimitErrorKind::InvalidWindow.into());
        }

        Ok(Self {
            capacity,
            window,
            clock: SystemClock::shared(),
            timestamps: Mutex::new(VecDeque::with_capacity(capacity as usize)),
        })
    }

    /// Create a limiter with the window given in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` or `window_ms` is zero.
    pub fn from_millis(capacity: u32, window_ms: u64) -> Result<Self, RateLimitError> {
        Self::try_new(capacity, Duration::from_millis(window_ms))
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Maximum calls allowed per window.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Length of the rolling window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a call if the window has room.
    ///
    /// Prune, check and append happen under one lock, so concurrent callers
    /// can never push the log past `capacity`. A denied attempt is not
    /// recorded.
    #[instrument(
        skip(self),
        fields(capacity = self.capacity, window_ms = self.window.as_millis() as u64)
    )]
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.now();
        let mut timestamps = self.pruned(now);

        if (timestamps.len() as u32) < self.capacity {
            timestamps.push_back(now);
            trace!(current = timestamps.len(), "Permit granted");
            true
        } else {
            debug!(
                retry_after_ms = self.retry_after(&timestamps, now).as_millis() as u64,
                "Permit denied"
            );
            false
        }
    }

    /// Calls still permitted inside the current window.
    pub fn remaining(&self) -> u32 {
        let now = self.clock.now();
        let timestamps = self.pruned(now);
        self.capacity.saturating_sub(timestamps.len() as u32)
    }

    /// Calls recorded inside the current window.
    pub fn current_count(&self) -> u32 {
        let now = self.clock.now();
        self.pruned(now).len() as u32
    }

    /// Time until the oldest recorded call leaves the window.
    ///
    /// This is when capacity next grows by one, not a promise that an acquire
    /// will succeed then if other callers get there first. Zero when nothing
    /// is recorded.
    pub fn time_until_reset(&self) -> Duration {
        let now = self.clock.now();
        let timestamps = self.pruned(now);
        self.retry_after(&timestamps, now)
    }

    /// Consistent view of count, remaining and retry delay.
    pub fn snapshot(&self) -> LimiterSnapshot {
        let now = self.clock.now();
        let timestamps = self.pruned(now);
        let current = timestamps.len() as u32;
        LimiterSnapshot {
            capacity: self.capacity,
            window: self.window,
            current,
            remaining: self.capacity.saturating_sub(current),
            retry_after: self.retry_after(&timestamps, now),
        }
    }

    /// Forget every recorded call.
    ///
    /// Meant for test setup; production paths let the window roll.
    pub fn reset(&self) {
        self.lock().clear();
        debug!("Rate limiter reset");
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        self.timestamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the log and drop entries that have left the window.
    ///
    /// Entries are chronological, so expired ones always form a prefix.
    fn pruned(&self, now: Instant) -> MutexGuard<'_, VecDeque<Instant>> {
        let mut timestamps = self.lock();
        while let Some(&oldest) = timestamps.front() {
            if now.saturating_duration_since(oldest) > self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
        timestamps
    }

    fn retry_after(&self, timestamps: &VecDeque<Instant>, now: Instant) -> Duration {
        timestamps
            .front()
            .map(|&oldest| (oldest + self.window).saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::ManualClock;

    fn limiter(capacity: u32, window_ms: u64) -> (SlidingWindowLimiter, ManualClock) {
        let clock = ManualClock::new();
        let limiter = SlidingWindowLimiter::from_millis(capacity, window_ms)
            .unwrap()
            .with_clock(clock.shared());
        (limiter, clock)
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = SlidingWindowLimiter::from_millis(0, 1000).unwrap_err();
        assert_eq!(err.kind(), &RateLimitErrorKind::InvalidCapacity);
    }

    #[test]
    fn test_rejects_zero_window() {
        let err = SlidingWindowLimiter::from_millis(5, 0).unwrap_err();
        assert_eq!(err.kind(), &RateLimitErrorKind::InvalidWindow);
    }

    #[test]
    fn test_denied_attempt_is_not_recorded() {
        let (limiter, _clock) = limiter(1, 1000);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.current_count(), 1);
    }

    #[test]
    fn test_call_at_window_edge_still_counts() {
        let (limiter, clock) = limiter(1, 1000);
        assert!(limiter.try_acquire());

        clock.advance(Duration::from_millis(1000));
        assert_eq!(limiter.current_count(), 1);
        assert_eq!(limiter.time_until_reset(), Duration::ZERO);
        assert!(!limiter.try_acquire());

        clock.advance(Duration::from_millis(1));
        assert_eq!(limiter.current_count(), 0);
        assert!(limiter.try_acquire());
    }

    #[test]
    fn test_pruning_removes_only_expired_prefix() {
        let (limiter, clock) = limiter(3, 1000);
        assert!(limiter.try_acquire());
        clock.advance(Duration::from_millis(400));
        assert!(limiter.try_acquire());
        clock.advance(Duration::from_millis(400));
        assert!(limiter.try_acquire());

        // t=1200: only the first call has left the window.
        clock.advance(Duration::from_millis(400));
        assert_eq!(limiter.current_count(), 2);
        assert_eq!(limiter.time_until_reset(), Duration::from_millis(200));
    }

    #[test]
    fn test_snapshot_is_consistent() {
        let (limiter, clock) = limiter(4, 1000);
        limiter.try_acquire();
        clock.advance(Duration::from_millis(300));
        limiter.try_acquire();

        let snapshot = limiter.snapshot();
        assert_eq!(*snapshot.capacity(), 4);
        assert_eq!(*snapshot.current(), 2);
        assert_eq!(*snapshot.remaining(), 2);
        assert_eq!(*snapshot.retry_after(), Duration::from_millis(700));
    }
}
