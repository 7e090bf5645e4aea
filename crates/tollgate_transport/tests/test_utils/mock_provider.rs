//! Counting token provider for testing.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tollgate_core::{Clock, ManualClock};
use tollgate_error::{TokenError, TokenErrorKind};
use tollgate_transport::{AccessToken, TokenProvider};

/// Token provider that counts refreshes and re-authentication requests.
///
/// Tokens are named `token-<n>` where `n` is the number of refreshes so far.
pub struct MockTokenProvider {
    clock: ManualClock,
    lifetime: Duration,
    token: Mutex<Option<AccessToken>>,
    refresh_count: AtomicUsize,
    reauth_count: AtomicUsize,
    fail_refresh: AtomicBool,
    refresh_delay: Duration,
}

impl MockTokenProvider {
    /// Signed in with `token-0` expiring after `initial_lifetime`; refreshed
    /// tokens live for an hour.
    pub fn new(clock: &ManualClock, initial_lifetime: Duration) -> Self {
        Self {
            clock: clock.clone(),
            lifetime: Duration::from_secs(3600),
            token: Mutex::new(Some(AccessToken::new(
                "token-0",
                clock.now() + initial_lifetime,
            ))),
            refresh_count: AtomicUsize::new(0),
            reauth_count: AtomicUsize::new(0),
            fail_refresh: AtomicBool::new(false),
            refresh_delay: Duration::ZERO,
        }
    }

    /// Signed out; requests go out without credentials.
    pub fn new_signed_out(clock: &ManualClock) -> Self {
        let provider = Self::new(clock, Duration::ZERO);
        *provider.token.lock().unwrap() = None;
        provider
    }

    /// Make every refresh take `delay` of real time.
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    /// Make refreshes fail from now on.
    pub fn fail_refreshes(&self) {
        self.fail_refresh.store(true, Ordering::SeqCst);
    }

    /// Number of refreshes started.
    pub fn refresh_count(&self) -> usize {
        self.refresh_count.load(Ordering::SeqCst)
    }

    /// Number of re-authentication requests.
    pub fn reauth_count(&self) -> usize {
        self.reauth_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for MockTokenProvider {
    fn current_token(&self) -> Option<AccessToken> {
        self.token.lock().unwrap().clone()
    }

    async fn refresh(&self) -> Result<(), TokenError> {
        let n = self.refresh_count.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }

        if self.fail_refresh.load(Ordering::SeqCst) {
            *self.token.lock().unwrap() = None;
            return Err(TokenError::new(TokenErrorKind::Rejected {
                status: 400,
                message: "invalid_grant".to_string(),
            }));
        }

        *self.token.lock().unwrap() = Some(AccessToken::new(
            format!("token-{}", n),
            self.clock.now() + self.lifetime,
        ));
        Ok(())
    }

    fn reauthenticate(&self) {
        self.reauth_count.fetch_add(1, Ordering::SeqCst);
    }
}
