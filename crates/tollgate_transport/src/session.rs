//! The transport's view of the current credentials, and refresh deduplication.

use crate::{AccessToken, TokenProvider};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tollgate_core::SharedClock;
use tollgate_error::TokenError;
use tracing::{debug, warn};

type RefreshFuture = Shared<BoxFuture<'static, Result<(), TokenError>>>;

#[derive(Default)]
struct GateState {
    /// Successful refreshes so far
    generation: u64,
    /// Identifies each started refresh so only its own waiter retires it
    next_id: u64,
    in_flight: Option<(u64, RefreshFuture)>,
}

/// Collapses concurrent refresh requests into one provider call.
///
/// Callers record [`RefreshGate::generation`] when they read the token. When
/// they later ask for a refresh, they join the one in flight if any; if a
/// refresh already finished after their read, they reuse it and no new
/// refresh starts.
#[derive(Default)]
pub struct RefreshGate {
    state: Mutex<GateState>,
}

impl RefreshGate {
    /// Create an idle gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of completed successful refreshes.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Whether a refresh is currently running.
    pub fn is_in_flight(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    /// Refresh through `provider` unless a refresh newer than `observed`
    /// exists or is running.
    ///
    /// # Errors
    ///
    /// Returns the provider's error. Every caller sharing the refresh gets the
    /// same error.
    pub async fn refresh(
        &self,
        provider: &Arc<dyn TokenProvider>,
        observed: u64,
    ) -> Result<(), TokenError> {
        let (id, refresh) = {
            let mut state = self.lock();
            let joined = state
                .in_flight
                .as_ref()
                .map(|(id, refresh)| (*id, refresh.clone()));
            if let Some((id, refresh)) = joined {
                debug!(refresh_id = id, "Joining in-flight token refresh");
                (id, refresh)
            } else if state.generation > observed {
                debug!(
                    generation = state.generation,
                    observed, "Token already refreshed since it was read"
                );
                return Ok(());
            } else {
                let id = state.next_id;
                state.next_id += 1;
                let provider = Arc::clone(provider);
                let refresh = async move { provider.refresh().await }.boxed().shared();
                state.in_flight = Some((id, refresh.clone()));
                debug!(refresh_id = id, "Starting token refresh");
                (id, refresh)
            }
        };

        let result = refresh.await;

        let mut state = self.lock();
        if matches!(&state.in_flight, Some((current, _)) if *current == id) {
            state.in_flight = None;
            if result.is_ok() {
                state.generation += 1;
            }
        }
        result
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RefreshGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("RefreshGate")
            .field("generation", &state.generation)
            .field("in_flight", &state.in_flight.is_some())
            .finish()
    }
}

/// One call's view of the credentials, taken when it read the provider.
///
/// A call dispatches with its own snapshot, so another call clearing the
/// shared session cannot strip credentials from a request already prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Refresh generation the token belongs to
    pub generation: u64,
    /// Token read at that generation
    pub token: Option<AccessToken>,
}

impl Credentials {
    /// The bearer value to send, if any.
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.value.as_str())
    }
}

/// Credentials as last read from the token provider.
///
/// A token is expiring once `now + refresh_skew >= expires_at`. Tokens with
/// unknown expiry are never considered expiring.
#[derive(Debug)]
pub struct TokenSession {
    token: RwLock<Option<AccessToken>>,
    refresh_skew: Duration,
    clock: SharedClock,
    gate: RefreshGate,
}

impl TokenSession {
    /// Create an empty session.
    pub fn new(refresh_skew: Duration, clock: SharedClock) -> Self {
        Self {
            token: RwLock::new(None),
            refresh_skew,
            clock,
            gate: RefreshGate::new(),
        }
    }

    /// Safety margin before expiry that triggers a proactive refresh.
    pub fn refresh_skew(&self) -> Duration {
        self.refresh_skew
    }

    /// Replace the cached token.
    pub fn update(&self, token: Option<AccessToken>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Drop the cached token.
    pub fn clear(&self) {
        self.update(None);
        debug!("Token session cleared");
    }

    /// The cached bearer value.
    pub fn access_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.value.clone())
    }

    /// Whether the cached token needs renewing before use.
    pub fn is_expiring(&self) -> bool {
        let token = self.token.read().unwrap_or_else(PoisonError::into_inner);
        self.token_expiring(token.as_ref())
    }

    /// Whether the token in `credentials` needs renewing before use.
    pub fn needs_refresh(&self, credentials: &Credentials) -> bool {
        self.token_expiring(credentials.token.as_ref())
    }

    fn token_expiring(&self, token: Option<&AccessToken>) -> bool {
        match token.and_then(|t| t.expires_at) {
            Some(expires_at) => self.clock.now() + self.refresh_skew >= expires_at,
            None => false,
        }
    }

    /// Whether a refresh is running.
    pub fn refresh_in_flight(&self) -> bool {
        self.gate.is_in_flight()
    }

    /// Re-read the provider's token, returning it with the refresh
    /// generation the read corresponds to.
    pub fn sync(&self, provider: &dyn TokenProvider) -> Credentials {
        let generation = self.gate.generation();
        let token = provider.current_token();
        self.update(token.clone());
        Credentials { generation, token }
    }

    /// Refresh through the shared gate, then re-read the token.
    ///
    /// # Errors
    ///
    /// Returns the provider's error; the cached token is cleared.
    pub async fn refresh(
        &self,
        provider: &Arc<dyn TokenProvider>,
        observed: u64,
    ) -> Result<Credentials, TokenError> {
        match self.gate.refresh(provider, observed).await {
            Ok(()) => Ok(self.sync(&**provider)),
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                self.clear();
                Err(e)
            }
        }
    }
}
