//! Token provider for an OAuth2 / OpenID Connect token endpoint.

use crate::{AccessToken, TokenProvider};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tollgate_core::{SharedClock, SystemClock};
use tollgate_error::{ConfigError, TokenError, TokenErrorKind};
use tracing::{debug, info, instrument, warn};

/// Callback that starts an interactive sign-in.
pub type ReauthHook = Arc<dyn Fn() + Send + Sync>;

/// Successful token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// New access token
    pub access_token: String,
    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Replacement refresh token, when the issuer rotates them
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Clone)]
struct StoredTokens {
    access: AccessToken,
    refresh_token: Option<String>,
}

/// Holds a token pair and renews it with `grant_type=refresh_token`.
///
/// A refused refresh signs the user out; the transport then reports
/// `AuthExpired` and calls [`TokenProvider::reauthenticate`], which runs the
/// hook installed with [`RefreshGrantProvider::on_reauthenticate`].
pub struct RefreshGrantProvider {
    client: reqwest::Client,
    token_url: Url,
    client_id: String,
    client_secret: Option<String>,
    clock: SharedClock,
    tokens: RwLock<Option<StoredTokens>>,
    reauth: Option<ReauthHook>,
}

impl RefreshGrantProvider {
    /// Create a signed-out provider for the token endpoint at `token_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `token_url` is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(
        token_url: &str,
        client_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let token_url = Url::parse(token_url)
            .map_err(|e| ConfigError::new(format!("Invalid token URL '{}': {}", token_url, e)))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build token client: {}", e)))?;

        Ok(Self {
            client,
            token_url,
            client_id: client_id.into(),
            client_secret: None,
            clock: SystemClock::shared(),
            tokens: RwLock::new(None),
            reauth: None,
        })
    }

    /// Authenticate as a confidential client.
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Compute expiry instants against `clock`.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Run `hook` whenever the transport asks for a fresh sign-in.
    pub fn on_reauthenticate(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.reauth = Some(Arc::new(hook));
        self
    }

    /// Store the tokens from a completed sign-in.
    pub fn sign_in(&self, response: TokenResponse) {
        let stored = self.store(response, None);
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = Some(stored);
        info!("Signed in");
    }

    /// Resume a session from a stored refresh token alone.
    ///
    /// The access token is unknown, so it is recorded as already expired and
    /// the transport renews it before the first dispatch.
    pub fn resume(&self, refresh_token: impl Into<String>) {
        let stored = StoredTokens {
            access: AccessToken::new(String::new(), self.clock.now()),
            refresh_token: Some(refresh_token.into()),
        };
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = Some(stored);
        info!("Session resumed from refresh token");
    }

    /// Forget all tokens.
    pub fn sign_out(&self) {
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = None;
        info!("Signed out");
    }

    /// Whether a token pair is held.
    pub fn is_signed_in(&self) -> bool {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Convert an endpoint response, keeping `previous_refresh` when the
    /// issuer did not rotate it.
    fn store(&self, response: TokenResponse, previous_refresh: Option<String>) -> StoredTokens {
        // An expiry past what `Instant` can represent is treated as unknown
        let expires_at = response
            .expires_in
            .and_then(|secs| self.clock.now().checked_add(Duration::from_secs(secs)));
        let access = match expires_at {
            Some(expires_at) => AccessToken::new(response.access_token, expires_at),
            None => AccessToken::without_expiry(response.access_token),
        };
        StoredTokens {
            access,
            refresh_token: response.refresh_token.or(previous_refresh),
        }
    }

    fn refresh_token(&self) -> Option<String> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
    }
}

#[async_trait]
impl TokenProvider for RefreshGrantProvider {
    fn current_token(&self) -> Option<AccessToken> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.access.clone())
    }

    #[instrument(skip(self), fields(token_url = %self.token_url))]
    async fn refresh(&self) -> Result<(), TokenError> {
        let refresh_token = self
            .refresh_token()
            .ok_or_else(|| TokenError::new(TokenErrorKind::NoSession))?;

        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        debug!("Requesting token refresh");
        let response = self
            .client
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| TokenError::new(TokenErrorKind::Network(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("error_description")
                        .or_else(|| v.get("error"))
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());

            warn!(status = status.as_u16(), "Token endpoint refused refresh");
            self.sign_out();
            return Err(TokenError::new(TokenErrorKind::Rejected {
                status: status.as_u16(),
                message,
            }));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| TokenError::new(TokenErrorKind::Parse(e.to_string())))?;

        let stored = self.store(parsed, Some(refresh_token));
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = Some(stored);
        debug!("Token refreshed");
        Ok(())
    }

    fn reauthenticate(&self) {
        match &self.reauth {
            Some(hook) => hook(),
            None => warn!("Re-authentication requested but no sign-in hook is installed"),
        }
    }
}

impl std::fmt::Debug for RefreshGrantProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshGrantProvider")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .field("signed_in", &self.is_signed_in())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::{Clock, ManualClock};

    fn provider(clock: &ManualClock) -> RefreshGrantProvider {
        RefreshGrantProvider::new("https://id.example.com/token", "app", Duration::from_secs(5))
            .unwrap()
            .with_clock(clock.shared())
    }

    #[test]
    fn test_sign_in_records_expiry() {
        let clock = ManualClock::new();
        let provider = provider(&clock);
        assert!(provider.current_token().is_none());

        provider.sign_in(TokenResponse {
            access_token: "a1".into(),
            expires_in: Some(300),
            refresh_token: Some("r1".into()),
        });

        let token = provider.current_token().unwrap();
        assert_eq!(token.value, "a1");
        assert_eq!(token.expires_at, Some(clock.now() + Duration::from_secs(300)));
        assert!(provider.is_signed_in());

        provider.sign_out();
        assert!(provider.current_token().is_none());
    }

    #[test]
    fn test_unrepresentable_lifetime_has_no_expiry() {
        let clock = ManualClock::new();
        let provider = provider(&clock);

        provider.sign_in(TokenResponse {
            access_token: "a1".into(),
            expires_in: Some(u64::MAX),
            refresh_token: Some("r1".into()),
        });

        let token = provider.current_token().unwrap();
        assert_eq!(token.value, "a1");
        assert!(token.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_refresh_without_session() {
        let clock = ManualClock::new();
        let err = provider(&clock).refresh().await.unwrap_err();
        assert_eq!(err.kind, TokenErrorKind::NoSession);
    }

    #[test]
    fn test_invalid_token_url() {
        assert!(RefreshGrantProvider::new("not a url", "app", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_reauth_hook_runs() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let clock = ManualClock::new();
        let provider = provider(&clock).on_reauthenticate(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        provider.reauthenticate();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
