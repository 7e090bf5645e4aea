//! Token provider contract and a fixed-token implementation.

use async_trait::async_trait;
use std::time::Instant;
use tollgate_error::TokenError;
use tracing::debug;

/// A bearer token and when it stops being accepted.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Opaque bearer credential
    pub value: String,
    /// Expiry instant, if the issuer told us
    pub expires_at: Option<Instant>,
}

impl AccessToken {
    /// A token with a known expiry.
    pub fn new(value: impl Into<String>, expires_at: Instant) -> Self {
        Self {
            value: value.into(),
            expires_at: Some(expires_at),
        }
    }

    /// A token whose expiry is unknown. It is never refreshed proactively.
    pub fn without_expiry(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of bearer credentials, owned by the identity provider integration.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// The token to attach right now, if signed in.
    fn current_token(&self) -> Option<AccessToken>;

    /// Obtain a fresh token.
    ///
    /// The transport never runs two of these at once; concurrent callers share
    /// one refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity provider refuses or cannot be reached.
    async fn refresh(&self) -> Result<(), TokenError>;

    /// Start the external sign-in flow. Fire-and-forget.
    fn reauthenticate(&self);
}

/// A provider holding one fixed token.
///
/// Refreshing is a no-op, so a rejected token ends in `AuthExpired` after
/// the single retry.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    /// A provider that always presents `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// A provider with no credentials; requests go out unauthenticated.
    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    fn current_token(&self) -> Option<AccessToken> {
        self.token.as_ref().map(AccessToken::without_expiry)
    }

    async fn refresh(&self) -> Result<(), TokenError> {
        debug!("Static token provider has nothing to refresh");
        Ok(())
    }

    fn reauthenticate(&self) {
        debug!("Static token provider cannot reauthenticate");
    }
}
