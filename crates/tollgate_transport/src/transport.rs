//! Credential-attaching transport with proactive refresh and one 401 retry.

use crate::{
    Credentials, HttpClient, HttpRequest, HttpResponse, Method, Notifier, RequestOptions,
    TokenProvider, TokenSession, TransportSettings, classify_network, classify_response,
};
use std::sync::Arc;
use tollgate_core::{SharedClock, SystemClock};
use tollgate_error::{TokenError, TransportError, TransportErrorKind};
use tracing::{debug, error, instrument, warn};

/// Source of the anti-forgery token for the current request context.
pub trait ContextCredentials: Send + Sync {
    /// The token to send, if the context has one.
    fn anti_forgery_token(&self) -> Option<String>;
}

impl<F> ContextCredentials for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn anti_forgery_token(&self) -> Option<String> {
        self()
    }
}

/// Where a call is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum CallState {
    /// Reading and, if needed, renewing credentials
    #[display("preparing")]
    Preparing,
    /// Request sent, awaiting a response
    #[display("dispatched")]
    Dispatched,
    /// Renewing credentials after a 401
    #[display("retrying")]
    Retrying,
    /// 2xx received
    #[display("succeeded")]
    Succeeded,
    /// Terminal classified failure
    #[display("failed")]
    Failed,
}

/// Per-call bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestAttempt {
    /// Whether the single 401 retry has been spent
    pub has_retried: bool,
    /// Requests sent so far
    pub dispatches: u32,
}

/// Wraps every outbound API call.
///
/// Attaches the bearer token and anti-forgery header, renews tokens that are
/// about to expire, retries once after a 401 with freshly renewed credentials,
/// and turns every failure into a [`TransportError`] that is both returned and
/// sent to the [`Notifier`] exactly once.
///
/// One instance is shared by all calls (wrap it in an `Arc`); concurrent calls
/// share a single token refresh.
pub struct ResilientTransport {
    client: Arc<dyn HttpClient>,
    provider: Arc<dyn TokenProvider>,
    notifier: Arc<dyn Notifier>,
    context: Option<Arc<dyn ContextCredentials>>,
    session: TokenSession,
    settings: TransportSettings,
}

impl ResilientTransport {
    /// Create a transport on the system clock.
    pub fn new(
        settings: TransportSettings,
        client: Arc<dyn HttpClient>,
        provider: Arc<dyn TokenProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let session = TokenSession::new(*settings.refresh_skew(), SystemClock::shared());
        Self {
            client,
            provider,
            notifier,
            context: None,
            session,
            settings,
        }
    }

    /// Attach anti-forgery tokens from `credentials` to every request.
    pub fn with_context_credentials(mut self, credentials: Arc<dyn ContextCredentials>) -> Self {
        self.context = Some(credentials);
        self
    }

    /// Judge token expiry against `clock`.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.session = TokenSession::new(*self.settings.refresh_skew(), clock);
        self
    }

    /// The transport's token session.
    pub fn session(&self) -> &TokenSession {
        &self.session
    }

    /// Transport-wide settings.
    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    /// Perform one API call.
    ///
    /// # Errors
    ///
    /// Returns the classified failure for any non-2xx outcome, a missing
    /// response, or credentials that could not be renewed. The same failure
    /// has already been sent to the notifier.
    #[instrument(skip(self, options), fields(method = %method, path = %path))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse, TransportError> {
        let mut attempt = RequestAttempt::default();
        let result = self.run(&method, path, &options, &mut attempt).await;
        match &result {
            Ok(response) => {
                debug!(
                    state = %CallState::Succeeded,
                    status = response.status,
                    dispatches = attempt.dispatches,
                    "Call finished"
                );
            }
            Err(err) => self.fail(err, &attempt),
        }
        result
    }

    /// `GET` with default options.
    ///
    /// # Errors
    ///
    /// See [`ResilientTransport::request`].
    pub async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        self.request(Method::GET, path, RequestOptions::default())
            .await
    }

    /// `DELETE` with default options.
    ///
    /// # Errors
    ///
    /// See [`ResilientTransport::request`].
    pub async fn delete(&self, path: &str) -> Result<HttpResponse, TransportError> {
        self.request(Method::DELETE, path, RequestOptions::default())
            .await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ResilientTransport::request`].
    pub async fn post(
        &self,
        path: &str,
        json: serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        self.request(Method::POST, path, RequestOptions::with_json(json))
            .await
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ResilientTransport::request`].
    pub async fn put(
        &self,
        path: &str,
        json: serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        self.request(Method::PUT, path, RequestOptions::with_json(json))
            .await
    }

    async fn run(
        &self,
        method: &Method,
        path: &str,
        options: &RequestOptions,
        attempt: &mut RequestAttempt,
    ) -> Result<HttpResponse, TransportError> {
        debug!(state = %CallState::Preparing, "Call state");
        let mut credentials = self.prepare(options).await?;

        loop {
            let bearer = if options.skip_auth() {
                None
            } else {
                credentials.bearer()
            };
            let response = self.dispatch(method, path, options, bearer, attempt).await?;
            if response.is_success() {
                return Ok(response);
            }

            if response.status == 401 && !attempt.has_retried && bearer.is_some() {
                attempt.has_retried = true;
                warn!(
                    state = %CallState::Retrying,
                    "Credentials rejected, refreshing and retrying once"
                );
                credentials = self
                    .session
                    .refresh(&self.provider, credentials.generation)
                    .await
                    .map_err(Self::renewal_failed)?;
                continue;
            }

            return Err(classify_response(&response));
        }
    }

    /// Read the provider's token and renew it if it is about to expire.
    async fn prepare(&self, options: &RequestOptions) -> Result<Credentials, TransportError> {
        let credentials = self.session.sync(&*self.provider);
        if options.skip_auth() || !self.session.needs_refresh(&credentials) {
            return Ok(credentials);
        }

        debug!(
            in_flight = self.session.refresh_in_flight(),
            "Token expiring, refreshing before dispatch"
        );
        self.session
            .refresh(&self.provider, credentials.generation)
            .await
            .map_err(Self::renewal_failed)
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        options: &RequestOptions,
        bearer: Option<&str>,
        attempt: &mut RequestAttempt,
    ) -> Result<HttpResponse, TransportError> {
        let mut headers = options.headers().clone();
        if let Some(csrf) = self.context.as_ref().and_then(|c| c.anti_forgery_token()) {
            headers.push((self.settings.csrf_header().clone(), csrf));
        }
        if let Some(token) = bearer {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        let request = HttpRequest {
            method: method.clone(),
            path: path.to_string(),
            headers,
            json: options.json().clone(),
            timeout: *options.timeout(),
        };

        attempt.dispatches += 1;
        debug!(
            state = %CallState::Dispatched,
            dispatch = attempt.dispatches,
            "Call state"
        );

        self.client.send(request).await.map_err(|e| {
            warn!(error = %e, timed_out = e.timed_out, "No response from server");
            classify_network(&e)
        })
    }

    fn renewal_failed(err: TokenError) -> TransportError {
        debug!(error = %err, "Credentials could not be renewed");
        TransportError::fallback(TransportErrorKind::AuthExpired)
    }

    fn fail(&self, err: &TransportError, attempt: &RequestAttempt) {
        error!(
            state = %CallState::Failed,
            kind = %err.kind,
            status = ?err.status_code,
            dispatches = attempt.dispatches,
            "Call failed"
        );
        if err.kind == TransportErrorKind::AuthExpired {
            self.session.clear();
            self.provider.reauthenticate();
        }
        self.notifier.notify(err.severity(), &err.message);
    }
}

impl std::fmt::Debug for ResilientTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientTransport")
            .field("session", &self.session)
            .field("settings", &self.settings)
            .field("context_credentials", &self.context.is_some())
            .finish()
    }
}
