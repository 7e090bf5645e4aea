//! Composition root pairing client-side throttles with the transport.

use crate::TollgateConfig;
use std::sync::Arc;
use std::time::Duration;
use tollgate_core::SharedClock;
use tollgate_error::{TollgateResult, TransportError};
use tollgate_rate_limit::{OperationClass, RateLimiters};
use tollgate_transport::{
    HttpClient, HttpResponse, Method, Notifier, ReqwestClient, RequestOptions,
    ResilientTransport, TokenProvider,
};
use tracing::{debug, instrument, warn};

/// Why a gated call did not produce a response.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum GatewayError {
    /// The local limiter for `class` refused the call; nothing was sent.
    #[display("Too many {} requests, try again in {:?}", class, retry_after)]
    Throttled {
        /// Class whose budget is spent
        class: OperationClass,
        /// Time until the oldest call leaves the window
        retry_after: Duration,
    },
    /// The call was sent and failed.
    #[display("{}", _0)]
    #[from]
    Transport(TransportError),
}

/// Throttles each call by operation class, then sends it through the
/// resilient transport.
///
/// Local denials return [`GatewayError::Throttled`] and are not notified;
/// they are the caller's cue to disable the control or show a countdown.
#[derive(Debug, Clone)]
pub struct ApiGateway {
    limiters: Arc<RateLimiters>,
    transport: Arc<ResilientTransport>,
}

impl ApiGateway {
    /// Pair existing limiters and transport.
    pub fn new(limiters: RateLimiters, transport: Arc<ResilientTransport>) -> Self {
        Self {
            limiters: Arc::new(limiters),
            transport,
        }
    }

    /// Build limiters and a reqwest-backed transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(
        config: &TollgateConfig,
        provider: Arc<dyn TokenProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> TollgateResult<Self> {
        config.validate()?;
        let client = ReqwestClient::new(&config.transport.base_url, config.transport.timeout())?;
        Self::with_client(config, Arc::new(client), provider, notifier)
    }

    /// Build from configuration around a caller-supplied HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if a rate limit in the configuration is invalid.
    pub fn with_client(
        config: &TollgateConfig,
        client: Arc<dyn HttpClient>,
        provider: Arc<dyn TokenProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> TollgateResult<Self> {
        let limiters = RateLimiters::from_config(&config.rate_limits)?;
        let transport =
            ResilientTransport::new(config.transport.settings(), client, provider, notifier);
        Ok(Self::new(limiters, Arc::new(transport)))
    }

    /// Judge limiter windows and token expiry against `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if a rate limit in the configuration is invalid.
    pub fn with_clock(
        config: &TollgateConfig,
        client: Arc<dyn HttpClient>,
        provider: Arc<dyn TokenProvider>,
        notifier: Arc<dyn Notifier>,
        clock: SharedClock,
    ) -> TollgateResult<Self> {
        let limiters = RateLimiters::from_config_with_clock(&config.rate_limits, clock.clone())?;
        let transport =
            ResilientTransport::new(config.transport.settings(), client, provider, notifier)
                .with_clock(clock);
        Ok(Self::new(limiters, Arc::new(transport)))
    }

    /// The per-class limiters.
    pub fn limiters(&self) -> &RateLimiters {
        &self.limiters
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Arc<ResilientTransport> {
        &self.transport
    }

    /// Admit the call under `class`'s limit, then send it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Throttled`] without sending when the class
    /// budget is spent, or the transport's classified failure.
    #[instrument(skip(self, options), fields(class = %class, method = %method, path = %path))]
    pub async fn call(
        &self,
        class: OperationClass,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse, GatewayError> {
        if let Some(limiter) = self.limiters.get(class) {
            if !limiter.try_acquire() {
                let retry_after = limiter.time_until_reset();
                warn!(?retry_after, "Call throttled locally");
                return Err(GatewayError::Throttled { class, retry_after });
            }
        }

        debug!("Call admitted");
        Ok(self.transport.request(method, path, options).await?)
    }
}
