//! Configuration management for Tollgate.
//!
//! Configuration is layered:
//! - Bundled defaults (include_str! from tollgate.toml)
//! - User overrides (~/.config/tollgate/tollgate.toml, then ./tollgate.toml)
//! - `TOLLGATE_` environment variables, `__` separating nested keys

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tollgate_error::{ConfigError, TollgateResult};
use tollgate_rate_limit::{OperationClass, RateLimitConfig, RateLimitOverride, resolve_limits};
use tollgate_transport::{RefreshGrantProvider, TransportSettings, Url};
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../tollgate.toml");

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_refresh_skew_ms() -> u64 {
    30_000
}

fn default_csrf_header() -> String {
    "X-CSRF-Token".to_string()
}

/// API endpoint and call behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Base URL every request path is joined to
    pub base_url: String,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Renew tokens this many milliseconds before they expire
    #[serde(default = "default_refresh_skew_ms")]
    pub refresh_skew_ms: u64,
    /// Header carrying the anti-forgery token
    #[serde(default = "default_csrf_header")]
    pub csrf_header: String,
}

impl TransportConfig {
    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Proactive refresh margin.
    pub fn refresh_skew(&self) -> Duration {
        Duration::from_millis(self.refresh_skew_ms)
    }

    /// Settings for a [`ResilientTransport`](tollgate_transport::ResilientTransport).
    pub fn settings(&self) -> TransportSettings {
        TransportSettings::builder()
            .refresh_skew(self.refresh_skew())
            .csrf_header(self.csrf_header.clone())
            .build()
            .unwrap_or_default()
    }
}

/// OAuth2 token endpoint used by the refresh-grant provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Token endpoint URL
    pub token_url: String,
    /// Client identifier
    pub client_id: String,
    /// Client secret for confidential clients
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl AuthConfig {
    /// A signed-out refresh-grant provider for this identity provider.
    ///
    /// # Errors
    ///
    /// Returns an error if `token_url` is invalid or the HTTP client cannot
    /// be built.
    pub fn provider(&self, timeout: Duration) -> TollgateResult<RefreshGrantProvider> {
        let provider = RefreshGrantProvider::new(&self.token_url, self.client_id.clone(), timeout)?;
        Ok(match &self.client_secret {
            Some(secret) => provider.with_client_secret(secret.clone()),
            None => provider,
        })
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Complete Tollgate configuration.
///
/// # Example TOML
///
/// ```toml
/// [transport]
/// base_url = "https://api.example.com"
/// timeout_ms = 10_000
///
/// [rate_limits.login]
/// capacity = 5
/// window_ms = 300_000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TollgateConfig {
    /// Transport settings
    pub transport: TransportConfig,
    /// Limits keyed by operation class name; unset fields keep the default
    #[serde(default)]
    pub rate_limits: HashMap<String, RateLimitOverride>,
    /// Identity provider, when tokens are refreshed with a refresh grant
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

impl TollgateConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> TollgateResult<Self> {
        debug!("Loading configuration from file");

        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?;
        Self::from_built(config)
    }

    /// Load configuration with precedence: environment > current dir > home
    /// dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped if not found.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tollgate::TollgateConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = TollgateConfig::load()?;
    /// config.validate()?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if a present source cannot be parsed.
    #[instrument]
    pub fn load() -> TollgateResult<Self> {
        debug!(
            "Loading configuration with precedence: env > current dir > home dir > bundled defaults"
        );
        Self::build(Self::layered_files().add_source(Self::environment()))
    }

    /// Bundled defaults followed by the optional user files.
    fn layered_files() -> ConfigBuilder<DefaultState> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/tollgate/tollgate.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder.add_source(File::with_name("tollgate").required(false))
    }

    fn environment() -> Environment {
        Environment::with_prefix("TOLLGATE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> TollgateResult<Self> {
        let config = builder.build().map_err(|e| {
            ConfigError::new(format!("Failed to build configuration: {}", e))
        })?;
        Self::from_built(config)
    }

    fn from_built(config: Config) -> TollgateResult<Self> {
        Ok(config.try_deserialize().map_err(|e| {
            ConfigError::new(format!("Failed to parse configuration: {}", e))
        })?)
    }

    /// The refresh-grant provider described by `[auth]`, if present.
    ///
    /// Token requests use the transport timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the `[auth]` section is invalid.
    pub fn refresh_grant_provider(&self) -> TollgateResult<Option<RefreshGrantProvider>> {
        self.auth
            .as_ref()
            .map(|auth| auth.provider(self.transport.timeout()))
            .transpose()
    }

    /// The effective limit for every operation class.
    ///
    /// # Errors
    ///
    /// Returns an error if a `rate_limits` key is not a known class.
    pub fn resolved_rate_limits(
        &self,
    ) -> TollgateResult<BTreeMap<OperationClass, RateLimitConfig>> {
        resolve_limits(&self.rate_limits).map_err(|e| {
            ConfigError::new(format!("Invalid rate_limits: {}", e.kind())).into()
        })
    }

    /// Check values the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns an error for an unparsable base or token URL, a zero timeout,
    /// an unknown operation class, or a zero capacity or window.
    pub fn validate(&self) -> TollgateResult<()> {
        Url::parse(&self.transport.base_url).map_err(|e| {
            ConfigError::new(format!(
                "Invalid transport.base_url '{}': {}",
                self.transport.base_url, e
            ))
        })?;

        if self.transport.timeout_ms == 0 {
            return Err(ConfigError::new("transport.timeout_ms must be greater than zero").into());
        }

        for (class, limit) in self.resolved_rate_limits()? {
            if limit.capacity == 0 || limit.window_ms == 0 {
                return Err(ConfigError::new(format!(
                    "rate_limits.{} needs a non-zero capacity and window_ms",
                    class
                ))
                .into());
            }
        }

        if let Some(auth) = &self.auth {
            Url::parse(&auth.token_url).map_err(|e| {
                ConfigError::new(format!("Invalid auth.token_url '{}': {}", auth.token_url, e))
            })?;
        }

        Ok(())
    }
}
