//! Per-call options and transport-wide settings.

use std::time::Duration;

/// Options for a single call.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tollgate_transport::RequestOptions;
///
/// let options = RequestOptions::builder()
///     .json(serde_json::json!({"display_name": "Ada"}))
///     .timeout(Duration::from_secs(5))
///     .build()
///     .unwrap();
/// assert!(options.json().is_some());
/// assert!(!options.skip_auth());
/// ```
#[derive(Debug, Clone, Default, PartialEq, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into), default)]
pub struct RequestOptions {
    /// Extra headers
    headers: Vec<(String, String)>,
    /// JSON body
    #[builder(setter(into, strip_option))]
    json: Option<serde_json::Value>,
    /// Timeout overriding the client default
    #[builder(setter(into, strip_option))]
    timeout: Option<Duration>,
    /// Send without bearer credentials (sign-in, registration)
    #[getter(skip)]
    skip_auth: bool,
}

impl RequestOptions {
    /// Start building options.
    pub fn builder() -> RequestOptionsBuilder {
        RequestOptionsBuilder::default()
    }

    /// Default options carrying a JSON body.
    pub fn with_json(json: serde_json::Value) -> Self {
        Self {
            json: Some(json),
            ..Self::default()
        }
    }

    /// Whether bearer credentials are withheld.
    pub fn skip_auth(&self) -> bool {
        self.skip_auth
    }
}

/// Settings shared by every call on one transport.
#[derive(Debug, Clone, PartialEq, Eq, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into))]
pub struct TransportSettings {
    /// Renew tokens this long before they expire
    #[builder(default = "Duration::from_secs(30)")]
    refresh_skew: Duration,
    /// Header carrying the anti-forgery token
    #[builder(default = "String::from(\"X-CSRF-Token\")")]
    csrf_header: String,
}

impl TransportSettings {
    /// Start building settings.
    pub fn builder() -> TransportSettingsBuilder {
        TransportSettingsBuilder::default()
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            refresh_skew: Duration::from_secs(30),
            csrf_header: String::from("X-CSRF-Token"),
        }
    }
}
