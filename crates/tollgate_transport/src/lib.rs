//! Resilient API transport for Tollgate.
//!
//! [`ResilientTransport`] wraps every outbound call:
//! - attaches `Authorization: Bearer` and the anti-forgery header
//! - renews credentials shortly before they expire, sharing one refresh
//!   between concurrent callers
//! - retries exactly once after a 401, with renewed credentials
//! - classifies every failure into the closed
//!   [`TransportErrorKind`](tollgate_error::TransportErrorKind) taxonomy and
//!   reports it to a [`Notifier`] once
//!
//! The wire, the identity provider and the notification sink are traits:
//! [`HttpClient`] ([`ReqwestClient`]), [`TokenProvider`]
//! ([`RefreshGrantProvider`], [`StaticTokenProvider`]) and [`Notifier`]
//! ([`TracingNotifier`], [`CollectingNotifier`]).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tollgate_transport::{
//!     Method, ReqwestClient, RequestOptions, ResilientTransport, StaticTokenProvider,
//!     TracingNotifier, TransportSettings,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ReqwestClient::new("https://api.example.com", Duration::from_secs(10))?;
//! let transport = ResilientTransport::new(
//!     TransportSettings::default(),
//!     Arc::new(client),
//!     Arc::new(StaticTokenProvider::new("token")),
//!     Arc::new(TracingNotifier),
//! );
//!
//! let response = transport
//!     .request(Method::GET, "/me", RequestOptions::default())
//!     .await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod classify;
mod http;
mod notify;
mod options;
mod refresh_grant;
mod reqwest_client;
mod session;
mod token;
mod transport;

pub use classify::{classify_network, classify_response, server_message};
pub use http::{HttpClient, HttpRequest, HttpResponse, Method, Url};
pub use notify::{CollectingNotifier, Notifier, TracingNotifier};
pub use options::{
    RequestOptions, RequestOptionsBuilder, RequestOptionsBuilderError, TransportSettings,
    TransportSettingsBuilder, TransportSettingsBuilderError,
};
pub use refresh_grant::{ReauthHook, RefreshGrantProvider, TokenResponse};
pub use reqwest_client::ReqwestClient;
pub use session::{Credentials, RefreshGate, TokenSession};
pub use token::{AccessToken, StaticTokenProvider, TokenProvider};
pub use transport::{CallState, ContextCredentials, RequestAttempt, ResilientTransport};
