//! Test utilities for transport tests.
//!
//! This module provides mock implementations and test helpers.

pub mod mock_client;
pub mod mock_provider;

#[allow(unused_imports)]
pub use mock_client::{MockHttpClient, MockResponse};
#[allow(unused_imports)]
pub use mock_provider::MockTokenProvider;
