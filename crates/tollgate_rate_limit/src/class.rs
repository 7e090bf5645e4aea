//! Guarded operation classes and their default limits.

use crate::RateLimitConfig;
use serde::{Deserialize, Serialize};

/// A family of calls that share one rate limiter.
///
/// Names are kebab-case in configuration (`profile-update`). The snake-case
/// spelling `profile_update` is also accepted, since environment variable
/// names cannot contain `-`.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use tollgate_rate_limit::OperationClass;
///
/// let class = OperationClass::from_str("profile-update").unwrap();
/// assert_eq!(class, OperationClass::ProfileUpdate);
/// assert_eq!(class.to_string(), "profile-update");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OperationClass {
    /// Generic API traffic
    Api,
    /// Sign-in attempts
    Login,
    /// Account registration
    Register,
    /// State-mutating profile updates
    #[serde(alias = "profile_update")]
    #[strum(to_string = "profile-update", serialize = "profile_update")]
    ProfileUpdate,
    /// Search queries
    Search,
}

impl OperationClass {
    /// Advisory default limit for this class.
    pub fn default_limit(&self) -> RateLimitConfig {
        match self {
            OperationClass::Api => RateLimitConfig::new(60, 60_000),
            OperationClass::Login => RateLimitConfig::new(5, 5 * 60_000),
            OperationClass::Register => RateLimitConfig::new(3, 60 * 60_000),
            OperationClass::ProfileUpdate => RateLimitConfig::new(10, 60_000),
            OperationClass::Search => RateLimitConfig::new(30, 60_000),
        }
    }
}
