//! Tests for the per-class limiter registry.

use std::collections::HashMap;
use std::time::Duration;
use strum::IntoEnumIterator;
use tollgate_core::ManualClock;
use tollgate_error::RateLimitErrorKind;
use tollgate_rate_limit::{OperationClass, RateLimitConfig, RateLimitOverride, RateLimiters};

#[test]
fn test_defaults_cover_every_class() {
    let limiters = RateLimiters::with_defaults();
    for class in OperationClass::iter() {
        let limiter = limiters.get(class).expect("limiter for every class");
        assert_eq!(limiter.capacity(), class.default_limit().capacity);
    }
    let login = limiters.get(OperationClass::Login).unwrap();
    assert_eq!(login.window(), Duration::from_secs(300));
}

#[test]
fn test_overrides_replace_defaults() {
    let mut overrides: HashMap<String, RateLimitOverride> = HashMap::new();
    overrides.insert("search".to_string(), RateLimitConfig::new(2, 1000).into());

    let limiters = RateLimiters::from_config(&overrides).unwrap();
    let search = limiters.get(OperationClass::Search).unwrap();
    assert_eq!(search.capacity(), 2);
    assert_eq!(search.window(), Duration::from_millis(1000));

    let api = limiters.get(OperationClass::Api).unwrap();
    assert_eq!(api.capacity(), 60);
}

#[test]
fn test_unknown_class_is_rejected() {
    let mut overrides: HashMap<String, RateLimitOverride> = HashMap::new();
    overrides.insert("checkout".to_string(), RateLimitConfig::new(2, 1000).into());

    let err = RateLimiters::from_config(&overrides).unwrap_err();
    assert_eq!(err.kind(), &RateLimitErrorKind::UnknownClass("checkout".to_string()));
}

#[test]
fn test_zero_capacity_override_is_rejected() {
    let mut overrides: HashMap<String, RateLimitOverride> = HashMap::new();
    overrides.insert("login".to_string(), RateLimitConfig::new(0, 1000).into());

    let err = RateLimiters::from_config(&overrides).unwrap_err();
    assert_eq!(err.kind(), &RateLimitErrorKind::InvalidCapacity);
}

#[test]
fn test_classes_are_independent() {
    let clock = ManualClock::new();
    let mut overrides: HashMap<String, RateLimitOverride> = HashMap::new();
    overrides.insert("login".to_string(), RateLimitConfig::new(1, 1000).into());
    overrides.insert("register".to_string(), RateLimitConfig::new(1, 1000).into());
    let limiters = RateLimiters::from_config_with_clock(&overrides, clock.shared()).unwrap();

    assert!(limiters.try_acquire(OperationClass::Login));
    assert!(!limiters.try_acquire(OperationClass::Login));
    assert!(limiters.try_acquire(OperationClass::Register));

    clock.advance(Duration::from_millis(1001));
    assert!(limiters.try_acquire(OperationClass::Login));
}

#[test]
fn test_reset_all_and_snapshot() {
    let clock = ManualClock::new();
    let limiters = RateLimiters::with_defaults_and_clock(clock.shared());

    for _ in 0..5 {
        limiters.try_acquire(OperationClass::Login);
    }
    let login = limiters
        .snapshot()
        .into_iter()
        .find(|s| s.class == OperationClass::Login)
        .unwrap();
    assert_eq!(*login.snapshot.remaining(), 0);
    assert_eq!(*login.snapshot.retry_after(), Duration::from_secs(300));

    limiters.reset_all();
    assert!(limiters
        .snapshot()
        .iter()
        .all(|s| *s.snapshot.current() == 0));
}

#[test]
fn test_snake_case_key_with_partial_override() {
    let mut overrides: HashMap<String, RateLimitOverride> = HashMap::new();
    overrides.insert(
        "profile_update".to_string(),
        RateLimitOverride {
            capacity: Some(20),
            window_ms: None,
        },
    );

    let limiters = RateLimiters::from_config(&overrides).unwrap();
    let profile = limiters.get(OperationClass::ProfileUpdate).unwrap();
    assert_eq!(profile.capacity(), 20);
    assert_eq!(profile.window(), Duration::from_secs(60));
}
