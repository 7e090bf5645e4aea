//! Tests for the reqwest-backed HTTP client and refresh-grant provider.

use std::time::Duration;
use tollgate_core::{Clock, ManualClock};
use tollgate_error::TokenErrorKind;
use tollgate_transport::{
    HttpClient, HttpRequest, Method, RefreshGrantProvider, ReqwestClient, TokenProvider,
    TokenResponse,
};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(method: Method, path: &str) -> HttpRequest {
    HttpRequest {
        method,
        path: path.to_string(),
        headers: Vec::new(),
        json: None,
        timeout: None,
    }
}

#[tokio::test]
async fn test_non_success_status_is_a_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users/7"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such user"))
        .mount(&server)
        .await;

    let client =
        ReqwestClient::new(&format!("{}/v1", server.uri()), Duration::from_secs(5)).unwrap();
    let mut req = request(Method::GET, "/users/7");
    req.headers.push(("Authorization".to_string(), "Bearer abc".to_string()));

    let response = client.send(req).await.unwrap();

    assert_eq!(response.status, 404);
    assert_eq!(response.text(), "no such user");
    assert!(
        response
            .header("content-type")
            .is_some_and(|ct| ct.starts_with("text/plain"))
    );
}

#[tokio::test]
async fn test_json_body_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_string_contains("ada@example.com"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 1})))
        .mount(&server)
        .await;

    let client = ReqwestClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let mut req = request(Method::POST, "/register");
    req.json = Some(serde_json::json!({"email": "ada@example.com"}));

    let response = client.send(req).await.unwrap();

    assert_eq!(response.status, 201);
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["id"], 1);
}

#[tokio::test]
async fn test_timeout_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = ReqwestClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let mut req = request(Method::GET, "/slow");
    req.timeout = Some(Duration::from_millis(50));

    let err = client.send(req).await.unwrap_err();
    assert!(err.timed_out);
}

fn signed_in_provider(server: &MockServer, clock: &ManualClock) -> RefreshGrantProvider {
    let provider = RefreshGrantProvider::new(
        &format!("{}/oauth/token", server.uri()),
        "tollgate-app",
        Duration::from_secs(5),
    )
    .unwrap()
    .with_clock(clock.shared());
    provider.sign_in(TokenResponse {
        access_token: "access-1".to_string(),
        expires_in: Some(60),
        refresh_token: Some("refresh-1".to_string()),
    });
    provider
}

#[tokio::test]
async fn test_refresh_grant_replaces_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .and(body_string_contains("client_id=tollgate-app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "access-2",
            "expires_in": 300,
            "token_type": "Bearer"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let clock = ManualClock::new();
    let provider = signed_in_provider(&server, &clock);

    provider.refresh().await.unwrap();
    let token = provider.current_token().unwrap();
    assert_eq!(token.value, "access-2");
    assert_eq!(token.expires_at, Some(clock.now() + Duration::from_secs(300)));

    // Refresh token was not rotated, so the old one is reused
    provider.refresh().await.unwrap();
}

#[tokio::test]
async fn test_refresh_grant_rejection_signs_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Token is not active"
        })))
        .mount(&server)
        .await;

    let clock = ManualClock::new();
    let provider = signed_in_provider(&server, &clock);

    let err = provider.refresh().await.unwrap_err();

    assert_eq!(
        err.kind,
        TokenErrorKind::Rejected {
            status: 400,
            message: "Token is not active".to_string()
        }
    );
    assert!(!provider.is_signed_in());
    assert!(provider.current_token().is_none());
}

#[tokio::test]
async fn test_refresh_grant_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let clock = ManualClock::new();
    let provider = signed_in_provider(&server, &clock);

    let err = provider.refresh().await.unwrap_err();
    assert!(matches!(err.kind, TokenErrorKind::Parse(_)));
    assert_eq!(provider.current_token().unwrap().value, "access-1");
}

#[tokio::test]
async fn test_refresh_grant_tolerates_huge_lifetime() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "access-forever",
            "expires_in": u64::MAX
        })))
        .mount(&server)
        .await;

    let clock = ManualClock::new();
    let provider = signed_in_provider(&server, &clock);

    provider.refresh().await.unwrap();
    let token = provider.current_token().unwrap();
    assert_eq!(token.value, "access-forever");
    assert!(token.expires_at.is_none());
}

#[tokio::test]
async fn test_resumed_session_refreshes_with_stored_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("refresh_token=saved-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "access-9",
            "expires_in": 600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let clock = ManualClock::new();
    let provider = RefreshGrantProvider::new(
        &format!("{}/oauth/token", server.uri()),
        "tollgate-app",
        Duration::from_secs(5),
    )
    .unwrap()
    .with_clock(clock.shared());
    provider.resume("saved-refresh");

    let placeholder = provider.current_token().unwrap();
    assert_eq!(placeholder.expires_at, Some(clock.now()), "already expired");

    provider.refresh().await.unwrap();
    assert_eq!(provider.current_token().unwrap().value, "access-9");
}

#[tokio::test]
async fn test_off_base_path_never_reaches_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client =
        ReqwestClient::new(&format!("{}/v1", server.uri()), Duration::from_secs(5)).unwrap();
    let mut req = request(Method::GET, &format!("{}/other", server.uri()));
    req.headers.push(("Authorization".to_string(), "Bearer abc".to_string()));

    let err = client.send(req).await.unwrap_err();
    assert!(err.message.contains("relative"));
}
