// ABOUTME: Unit and HTTP tests for the cloud OAuth2 PKCE client
// ABOUTME: Validates PKCE parameters, token expiry, authorization URLs and token endpoint error mapping
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Duration, Utc};
use common::{init_test_logging, TEST_CLIENT_ID, TEST_REDIRECT_URI};
use health_bridge::oauth2_client::{
    generate_state, OAuth2Client, OAuth2Config, OAuth2Token, PkceParams,
};
use health_bridge::OAuthError;
use serde_json::json;
use std::collections::HashMap;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(token_url: &str) -> OAuth2Config {
    OAuth2Config {
        client_id: TEST_CLIENT_ID.to_owned(),
        client_secret: None,
        auth_url: "https://accounts.example.com/oauth2/v3/authorize".to_owned(),
        token_url: token_url.to_owned(),
        redirect_uri: TEST_REDIRECT_URI.to_owned(),
        scopes: vec![
            "openid".to_owned(),
            "https://www.huawei.com/healthkit/step.read".to_owned(),
        ],
    }
}

fn token(expires_in: Option<Duration>) -> OAuth2Token {
    OAuth2Token {
        access_token: "test_access_token".to_owned(),
        token_type: "Bearer".to_owned(),
        expires_at: expires_in.map(|d| Utc::now() + d),
        refresh_token: Some("test_refresh_token".to_owned()),
        scope: Some("openid step.read".to_owned()),
    }
}

async fn token_server() -> (MockServer, OAuth2Client) {
    init_test_logging();
    let server = MockServer::start().await;
    let client = OAuth2Client::new(config(&format!("{}/oauth2/v3/token", server.uri())));
    (server, client)
}

// =============================================================================
// PkceParams Tests
// =============================================================================

#[test]
fn test_pkce_verifier_length_and_method() {
    let pkce = PkceParams::generate();

    assert_eq!(pkce.code_verifier().len(), 64);
    assert_eq!(pkce.code_challenge_method, "S256");
}

#[test]
fn test_pkce_code_verifier_characters() {
    let pkce = PkceParams::generate();

    for c in pkce.code_verifier().chars() {
        assert!(
            c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '~',
            "Invalid character in code verifier: {c}"
        );
    }
}

#[test]
fn test_pkce_params_uniqueness() {
    let pkce1 = PkceParams::generate();
    let pkce2 = PkceParams::generate();

    assert_ne!(pkce1.code_verifier(), pkce2.code_verifier());
    assert_ne!(pkce1.code_challenge, pkce2.code_challenge);
}

#[test]
fn test_pkce_challenge_matches_rfc_vector() {
    // RFC 7636 appendix B
    let pkce = PkceParams::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_owned());
    assert_eq!(pkce.code_challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
}

#[test]
fn test_pkce_debug_hides_verifier() {
    let pkce = PkceParams::from_verifier("secretverifier".repeat(4));
    let debug = format!("{pkce:?}");

    assert!(!debug.contains("secretverifier"));
    assert!(debug.contains("[REDACTED]"));
    assert!(debug.contains(&pkce.code_challenge));
}

#[test]
fn test_state_nonces_are_unique() {
    let first = generate_state();
    let second = generate_state();

    assert_eq!(first.len(), 32);
    assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_ne!(first, second);
}

// =============================================================================
// OAuth2Token Tests
// =============================================================================

#[test]
fn test_oauth2_token_is_expired_when_past() {
    assert!(token(Some(Duration::hours(-1))).is_expired());
}

#[test]
fn test_oauth2_token_not_expired_when_future() {
    assert!(!token(Some(Duration::hours(1))).is_expired());
}

#[test]
fn test_oauth2_token_not_expired_when_no_expiry() {
    let token = OAuth2Token::bearer("host-token");
    assert!(!token.is_expired());
    assert!(!token.will_expire_soon());
    assert!(token.scopes().is_none());
}

#[test]
fn test_oauth2_token_will_expire_soon_within_5_minutes() {
    assert!(token(Some(Duration::minutes(3))).will_expire_soon());
    assert!(!token(Some(Duration::minutes(10))).will_expire_soon());
}

#[test]
fn test_oauth2_token_scopes_split_on_whitespace() {
    let token = token(None);
    assert_eq!(token.scopes().unwrap(), vec!["openid", "step.read"]);

    let blank = OAuth2Token {
        scope: Some("  ".to_owned()),
        ..token
    };
    assert!(blank.scopes().is_none());
}

#[test]
fn test_oauth2_token_debug_is_redacted() {
    let debug = format!("{:?}", token(None));
    assert!(!debug.contains("test_access_token"));
    assert!(!debug.contains("test_refresh_token"));
}

// =============================================================================
// OAuth2Config Tests
// =============================================================================

#[test]
fn test_oauth2_config_validates() {
    config("https://accounts.example.com/oauth2/v3/token")
        .validate()
        .unwrap();
}

#[test]
fn test_oauth2_config_rejects_empty_client_id() {
    let mut config = config("https://accounts.example.com/oauth2/v3/token");
    config.client_id = "  ".to_owned();

    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        OAuthError::InvalidConfiguration { ref message } if message.contains("client_id")
    ));
}

#[test]
fn test_oauth2_config_rejects_malformed_endpoint() {
    let config = config("not-a-valid-url");
    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        OAuthError::InvalidConfiguration { ref message } if message.contains("token_url")
    ));
}

#[test]
fn test_oauth2_config_debug_hides_secret() {
    let mut config = config("https://accounts.example.com/oauth2/v3/token");
    config.client_secret = Some("very-secret".to_owned());
    assert!(!format!("{config:?}").contains("very-secret"));
}

// =============================================================================
// Authorization URL Tests
// =============================================================================

#[test]
fn test_authorization_url_carries_pkce_and_state() {
    let client = OAuth2Client::new(config("https://accounts.example.com/oauth2/v3/token"));
    let pkce = PkceParams::generate();

    let url = client.authorization_url("state-123", &pkce).unwrap();
    let parsed = Url::parse(&url).unwrap();
    let params: HashMap<String, String> = parsed.query_pairs().into_owned().collect();

    assert!(url.starts_with("https://accounts.example.com/oauth2/v3/authorize?"));
    assert_eq!(params["client_id"], TEST_CLIENT_ID);
    assert_eq!(params["redirect_uri"], TEST_REDIRECT_URI);
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["access_type"], "offline");
    assert_eq!(params["state"], "state-123");
    assert_eq!(params["code_challenge"], pkce.code_challenge);
    assert_eq!(params["code_challenge_method"], "S256");
    assert_eq!(
        params["scope"],
        "openid https://www.huawei.com/healthkit/step.read"
    );
    assert!(!url.contains(pkce.code_verifier()));
}

#[test]
fn test_authorization_url_invalid_base_url() {
    let mut config = config("https://accounts.example.com/oauth2/v3/token");
    config.auth_url = "not-a-valid-url".to_owned();
    let client = OAuth2Client::new(config);

    let err = client
        .authorization_url("state", &PkceParams::generate())
        .unwrap_err();
    assert!(matches!(err, OAuthError::InvalidConfiguration { .. }));
}

// =============================================================================
// Token Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_exchange_code_posts_verifier() {
    let (server, client) = token_server().await;
    let pkce = PkceParams::from_verifier("verifier".repeat(8));

    Mock::given(method("POST"))
        .and(path("/oauth2/v3/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-123"))
        .and(body_string_contains(format!("code_verifier={}", "verifier".repeat(8))))
        .and(body_string_contains(format!("client_id={TEST_CLIENT_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "expires_in": 3600,
            "scope": "openid https://www.huawei.com/healthkit/step.read",
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = client.exchange_code("auth-code-123", &pkce).await.unwrap();

    assert_eq!(token.access_token, "access-1");
    assert_eq!(token.refresh_token.as_deref(), Some("refresh-1"));
    assert!(!token.is_expired());
    assert!(!token.will_expire_soon());
    assert_eq!(token.scopes().unwrap().len(), 2);
}

#[tokio::test]
async fn test_exchange_code_keeps_provider_error_verbatim() {
    let (server, client) = token_server().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/v3/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "code expired"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client
        .exchange_code("stale-code", &PkceParams::generate())
        .await
        .unwrap_err();

    assert_eq!(err.provider_code(), Some("invalid_grant"));
    assert_eq!(
        err,
        OAuthError::Provider {
            code: "invalid_grant".to_owned(),
            description: Some("code expired".to_owned()),
        }
    );
}

#[tokio::test]
async fn test_non_json_failure_maps_to_http_status_code() {
    let (server, client) = token_server().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/v3/token"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = client
        .exchange_code("code", &PkceParams::generate())
        .await
        .unwrap_err();

    assert_eq!(err.provider_code(), Some("http_500"));
    assert!(err.to_string().contains("upstream exploded"));
}

#[tokio::test]
async fn test_success_without_json_is_invalid_response() {
    let (server, client) = token_server().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/v3/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let err = client
        .exchange_code("code", &PkceParams::generate())
        .await
        .unwrap_err();
    assert!(matches!(err, OAuthError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_unreachable_token_endpoint_is_transport_error() {
    init_test_logging();
    let client = OAuth2Client::new(config("http://127.0.0.1:9/oauth2/v3/token"));

    let err = client
        .exchange_code("code", &PkceParams::generate())
        .await
        .unwrap_err();
    assert!(matches!(err, OAuthError::Transport { .. }));
}

#[tokio::test]
async fn test_refresh_keeps_refresh_token_when_not_rotated() {
    let (server, client) = token_server().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/v3/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = client.refresh_token("refresh-1").await.unwrap();

    assert_eq!(token.access_token, "access-2");
    assert_eq!(token.token_type, "Bearer");
    assert_eq!(token.refresh_token.as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn test_refresh_takes_rotated_refresh_token() {
    let (server, client) = token_server().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/v3/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-3",
            "refresh_token": "refresh-2"
        })))
        .mount(&server)
        .await;

    let token = client.refresh_token("refresh-1").await.unwrap();
    assert_eq!(token.refresh_token.as_deref(), Some("refresh-2"));
    assert!(token.expires_at.is_none());
}
