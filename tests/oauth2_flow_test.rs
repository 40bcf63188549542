// ABOUTME: Tests for the cloud authorization-code flow state machine
// ABOUTME: Covers callback classification, state checks, provider errors and token storage on exchange
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{cloud_config, init_test_logging, TEST_CLIENT_ID, TEST_REDIRECT_URI};
use health_bridge::oauth2_client::{
    classify_callback, AuthorizationFlow, CallbackDisposition, FlowState, OAuth2Client, TokenStore,
};
use health_bridge::OAuthError;
use serde_json::json;
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    flow: AuthorizationFlow,
    tokens: Arc<TokenStore>,
}

async fn harness() -> Harness {
    init_test_logging();
    let server = MockServer::start().await;
    let config = cloud_config(&server.uri());
    let client = Arc::new(OAuth2Client::new(config.to_oauth2_config()));
    let tokens = Arc::new(TokenStore::new());
    let flow = AuthorizationFlow::new(client, Arc::clone(&tokens));
    Harness {
        server,
        flow,
        tokens,
    }
}

fn callback(query: &str) -> String {
    format!("{TEST_REDIRECT_URI}?{query}")
}

fn code_challenge_param(url: &str) -> String {
    let parsed = Url::parse(url).unwrap();
    parsed
        .query_pairs()
        .find(|(k, _)| k == "code_challenge")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

// ============================================================================
// Callback classification
// ============================================================================

#[test]
fn test_foreign_urls_are_not_callbacks() {
    assert_eq!(
        classify_callback(TEST_REDIRECT_URI, "https://accounts.example.com/login"),
        CallbackDisposition::NotCallback
    );
    assert_eq!(
        classify_callback("", &callback("code=abc")),
        CallbackDisposition::NotCallback
    );
}

#[test]
fn test_redirect_without_code_or_error_is_incomplete() {
    assert_eq!(
        classify_callback(TEST_REDIRECT_URI, TEST_REDIRECT_URI),
        CallbackDisposition::Incomplete
    );
    assert_eq!(
        classify_callback(TEST_REDIRECT_URI, &callback("state=xyz")),
        CallbackDisposition::Incomplete
    );
}

#[test]
fn test_redirect_with_code_or_error_is_actionable() {
    assert_eq!(
        classify_callback(TEST_REDIRECT_URI, &callback("code=abc&state=xyz")),
        CallbackDisposition::Actionable
    );
    assert_eq!(
        classify_callback(TEST_REDIRECT_URI, &callback("error=access_denied")),
        CallbackDisposition::Actionable
    );
}

// ============================================================================
// Flow states
// ============================================================================

#[tokio::test]
async fn test_begin_moves_to_authorization_requested() {
    let h = harness().await;
    assert_eq!(h.flow.state(), FlowState::Idle);

    let request = h.flow.begin().unwrap();

    assert_eq!(h.flow.state(), FlowState::AuthorizationRequested);
    assert!(request.url.contains(&format!("state={}", request.state)));
    assert!(request.url.contains(&format!("client_id={TEST_CLIENT_ID}")));
}

#[tokio::test]
async fn test_each_attempt_gets_fresh_state_and_challenge() {
    let h = harness().await;

    let first = h.flow.begin().unwrap();
    let second = h.flow.begin().unwrap();

    assert_ne!(first.state, second.state);
    assert_ne!(code_challenge_param(&first.url), code_challenge_param(&second.url));
}

#[tokio::test]
async fn test_callback_without_pending_attempt() {
    let h = harness().await;

    let err = h
        .flow
        .handle_callback(&callback("code=abc&state=xyz"))
        .await
        .unwrap_err();

    assert_eq!(err, OAuthError::NoPendingAuthorization);
    assert_eq!(h.flow.state(), FlowState::Idle);
}

#[tokio::test]
async fn test_state_mismatch_fails_attempt_without_exchange() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/v3/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;
    h.flow.begin().unwrap();

    let err = h
        .flow
        .handle_callback(&callback("code=abc&state=forged"))
        .await
        .unwrap_err();

    assert_eq!(err, OAuthError::StateMismatch);
    assert_eq!(h.flow.state(), FlowState::Failed);
    assert!(!h.tokens.has_token());

    // The attempt is spent; replaying the callback finds nothing pending
    let err = h
        .flow
        .handle_callback(&callback("code=abc&state=forged"))
        .await
        .unwrap_err();
    assert_eq!(err, OAuthError::NoPendingAuthorization);
}

#[tokio::test]
async fn test_provider_error_in_redirect_is_surfaced_verbatim() {
    let h = harness().await;
    let request = h.flow.begin().unwrap();

    let err = h
        .flow
        .handle_callback(&callback(&format!(
            "error=access_denied&error_description=user+cancelled&state={}",
            request.state
        )))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        OAuthError::Provider {
            code: "access_denied".to_owned(),
            description: Some("user cancelled".to_owned()),
        }
    );
    assert_eq!(h.flow.state(), FlowState::Failed);
}

#[tokio::test]
async fn test_non_actionable_url_is_rejected() {
    let h = harness().await;
    h.flow.begin().unwrap();

    let err = h
        .flow
        .handle_callback("https://accounts.example.com/next")
        .await
        .unwrap_err();

    assert!(matches!(err, OAuthError::InvalidCallback { .. }));
    // Ignored navigation leaves the attempt pending
    assert_eq!(h.flow.state(), FlowState::AuthorizationRequested);
}

#[tokio::test]
async fn test_successful_exchange_stores_token() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/v3/token"))
        .and(body_string_contains("code=auth-code-1"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "cloud-access",
            "refresh_token": "cloud-refresh",
            "expires_in": 3600,
            "scope": "openid https://www.huawei.com/healthkit/step.read"
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    let request = h.flow.begin().unwrap();

    let token = h
        .flow
        .handle_callback(&callback(&format!("code=auth-code-1&state={}", request.state)))
        .await
        .unwrap();

    assert_eq!(token.access_token, "cloud-access");
    assert_eq!(h.flow.state(), FlowState::TokenExchanged);
    let stored = h.tokens.get().unwrap();
    assert_eq!(stored.token.access_token, "cloud-access");
    assert_eq!(stored.client_id, TEST_CLIENT_ID);
}

#[tokio::test]
async fn test_failed_exchange_marks_flow_failed() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/v3/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&h.server)
        .await;
    let request = h.flow.begin().unwrap();

    let err = h
        .flow
        .handle_callback(&callback(&format!("code=used&state={}", request.state)))
        .await
        .unwrap_err();

    assert_eq!(err.provider_code(), Some("invalid_grant"));
    assert_eq!(h.flow.state(), FlowState::Failed);
    assert!(!h.tokens.has_token());
}

#[tokio::test]
async fn test_reset_abandons_pending_attempt() {
    let h = harness().await;
    let request = h.flow.begin().unwrap();

    h.flow.reset();

    assert_eq!(h.flow.state(), FlowState::Idle);
    let err = h
        .flow
        .handle_callback(&callback(&format!("code=abc&state={}", request.state)))
        .await
        .unwrap_err();
    assert_eq!(err, OAuthError::NoPendingAuthorization);
}
