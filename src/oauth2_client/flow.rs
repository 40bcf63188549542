// ABOUTME: Authorization-code flow state machine with PKCE for the cloud health API
// ABOUTME: Intercepts redirect callbacks, checks state in constant time and exchanges codes on a spawned task
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::client::generate_state;
use super::{OAuth2Client, OAuth2Token, PkceParams, TokenStore};
use crate::logging::BridgeLogger;
use chrono::{DateTime, Utc};
use health_bridge_core::{OAuthError, Platform};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use subtle::ConstantTimeEq;
use tracing::warn;
use url::Url;

/// Flow states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    /// No authorization attempt in progress
    Idle,
    /// Authorization URL handed to the host; waiting for the redirect
    AuthorizationRequested,
    /// Redirect carried a code; exchange in progress
    CodeReceived,
    /// Tokens stored
    TokenExchanged,
    /// The attempt failed; a new one must start from `begin`
    Failed,
}

/// How a navigation URL relates to the configured redirect URI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackDisposition {
    /// The URL is not the redirect URI; let navigation continue
    NotCallback,
    /// The URL is the redirect URI but carries neither `code` nor `error`
    Incomplete,
    /// The URL carries `code` or `error` and should be handled
    Actionable,
}

/// Per-attempt secrets; dropped (and the verifier zeroized) after exchange or failure
#[derive(Debug)]
pub struct OAuthSession {
    /// PKCE verifier and challenge
    pub pkce: PkceParams,
    /// `state` nonce sent with the authorization request
    pub state: String,
    /// Client the attempt is for
    pub client_id: String,
    /// Redirect URI of the attempt
    pub redirect_uri: String,
    /// Requested scopes
    pub scopes: Vec<String>,
    /// When the attempt started
    pub created_at: DateTime<Utc>,
}

/// What the host needs to start an authorization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationRequest {
    /// URL to open in a browser or web view
    pub url: String,
    /// `state` nonce embedded in the URL
    pub state: String,
}

#[derive(Debug)]
struct FlowInner {
    state: FlowState,
    pending: Option<OAuthSession>,
}

/// Authorization-code flow for one client
pub struct AuthorizationFlow {
    client: Arc<OAuth2Client>,
    tokens: Arc<TokenStore>,
    inner: Arc<Mutex<FlowInner>>,
}

impl AuthorizationFlow {
    /// Create a flow that stores exchanged tokens in `tokens`
    #[must_use]
    pub fn new(client: Arc<OAuth2Client>, tokens: Arc<TokenStore>) -> Self {
        Self {
            client,
            tokens,
            inner: Arc::new(Mutex::new(FlowInner {
                state: FlowState::Idle,
                pending: None,
            })),
        }
    }

    fn lock(inner: &Mutex<FlowInner>) -> MutexGuard<'_, FlowInner> {
        inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fail(&self, error: OAuthError) -> OAuthError {
        let mut inner = Self::lock(&self.inner);
        inner.state = FlowState::Failed;
        inner.pending = None;
        drop(inner);
        BridgeLogger::log_oauth_event(Platform::HuaweiCloud, "authorization_failed", false);
        error
    }

    /// OAuth client driving this flow
    #[must_use]
    pub const fn client(&self) -> &Arc<OAuth2Client> {
        &self.client
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> FlowState {
        Self::lock(&self.inner).state
    }

    /// Start a new attempt, discarding any pending one
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the client configuration is invalid
    pub fn begin(&self) -> Result<AuthorizationRequest, OAuthError> {
        let config = self.client.config();
        config.validate()?;

        let pkce = PkceParams::generate();
        let state = generate_state();
        let url = self.client.authorization_url(&state, &pkce)?;

        let mut inner = Self::lock(&self.inner);
        if inner.pending.is_some() {
            warn!("Discarding pending authorization attempt");
        }
        inner.pending = Some(OAuthSession {
            pkce,
            state: state.clone(),
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
            created_at: Utc::now(),
        });
        inner.state = FlowState::AuthorizationRequested;
        drop(inner);

        BridgeLogger::log_oauth_event(Platform::HuaweiCloud, "authorization_requested", true);
        Ok(AuthorizationRequest { url, state })
    }

    /// Classify a navigation URL against the configured redirect URI
    #[must_use]
    pub fn intercept(&self, url: &str) -> CallbackDisposition {
        classify_callback(&self.client.config().redirect_uri, url)
    }

    /// Handle an actionable redirect: verify `state`, then exchange the code
    ///
    /// The exchange runs on its own task, so dropping this future after the
    /// code is sent cannot lose the token; it lands in the token store either way.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCallback`, `NoPendingAuthorization`, `StateMismatch`,
    /// the provider's own error, or a token endpoint failure
    pub async fn handle_callback(&self, url: &str) -> Result<OAuth2Token, OAuthError> {
        if self.intercept(url) != CallbackDisposition::Actionable {
            return Err(OAuthError::InvalidCallback {
                reason: "URL is not an actionable redirect".to_owned(),
            });
        }
        let params = CallbackParams::parse(url)?;

        let session = {
            let mut inner = Self::lock(&self.inner);
            let pending = inner.pending.take();
            if pending.is_some() {
                inner.state = FlowState::CodeReceived;
            }
            pending
        }
        .ok_or(OAuthError::NoPendingAuthorization)?;

        let state_matches = params.state.as_deref().is_some_and(|received| {
            bool::from(received.as_bytes().ct_eq(session.state.as_bytes()))
        });
        if !state_matches {
            return Err(self.fail(OAuthError::StateMismatch));
        }
        if let Some(code) = params.error {
            return Err(self.fail(OAuthError::provider(code, params.error_description)));
        }
        let Some(code) = params.code else {
            return Err(self.fail(OAuthError::InvalidCallback {
                reason: "redirect carries no code".to_owned(),
            }));
        };

        let client = Arc::clone(&self.client);
        let tokens = Arc::clone(&self.tokens);
        let inner = Arc::clone(&self.inner);
        let exchange = tokio::spawn(async move {
            let result = client.exchange_code(&code, &session.pkce).await;
            let mut guard = Self::lock(&inner);
            match &result {
                Ok(token) => {
                    tokens.store(token.clone(), session.client_id.clone());
                    guard.state = FlowState::TokenExchanged;
                }
                Err(_) => guard.state = FlowState::Failed,
            }
            drop(guard);
            result
        });

        let result = exchange.await.map_err(|e| OAuthError::Transport {
            message: format!("token exchange task failed: {e}"),
        })?;
        BridgeLogger::log_oauth_event(Platform::HuaweiCloud, "token_exchange", result.is_ok());
        result
    }

    /// Abandon any pending attempt and return to `Idle`
    pub fn reset(&self) {
        let mut inner = Self::lock(&self.inner);
        inner.pending = None;
        inner.state = FlowState::Idle;
    }
}

/// Classify `url` against `redirect_uri`
///
/// The redirect URI must be a prefix of the URL. Only URLs that also carry
/// `code` or `error` in their query are actionable.
#[must_use]
pub fn classify_callback(redirect_uri: &str, url: &str) -> CallbackDisposition {
    if redirect_uri.is_empty() || !url.starts_with(redirect_uri) {
        return CallbackDisposition::NotCallback;
    }
    let actionable = Url::parse(url).is_ok_and(|parsed| {
        parsed
            .query_pairs()
            .any(|(key, _)| key == "code" || key == "error")
    });
    if actionable {
        CallbackDisposition::Actionable
    } else {
        CallbackDisposition::Incomplete
    }
}

struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl CallbackParams {
    fn parse(url: &str) -> Result<Self, OAuthError> {
        let parsed = Url::parse(url).map_err(|e| OAuthError::InvalidCallback {
            reason: e.to_string(),
        })?;
        let mut params = Self {
            code: None,
            state: None,
            error: None,
            error_description: None,
        };
        for (key, value) in parsed.query_pairs() {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "code" => params.code = value,
                "state" => params.state = value,
                "error" => params.error = value,
                "error_description" => params.error_description = value,
                _ => {}
            }
        }
        Ok(params)
    }
}
