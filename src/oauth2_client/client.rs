// ABOUTME: OAuth2 PKCE client for the Huawei cloud health API
// ABOUTME: Builds authorization URLs, exchanges codes and refreshes tokens, keeping provider errors verbatim
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::utils::http_client::oauth_client;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use health_bridge_core::constants::{oauth, timing};
use health_bridge_core::OAuthError;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::debug;
use url::Url;
use zeroize::Zeroizing;

/// Characters allowed in a PKCE verifier (RFC 7636 unreserved set)
const VERIFIER_CHARS: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Characters used for the `state` nonce
const STATE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// OAuth 2.0 client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuth2Config {
    /// OAuth client ID from provider
    pub client_id: String,
    /// OAuth client secret, for confidential clients only
    pub client_secret: Option<String>,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Redirect URI for OAuth callbacks
    pub redirect_uri: String,
    /// OAuth scopes to request
    pub scopes: Vec<String>,
}

impl fmt::Debug for OAuth2Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl OAuth2Config {
    /// Check that ids are present and endpoints parse
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` naming the first problem found
    pub fn validate(&self) -> Result<(), OAuthError> {
        let invalid = |message: String| OAuthError::InvalidConfiguration { message };
        if self.client_id.trim().is_empty() {
            return Err(invalid("client_id is empty".to_owned()));
        }
        if self.scopes.is_empty() {
            return Err(invalid("no scopes configured".to_owned()));
        }
        for (name, value) in [
            ("auth_url", &self.auth_url),
            ("token_url", &self.token_url),
            ("redirect_uri", &self.redirect_uri),
        ] {
            Url::parse(value).map_err(|e| invalid(format!("{name} '{value}' is invalid: {e}")))?;
        }
        Ok(())
    }
}

/// `PKCE` (Proof Key for Code Exchange) parameters
///
/// The verifier is wiped from memory on drop and never printed.
#[derive(Clone)]
pub struct PkceParams {
    code_verifier: Zeroizing<String>,
    /// SHA256 hash of the code verifier, base64url encoded
    pub code_challenge: String,
    /// Challenge method (always "S256")
    pub code_challenge_method: &'static str,
}

impl fmt::Debug for PkceParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkceParams")
            .field("code_verifier", &"[REDACTED]")
            .field("code_challenge", &self.code_challenge)
            .field("code_challenge_method", &self.code_challenge_method)
            .finish()
    }
}

impl PkceParams {
    /// Generate `PKCE` parameters with `S256` challenge method
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let code_verifier: String = (0..oauth::CODE_VERIFIER_LENGTH)
            .map(|_| VERIFIER_CHARS[rng.gen_range(0..VERIFIER_CHARS.len())] as char)
            .collect();
        Self::from_verifier(code_verifier)
    }

    /// Build parameters around a known verifier
    #[must_use]
    pub fn from_verifier(code_verifier: String) -> Self {
        let code_challenge = Self::challenge_for(&code_verifier);
        Self {
            code_verifier: Zeroizing::new(code_verifier),
            code_challenge,
            code_challenge_method: oauth::CODE_CHALLENGE_METHOD,
        }
    }

    /// `base64url(sha256(verifier))` without padding
    #[must_use]
    pub fn challenge_for(code_verifier: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(code_verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    /// The secret verifier, sent only to the token endpoint
    #[must_use]
    pub fn code_verifier(&self) -> &str {
        &self.code_verifier
    }
}

/// Generate a fresh `state` nonce
#[must_use]
pub fn generate_state() -> String {
    let mut rng = rand::thread_rng();
    (0..oauth::STATE_LENGTH)
        .map(|_| STATE_CHARS[rng.gen_range(0..STATE_CHARS.len())] as char)
        .collect()
}

/// OAuth 2.0 access token with expiration and refresh capabilities
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuth2Token {
    /// The access token string
    pub access_token: String,
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// Expiration timestamp (UTC)
    pub expires_at: Option<DateTime<Utc>>,
    /// Optional refresh token for getting new access tokens
    pub refresh_token: Option<String>,
    /// Granted OAuth scopes, space separated
    pub scope: Option<String>,
}

impl fmt::Debug for OAuth2Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Token")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("scope", &self.scope)
            .finish()
    }
}

impl OAuth2Token {
    /// Bearer token without expiry or scopes, as supplied by a host
    #[must_use]
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".into(),
            expires_at: None,
            refresh_token: None,
            scope: None,
        }
    }

    /// Check if the token is expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now())
    }

    /// Check if the token will expire within the refresh margin
    #[must_use]
    pub fn will_expire_soon(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| {
            expires_at <= Utc::now() + Duration::seconds(timing::TOKEN_REFRESH_MARGIN_SECS)
        })
    }

    /// Granted scopes, or `None` when the provider did not report them
    #[must_use]
    pub fn scopes(&self) -> Option<Vec<&str>> {
        self.scope
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.split_whitespace().collect())
    }
}

/// OAuth 2.0 token response from provider
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// OAuth 2.0 client for the cloud health API
pub struct OAuth2Client {
    config: OAuth2Config,
    client: Client,
}

impl OAuth2Client {
    /// Create a new `OAuth2` client with the given configuration
    #[must_use]
    pub fn new(config: OAuth2Config) -> Self {
        Self::with_http_client(config, oauth_client())
    }

    /// Create a client that sends requests through `client`
    #[must_use]
    pub const fn with_http_client(config: OAuth2Config, client: Client) -> Self {
        Self { config, client }
    }

    /// Get the `OAuth2` configuration
    #[must_use]
    pub const fn config(&self) -> &OAuth2Config {
        &self.config
    }

    /// Authorization URL carrying client id, redirect URI, scopes, state and challenge
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the authorization endpoint is malformed
    pub fn authorization_url(&self, state: &str, pkce: &PkceParams) -> Result<String, OAuthError> {
        let mut url =
            Url::parse(&self.config.auth_url).map_err(|e| OAuthError::InvalidConfiguration {
                message: format!("invalid auth URL: {e}"),
            })?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("access_type", "offline")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state)
            .append_pair("code_challenge", &pkce.code_challenge)
            .append_pair("code_challenge_method", pkce.code_challenge_method);

        Ok(url.into())
    }

    /// Exchange an authorization code and its verifier for tokens
    ///
    /// A code is single-use, so this is never retried.
    ///
    /// # Errors
    ///
    /// Returns `Provider` with the provider's error code and description,
    /// `Transport` if the endpoint is unreachable, or `InvalidResponse`
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce: &PkceParams,
    ) -> Result<OAuth2Token, OAuthError> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", pkce.code_verifier()),
        ];
        if let Some(secret) = &self.config.client_secret {
            params.push(("client_secret", secret.as_str()));
        }
        self.token_request(&params).await
    }

    /// Exchange a refresh token for a new access token
    ///
    /// The returned token keeps `refresh_token` if the provider did not rotate it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::exchange_code`]
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<OAuth2Token, OAuthError> {
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
        ];
        if let Some(secret) = &self.config.client_secret {
            params.push(("client_secret", secret.as_str()));
        }
        let mut token = self.token_request(&params).await?;
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_owned());
        }
        Ok(token)
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<OAuth2Token, OAuthError> {
        let response = self
            .client
            .post(&self.config.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| OAuthError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| OAuthError::Transport {
            message: e.to_string(),
        })?;
        debug!(status = status.as_u16(), "Token endpoint responded");

        let json: Value = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                OAuthError::InvalidResponse {
                    message: e.to_string(),
                }
            } else {
                OAuthError::provider(format!("http_{}", status.as_u16()), Some(body.clone()))
            }
        })?;

        if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
            let code = match error {
                Value::String(code) => code.clone(),
                other => other.to_string(),
            };
            let description = json
                .get("error_description")
                .and_then(Value::as_str)
                .map(str::to_owned);
            return Err(OAuthError::provider(code, description));
        }
        if !status.is_success() {
            return Err(OAuthError::provider(
                format!("http_{}", status.as_u16()),
                Some(body),
            ));
        }

        let response: TokenResponse =
            serde_json::from_value(json).map_err(|e| OAuthError::InvalidResponse {
                message: e.to_string(),
            })?;
        Ok(Self::token_from_response(response))
    }

    fn token_from_response(response: TokenResponse) -> OAuth2Token {
        OAuth2Token {
            access_token: response.access_token,
            token_type: response.token_type.unwrap_or_else(|| "Bearer".into()),
            expires_at: response
                .expires_in
                .map(|seconds| Utc::now() + Duration::seconds(seconds)),
            refresh_token: response.refresh_token,
            scope: response.scope,
        }
    }
}
