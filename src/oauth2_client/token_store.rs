// ABOUTME: In-memory holder of the cloud access token and the client id it was issued to
// ABOUTME: Clearing is synchronous so no request can pick up a token after revocation
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::OAuth2Token;
use std::sync::RwLock;
use tracing::info;

/// Token plus the client id sent alongside it on REST calls
///
/// `Debug` output is redacted by `OAuth2Token`.
#[derive(Debug, Clone)]
pub struct CloudCredentials {
    /// Current token
    pub token: OAuth2Token,
    /// OAuth client id the token was issued to
    pub client_id: String,
}

/// Process-local token store; never persisted
#[derive(Debug, Default)]
pub struct TokenStore {
    inner: RwLock<Option<CloudCredentials>>,
}

impl TokenStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a token issued to `client_id`
    pub fn store(&self, token: OAuth2Token, client_id: impl Into<String>) {
        if let Ok(mut inner) = self.inner.write() {
            *inner = Some(CloudCredentials {
                token,
                client_id: client_id.into(),
            });
        }
    }

    /// Store a bearer token obtained outside the PKCE flow
    pub fn set_credentials(&self, access_token: impl Into<String>, client_id: impl Into<String>) {
        self.store(OAuth2Token::bearer(access_token), client_id);
        info!("Cloud credentials set by host");
    }

    /// Replace the token, keeping the client id
    ///
    /// Returns `false` when no credentials were stored.
    pub fn replace_token(&self, token: OAuth2Token) -> bool {
        match self.inner.write() {
            Ok(mut inner) => inner.as_mut().is_some_and(|credentials| {
                credentials.token = token;
                true
            }),
            Err(_) => false,
        }
    }

    /// Current credentials
    #[must_use]
    pub fn get(&self) -> Option<CloudCredentials> {
        self.inner.read().ok().and_then(|inner| inner.clone())
    }

    /// Whether a token is stored
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.inner.read().is_ok_and(|inner| inner.is_some())
    }

    /// Discard every stored token; returns whether one was stored
    pub fn clear(&self) -> bool {
        match self.inner.write() {
            Ok(mut inner) => inner.take().is_some(),
            Err(poisoned) => poisoned.into_inner().take().is_some(),
        }
    }
}
