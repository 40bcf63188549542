// ABOUTME: OAuth error types for the cloud PKCE authorization flow
// ABOUTME: Keeps provider error codes and descriptions untranslated for the host application
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

/// Errors raised by the authorization flow and token endpoint
///
/// None of these are retried automatically: an authorization code is single-use.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OAuthError {
    /// The provider answered with an OAuth error payload
    #[error("provider returned '{code}': {}", .description.as_deref().unwrap_or("no description"))]
    Provider {
        /// Provider error code (e.g. `invalid_grant`), verbatim
        code: String,
        /// Provider error description, verbatim
        description: Option<String>,
    },

    /// The callback `state` did not match the pending authorization
    #[error("callback state does not match the pending authorization")]
    StateMismatch,

    /// A callback arrived while no authorization was pending
    #[error("no authorization is pending")]
    NoPendingAuthorization,

    /// The callback URL could not be interpreted
    #[error("invalid callback: {reason}")]
    InvalidCallback {
        /// What was wrong with the callback
        reason: String,
    },

    /// The token endpoint could not be reached
    #[error("token endpoint unreachable: {message}")]
    Transport {
        /// Transport failure message
        message: String,
    },

    /// The token endpoint answered with something unparseable
    #[error("invalid token response: {message}")]
    InvalidResponse {
        /// Parse failure message
        message: String,
    },

    /// Client configuration is incomplete or malformed
    #[error("invalid OAuth configuration: {message}")]
    InvalidConfiguration {
        /// What is wrong with the configuration
        message: String,
    },
}

impl OAuthError {
    /// Create a provider error from the standard `error` / `error_description` pair
    #[must_use]
    pub fn provider(code: impl Into<String>, description: Option<String>) -> Self {
        Self::Provider {
            code: code.into(),
            description,
        }
    }

    /// Provider error code if this error came from the provider
    #[must_use]
    pub fn provider_code(&self) -> Option<&str> {
        match self {
            Self::Provider { code, .. } => Some(code),
            _ => None,
        }
    }
}
