// ABOUTME: Structured error types raised at the vendor SDK adapter boundary
// ABOUTME: Classifies vendor failures as transient or terminal and converts them into BridgeError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::BridgeError;
use crate::models::Platform;
use thiserror::Error;

/// Errors reported by a vendor SDK adapter
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdapterError {
    /// Vendor app or SDK is not installed, disabled, or too old
    #[error("{platform} is not available: {reason}")]
    Unavailable {
        /// Platform concerned
        platform: Platform,
        /// Why the vendor SDK cannot be used
        reason: String,
    },

    /// Opening the vendor session failed
    #[error("{platform} session failed to initialize: {reason}")]
    InitFailed {
        /// Platform concerned
        platform: Platform,
        /// Vendor failure message
        reason: String,
    },

    /// An operation ran before `initialize` succeeded
    #[error("{platform} session is not initialized")]
    NotInitialized {
        /// Platform concerned
        platform: Platform,
    },

    /// The vendor refused access for lack of permission
    #[error("{platform} denied access to {scope}")]
    PermissionDenied {
        /// Platform concerned
        platform: Platform,
        /// Vendor scope or type identifier that was refused
        scope: String,
    },

    /// Timeouts, busy stores, dropped channels
    #[error("{platform} request failed transiently: {message}")]
    Transient {
        /// Platform concerned
        platform: Platform,
        /// Vendor failure message
        message: String,
    },

    /// The vendor rejected a write or request as invalid
    #[error("{platform} rejected the request: {message}")]
    Rejected {
        /// Platform concerned
        platform: Platform,
        /// Vendor failure message
        message: String,
    },

    /// The adapter cannot express the requested feature
    #[error("{platform} does not support {feature}")]
    Unsupported {
        /// Platform concerned
        platform: Platform,
        /// Feature that was requested
        feature: String,
    },

    /// Interactive consent was requested without a foreground context
    #[error("interactive request on {platform} requires a foreground context")]
    NoActiveContext {
        /// Platform concerned
        platform: Platform,
    },
}

impl AdapterError {
    /// Platform that produced the error
    #[must_use]
    pub const fn platform(&self) -> Platform {
        match self {
            Self::Unavailable { platform, .. }
            | Self::InitFailed { platform, .. }
            | Self::NotInitialized { platform }
            | Self::PermissionDenied { platform, .. }
            | Self::Transient { platform, .. }
            | Self::Rejected { platform, .. }
            | Self::Unsupported { platform, .. }
            | Self::NoActiveContext { platform } => *platform,
        }
    }

    /// Whether the failure may go away on its own
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Whether the failure proves the caller lacks permission
    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Create a transient error
    #[must_use]
    pub fn transient(platform: Platform, message: impl Into<String>) -> Self {
        Self::Transient {
            platform,
            message: message.into(),
        }
    }

    /// Create an unavailable error
    #[must_use]
    pub fn unavailable(platform: Platform, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            platform,
            reason: reason.into(),
        }
    }
}

impl From<AdapterError> for BridgeError {
    fn from(error: AdapterError) -> Self {
        let platform = error.platform();
        match error {
            AdapterError::Unavailable { reason, .. } | AdapterError::InitFailed { reason, .. } => {
                Self::AdapterUnavailable { platform, reason }
            }
            AdapterError::NotInitialized { .. } => Self::AdapterUnavailable {
                platform,
                reason: "session is not initialized".to_owned(),
            },
            AdapterError::Unsupported { feature, .. } => Self::AdapterUnavailable {
                platform,
                reason: format!("adapter does not support {feature}"),
            },
            AdapterError::PermissionDenied { scope, .. } => Self::not_authorized_for(
                platform,
                format!("access to {scope} was denied; call request_permissions first"),
            ),
            AdapterError::Transient { message, .. } => {
                Self::TransientReadFailure { platform, message }
            }
            AdapterError::Rejected { message, .. } => Self::ExternalService {
                service: platform.key().to_owned(),
                status: None,
                message,
            },
            AdapterError::NoActiveContext { .. } => Self::NoActiveContext {
                operation: format!("request_permission on {platform}"),
            },
        }
    }
}
