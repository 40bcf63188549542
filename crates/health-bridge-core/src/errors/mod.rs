// ABOUTME: Unified error taxonomy for the health bridge with stable error codes
// ABOUTME: Distinguishes capability, authorization, range, adapter, decomposition and OAuth failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling
//!
//! Every failure that reaches the host application is a [`BridgeError`]. The
//! variants mirror the way the host must react:
//!
//! - `UnsupportedOperation`, `InvalidRange`, `NoActiveContext` are programming
//!   or capability errors raised before any I/O and never retried
//! - `NotAuthorized` tells the host to call `request_permissions`
//! - `AdapterUnavailable` means the vendor app or SDK is missing for one platform
//! - `TransientReadFailure` and `CompositeFieldMissing` normally only appear in a
//!   query manifest, since a failed chunk or sample does not fail the query
//! - `OAuth` carries the provider's error code and description untranslated

/// Adapter-boundary errors raised by vendor SDK wrappers
pub mod adapter;
/// OAuth authorization and token exchange errors
pub mod oauth;

pub use adapter::AdapterError;
pub use oauth::OAuthError;

use crate::models::{DataType, HealthOperation, Platform};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable error codes exposed to host applications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The capability table does not allow this operation
    #[serde(rename = "UNSUPPORTED_OPERATION")]
    UnsupportedOperation,
    /// Permission is not granted for this operation
    #[serde(rename = "NOT_AUTHORIZED")]
    NotAuthorized,
    /// The query window is malformed
    #[serde(rename = "INVALID_RANGE")]
    InvalidRange,
    /// The vendor app or SDK is missing or below the minimum version
    #[serde(rename = "ADAPTER_UNAVAILABLE")]
    AdapterUnavailable,
    /// A single sub-window read failed
    #[serde(rename = "TRANSIENT_READ_FAILURE")]
    TransientReadFailure,
    /// A composite sample could not be decomposed
    #[serde(rename = "COMPOSITE_FIELD_MISSING")]
    CompositeFieldMissing,
    /// Authorization or token exchange failed
    #[serde(rename = "OAUTH_ERROR")]
    OAuthError,
    /// An interactive call was attempted without a foreground UI context
    #[serde(rename = "NO_ACTIVE_CONTEXT")]
    NoActiveContext,
    /// A non-OAuth cloud endpoint failed
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError,
    /// Configuration is missing or malformed
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError,
}

impl ErrorCode {
    /// Wire representation of the code
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            Self::NotAuthorized => "NOT_AUTHORIZED",
            Self::InvalidRange => "INVALID_RANGE",
            Self::AdapterUnavailable => "ADAPTER_UNAVAILABLE",
            Self::TransientReadFailure => "TRANSIENT_READ_FAILURE",
            Self::CompositeFieldMissing => "COMPOSITE_FIELD_MISSING",
            Self::OAuthError => "OAUTH_ERROR",
            Self::NoActiveContext => "NO_ACTIVE_CONTEXT",
            Self::ExternalServiceError => "EXTERNAL_SERVICE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::UnsupportedOperation => {
                "This operation is not supported on the selected platform"
            }
            Self::NotAuthorized => "Permission has not been granted for this operation",
            Self::InvalidRange => "The requested date range is invalid",
            Self::AdapterUnavailable => "The health platform is not available on this device",
            Self::TransientReadFailure => "Part of the requested range could not be read",
            Self::CompositeFieldMissing => "A multi-valued reading was missing a component",
            Self::OAuthError => "Authorization with the cloud provider failed",
            Self::NoActiveContext => "This request needs a visible screen to show the consent UI",
            Self::ExternalServiceError => "The cloud service returned an error",
            Self::ConfigError => "Configuration is missing or invalid",
        }
    }
}

/// Unified error type for the health bridge
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// The capability table says no
    #[error("{operation} of {data_type} is not supported on {platform}")]
    UnsupportedOperation {
        /// Platform that was asked
        platform: Platform,
        /// Requested data type
        data_type: DataType,
        /// Requested operation
        operation: HealthOperation,
    },

    /// Permission state is not granted
    #[error("not authorized on {platform}: {reason}")]
    NotAuthorized {
        /// Platform that refused
        platform: Platform,
        /// Data type concerned, if the refusal is type-specific
        data_type: Option<DataType>,
        /// Operation concerned, if the refusal is operation-specific
        operation: Option<HealthOperation>,
        /// Explanation including what the caller should do next
        reason: String,
    },

    /// The query window is malformed
    #[error("invalid query range: end {end_millis} precedes start {start_millis}")]
    InvalidRange {
        /// Requested start (epoch millis)
        start_millis: i64,
        /// Requested end (epoch millis)
        end_millis: i64,
    },

    /// Vendor app or SDK missing, below minimum version, or failed to initialize
    #[error("{platform} is unavailable: {reason}")]
    AdapterUnavailable {
        /// Platform that is unavailable
        platform: Platform,
        /// Reason reported by the adapter
        reason: String,
    },

    /// A single sub-window read failed
    #[error("transient read failure on {platform}: {message}")]
    TransientReadFailure {
        /// Platform that failed
        platform: Platform,
        /// Vendor failure message
        message: String,
    },

    /// A composite sample lacked a declared component
    #[error("{data_type} sample is missing the '{component}' component")]
    CompositeFieldMissing {
        /// Data type being decomposed
        data_type: DataType,
        /// Name of the component that could not be located
        component: String,
    },

    /// Authorization or token exchange failed
    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    /// Interactive call without a foreground UI context
    #[error("{operation} requires an active foreground context")]
    NoActiveContext {
        /// Operation that needed the context
        operation: String,
    },

    /// A non-OAuth cloud endpoint failed
    #[error("{service} failed{}: {message}", status_suffix(*.status))]
    ExternalService {
        /// Service or endpoint name
        service: String,
        /// HTTP status code if a response was received
        status: Option<u16>,
        /// Response body or transport error
        message: String,
    },

    /// Configuration is missing or malformed
    #[error("configuration error: {0}")]
    Config(String),
}

fn status_suffix(status: Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

impl BridgeError {
    /// Create a "not authorized" error with the standard hint
    #[must_use]
    pub fn not_authorized(
        platform: Platform,
        data_type: DataType,
        operation: HealthOperation,
    ) -> Self {
        Self::NotAuthorized {
            platform,
            data_type: Some(data_type),
            operation: Some(operation),
            reason: format!(
                "{operation} of {data_type} has not been granted; call request_permissions first"
            ),
        }
    }

    /// Create a "not authorized" error that is not tied to a data type
    #[must_use]
    pub fn not_authorized_for(platform: Platform, reason: impl Into<String>) -> Self {
        Self::NotAuthorized {
            platform,
            data_type: None,
            operation: None,
            reason: reason.into(),
        }
    }

    /// Create an "unsupported operation" error
    #[must_use]
    pub const fn unsupported(
        platform: Platform,
        data_type: DataType,
        operation: HealthOperation,
    ) -> Self {
        Self::UnsupportedOperation {
            platform,
            data_type,
            operation,
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Stable code for this error
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedOperation { .. } => ErrorCode::UnsupportedOperation,
            Self::NotAuthorized { .. } => ErrorCode::NotAuthorized,
            Self::InvalidRange { .. } => ErrorCode::InvalidRange,
            Self::AdapterUnavailable { .. } => ErrorCode::AdapterUnavailable,
            Self::TransientReadFailure { .. } => ErrorCode::TransientReadFailure,
            Self::CompositeFieldMissing { .. } => ErrorCode::CompositeFieldMissing,
            Self::OAuth(_) => ErrorCode::OAuthError,
            Self::NoActiveContext { .. } => ErrorCode::NoActiveContext,
            Self::ExternalService { .. } => ErrorCode::ExternalServiceError,
            Self::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// Whether a caller may retry the same call later
    ///
    /// OAuth errors are never retryable: authorization codes are single-use.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TransientReadFailure { .. } => true,
            Self::ExternalService { status, .. } => status.is_none_or(|s| s >= 500 || s == 429),
            _ => false,
        }
    }
}

/// Result alias used across the crate
pub type BridgeResult<T> = Result<T, BridgeError>;
