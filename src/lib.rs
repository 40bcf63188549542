// ABOUTME: Main library entry point for the cross-platform health data bridge
// ABOUTME: Capability registry, chunked queries, composite readings, permissions and cloud OAuth
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Health Bridge
//!
//! One interface over several vendor health platforms: Samsung Health,
//! Huawei Health (on-device and cloud), Apple `HealthKit` and Google Fit.
//!
//! ## Features
//!
//! - **Capability registry**: which data types each platform can read or write
//! - **Query planner**: arbitrary date ranges split into vendor-sized chunks
//! - **Composite readings**: blood pressure and similar multi-value samples
//! - **Permission lifecycle**: grant tracking, verify-by-read, cloud revocation
//! - **Cloud `OAuth2`**: PKCE authorization, token exchange and consent management
//!
//! ## Architecture
//!
//! - **Adapters**: one [`adapters::HealthAdapter`] per platform
//! - **Bridge**: [`HealthBridge`] is the host-facing API
//! - **Core**: data model and errors live in `health_bridge_core`
//!
//! ## Example
//!
//! ```rust,no_run
//! use health_bridge::adapters::SyntheticStore;
//! use health_bridge::{DataType, HealthBridge, Platform};
//! use chrono::{Duration, Utc};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), health_bridge::BridgeError> {
//! let store = Arc::new(SyntheticStore::new(Platform::SamsungHealth));
//! let bridge = HealthBridge::builder()
//!     .with_device_store(Platform::SamsungHealth, store)
//!     .build()?;
//!
//! let end = Utc::now();
//! let outcome = bridge
//!     .read_health_data(Platform::SamsungHealth, DataType::Steps, end - Duration::days(60), end, None)
//!     .await?;
//! println!("{} readings in {} chunks", outcome.readings.len(), outcome.chunks_planned);
//! # Ok(())
//! # }
//! ```

/// Vendor SDK adapters
pub mod adapters;

/// Host-facing bridge API
pub mod bridge;

/// Static capability tables
pub mod capabilities;

/// Environment configuration
pub mod config;

/// Raw sample normalization
pub mod decompose;

/// Logging configuration and structured helpers
pub mod logging;

/// Cloud `OAuth2` PKCE client and consent management
pub mod oauth2_client;

/// Permission lifecycle
pub mod permissions;

/// Query planning and execution
pub mod query;

/// Utility functions and helpers
pub mod utils;

pub use bridge::{HealthBridge, HealthBridgeBuilder, WriteOutcome};
pub use health_bridge_core::constants;
pub use health_bridge_core::errors;
pub use health_bridge_core::models;
pub use health_bridge_core::{
    AdapterError, BridgeError, BridgeResult, DataType, ErrorCode, HealthOperation, HealthReading,
    OAuthError, PermissionCheck, PermissionState, Platform, QueryWindow, RawSample, RawValue,
};
