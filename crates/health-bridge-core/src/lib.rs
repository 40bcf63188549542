// ABOUTME: Core types and constants for the cross-platform health data bridge
// ABOUTME: Foundation crate with the error taxonomy, constants, and normalized data model
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Health Bridge Core
//!
//! Foundation crate shared by every layer of the health bridge. It is designed
//! to change infrequently so the adapter, planner and OAuth layers can build on
//! a stable vocabulary.
//!
//! ## Modules
//!
//! - **errors**: `BridgeError` taxonomy, `ErrorCode`, adapter and OAuth errors
//! - **constants**: endpoints, timing defaults and environment variable names
//! - **models**: `DataType`, `Platform`, `HealthReading`, permission states,
//!   query windows and raw vendor samples

/// Error taxonomy shared by adapters, planner, permission manager and OAuth client
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Normalized health data model
pub mod models;

pub use errors::{AdapterError, BridgeError, BridgeResult, ErrorCode, OAuthError};
pub use models::{
    DataType, HealthOperation, HealthReading, PermissionCheck, PermissionState, Platform,
    QueryWindow, RawSample, RawValue,
};
