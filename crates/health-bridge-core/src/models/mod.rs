// ABOUTME: Normalized health data model shared across adapters, planner and host API
// ABOUTME: Data types, platforms, readings, permissions, query windows and raw vendor samples
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Model
//!
//! `DataType` and `Platform` are process-wide constants. `PermissionRecord` lives
//! for a user session. `HealthReading` and `RawSample` are transient: produced per
//! query and never cached by the bridge.

mod data_type;
mod permission;
mod platform;
mod raw;
mod reading;
mod window;

pub use data_type::{CompositeComponent, DataType, ReadingShape, BLOOD_PRESSURE_COMPONENTS};
pub use permission::{
    GrantEvidence, HealthOperation, OperationSet, PermissionCheck, PermissionKey,
    PermissionRecord, PermissionState,
};
pub use platform::Platform;
pub use raw::{RawField, RawSample, RawSampleSet, RawValue};
pub use reading::{HealthReading, WriteAmount, WriteValue};
pub use window::QueryWindow;

use thiserror::Error;

/// A string key did not name a known enumeration value
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} '{key}'")]
pub struct ParseKeyError {
    /// Which enumeration was being parsed
    pub kind: &'static str,
    /// The rejected key
    pub key: String,
}
