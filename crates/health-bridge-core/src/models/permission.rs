// ABOUTME: Permission states, records and check outcomes per platform, data type and operation
// ABOUTME: Separates "granted", "denied" and "no data to prove either" outcomes for the host
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{DataType, Platform};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation applied to a data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthOperation {
    /// Read samples
    Read,
    /// Write samples
    Write,
}

impl HealthOperation {
    /// Both operations
    pub const ALL: [Self; 2] = [Self::Read, Self::Write];

    /// Stable string key
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for HealthOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

bitflags::bitflags! {
    /// Set of operations, used by capability rows and permission requests
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct OperationSet: u8 {
        /// Reading is allowed
        const READ = 0b0000_0001;
        /// Writing is allowed
        const WRITE = 0b0000_0010;
    }
}

impl OperationSet {
    /// Read and write
    pub const READ_WRITE: Self = Self::READ.union(Self::WRITE);

    /// Whether the set contains `operation`
    #[must_use]
    pub const fn allows(self, operation: HealthOperation) -> bool {
        match operation {
            HealthOperation::Read => self.contains(Self::READ),
            HealthOperation::Write => self.contains(Self::WRITE),
        }
    }

    /// Operations in this set, read first
    #[must_use]
    pub fn operations(self) -> Vec<HealthOperation> {
        HealthOperation::ALL
            .into_iter()
            .filter(|op| self.allows(*op))
            .collect()
    }
}

impl From<HealthOperation> for OperationSet {
    fn from(operation: HealthOperation) -> Self {
        match operation {
            HealthOperation::Read => Self::READ,
            HealthOperation::Write => Self::WRITE,
        }
    }
}

impl FromIterator<HealthOperation> for OperationSet {
    fn from_iter<I: IntoIterator<Item = HealthOperation>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |set, op| set | Self::from(op))
    }
}

/// Grant state of one (platform, data type, operation) tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// Never asked, or the platform cannot tell
    #[default]
    NotDetermined,
    /// The user granted access
    Granted,
    /// The user refused access
    Denied,
    /// Access is blocked by policy (parental controls, enterprise profile)
    Restricted,
}

impl PermissionState {
    /// Whether the state allows the operation
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Whether the state is a refusal
    #[must_use]
    pub const fn is_refused(self) -> bool {
        matches!(self, Self::Denied | Self::Restricted)
    }
}

/// Key of a permission record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionKey {
    /// Platform owning the record
    pub platform: Platform,
    /// Data type concerned
    pub data_type: DataType,
    /// Operation concerned
    pub operation: HealthOperation,
}

impl PermissionKey {
    /// Build a key
    #[must_use]
    pub const fn new(platform: Platform, data_type: DataType, operation: HealthOperation) -> Self {
        Self {
            platform,
            data_type,
            operation,
        }
    }
}

/// How the recorded state was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantEvidence {
    /// The vendor SDK reported it
    Reported,
    /// A verification read returned records
    ReadVerified,
    /// A verification read returned nothing; the state stays undetermined
    NoData,
    /// Cloud consent was revoked
    Revoked,
}

/// Lazily created permission record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    /// Tuple this record describes
    pub key: PermissionKey,
    /// Current state
    pub state: PermissionState,
    /// How the state was established
    pub evidence: GrantEvidence,
    /// Last transition time
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a permission check as surfaced to the host
///
/// `NoDataUnverified` exists because several vendor SDKs cannot report read
/// grants: a verification read that returns nothing may mean "denied" or
/// "granted but empty", and the bridge does not guess which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PermissionCheck {
    /// The vendor (or a recorded revocation) reported this state
    Reported {
        /// Reported state
        state: PermissionState,
    },
    /// A verification read returned records, which proves the grant
    VerifiedByRead {
        /// Number of records the verification read returned
        records: usize,
    },
    /// A verification read succeeded but returned nothing
    NoDataUnverified,
}

impl PermissionCheck {
    /// Reported outcome
    #[must_use]
    pub const fn reported(state: PermissionState) -> Self {
        Self::Reported { state }
    }

    /// State implied by the outcome
    #[must_use]
    pub const fn state(&self) -> PermissionState {
        match self {
            Self::Reported { state } => *state,
            Self::VerifiedByRead { .. } => PermissionState::Granted,
            Self::NoDataUnverified => PermissionState::NotDetermined,
        }
    }

    /// Whether the outcome proves the grant
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        self.state().is_granted()
    }

    /// Whether the outcome proves a refusal
    #[must_use]
    pub const fn is_refused(&self) -> bool {
        self.state().is_refused()
    }
}
