// ABOUTME: Health platform identities supported by the bridge
// ABOUTME: Stable string keys, display names and on-device vs cloud classification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::ParseKeyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vendor health platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Samsung Health data SDK (on-device)
    SamsungHealth,
    /// Huawei Health Kit (on-device)
    HuaweiHealth,
    /// Huawei Health Kit REST API (cloud)
    HuaweiCloud,
    /// Apple `HealthKit`
    AppleHealth,
    /// Google Fit
    GoogleFit,
}

impl Platform {
    /// Every platform, in declaration order
    pub const ALL: [Self; 5] = [
        Self::SamsungHealth,
        Self::HuaweiHealth,
        Self::HuaweiCloud,
        Self::AppleHealth,
        Self::GoogleFit,
    ];

    /// Stable string key
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::SamsungHealth => "samsung_health",
            Self::HuaweiHealth => "huawei_health",
            Self::HuaweiCloud => "huawei_cloud",
            Self::AppleHealth => "apple_health",
            Self::GoogleFit => "google_fit",
        }
    }

    /// Human-readable name
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::SamsungHealth => "Samsung Health",
            Self::HuaweiHealth => "Huawei Health",
            Self::HuaweiCloud => "Huawei Health Cloud",
            Self::AppleHealth => "Apple Health",
            Self::GoogleFit => "Google Fit",
        }
    }

    /// Whether the platform is reached over the network rather than an on-device SDK
    #[must_use]
    pub const fn is_cloud(self) -> bool {
        matches!(self, Self::HuaweiCloud)
    }

    /// Parse a stable key
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Platform {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::from_key(&normalized).ok_or_else(|| ParseKeyError {
            kind: "platform",
            key: s.to_owned(),
        })
    }
}
