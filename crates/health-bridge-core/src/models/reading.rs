// ABOUTME: Normalized health reading returned to the host and values accepted for writes
// ABOUTME: Atomic readings carry a primary value; composite readings carry named metadata values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{DataType, Platform};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Normalized reading
///
/// For composite types `primary_value` is `None` and the named components are
/// in `metadata` ahead of the raw vendor fields. For atomic types
/// `primary_value` is set and `metadata` only holds auxiliary vendor fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReading {
    /// Data type of the reading
    #[serde(rename = "type")]
    pub data_type: DataType,
    /// Scalar value for atomic types
    pub primary_value: Option<f64>,
    /// Sample time (epoch millis)
    pub timestamp_millis: i64,
    /// Canonical unit
    pub unit: String,
    /// Platform the reading came from
    pub platform: Platform,
    /// Originating device or app
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_label: Option<String>,
    /// Ordered auxiliary values
    pub metadata: Map<String, Value>,
}

impl HealthReading {
    /// Numeric value of a named composite component
    #[must_use]
    pub fn component(&self, name: &str) -> Option<f64> {
        self.metadata.get(name).and_then(Value::as_f64)
    }
}

/// Amount carried by a write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WriteAmount {
    /// Single value for atomic types
    Scalar(f64),
    /// Named components for composite types
    Composite(Vec<(String, f64)>),
}

/// Value submitted to `write_health_data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteValue {
    /// What to write
    pub amount: WriteAmount,
    /// Sample time
    pub start: DateTime<Utc>,
    /// Interval end, for interval types
    pub end: Option<DateTime<Utc>>,
}

impl WriteValue {
    /// Scalar value at `start`
    #[must_use]
    pub const fn scalar(value: f64, start: DateTime<Utc>) -> Self {
        Self {
            amount: WriteAmount::Scalar(value),
            start,
            end: None,
        }
    }

    /// Composite value at `start`
    #[must_use]
    pub fn composite<I, K>(components: I, start: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            amount: WriteAmount::Composite(
                components
                    .into_iter()
                    .map(|(name, value)| (name.into(), value))
                    .collect(),
            ),
            start,
            end: None,
        }
    }

    /// Set the interval end
    #[must_use]
    pub const fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }
}
