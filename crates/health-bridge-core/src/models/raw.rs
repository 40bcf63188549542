// ABOUTME: Raw vendor samples as delivered by adapters before normalization
// ABOUTME: Ordered vendor fields with loosely typed values the decomposer normalizes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Loosely typed vendor field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RawValue {
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// Single-precision float
    Float(f32),
    /// Double-precision float
    Double(f64),
    /// Text
    Text(String),
    /// Boolean
    Bool(bool),
    /// Any other vendor format, kept as JSON
    Other(Value),
}

impl RawValue {
    /// Numeric value normalized to `f64`, if the value is numeric
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(f64::from(*v)),
            Self::Long(v) => Some(*v as f64),
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            Self::Text(_) | Self::Bool(_) | Self::Other(_) => None,
        }
    }

    /// Whether the value has a numeric representation
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Int(_) | Self::Long(_) | Self::Float(_) | Self::Double(_)
        )
    }

    /// JSON form used in reading metadata
    ///
    /// Numbers become `f64`; non-finite floats become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Other(v) => v.clone(),
            numeric => numeric
                .as_f64()
                .and_then(serde_json::Number::from_f64)
                .map_or(Value::Null, Value::Number),
        }
    }

    /// Best-effort conversion of a JSON value received from a cloud endpoint
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Bool(b) => Self::Bool(*b),
            Value::String(s) => Self::Text(s.clone()),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Long)
                .or_else(|| n.as_f64().map(Self::Double))
                .unwrap_or_else(|| Self::Other(value.clone())),
            other => Self::Other(other.clone()),
        }
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for RawValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// Named vendor field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawField {
    /// Vendor field name, verbatim
    pub name: String,
    /// Vendor value
    pub value: RawValue,
}

/// One vendor record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Vendor data type identifier (e.g. `com.huawei.continuous.steps.delta`)
    pub vendor_type: String,
    /// Sample start (epoch millis)
    pub start_millis: i64,
    /// Sample end for interval records (epoch millis)
    pub end_millis: Option<i64>,
    /// Originating device or app
    pub source: Option<String>,
    /// Vendor fields in delivery order
    pub fields: Vec<RawField>,
}

impl RawSample {
    /// Create a sample with no fields
    #[must_use]
    pub fn new(vendor_type: impl Into<String>, start_millis: i64) -> Self {
        Self {
            vendor_type: vendor_type.into(),
            start_millis,
            end_millis: None,
            source: None,
            fields: Vec::new(),
        }
    }

    /// Append a field
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.fields.push(RawField {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Set the originating source label
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the interval end
    #[must_use]
    pub const fn with_end(mut self, end_millis: i64) -> Self {
        self.end_millis = Some(end_millis);
        self
    }

    /// Look up a field by case-insensitive exact name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&RawValue> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| &f.value)
    }
}

/// Result of a single adapter read
pub type RawSampleSet = Vec<RawSample>;
