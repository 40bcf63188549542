// ABOUTME: Health data type catalogue with keys, display names, units and reading shape
// ABOUTME: Declares which types are composite and the synonyms used to locate their components
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::ParseKeyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One named component of a composite reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeComponent {
    /// Canonical metadata key for the component
    pub name: &'static str,
    /// Lowercase fragments matched against vendor field names
    pub synonyms: &'static [&'static str],
    /// Whether decomposition fails when the component cannot be located
    pub required: bool,
}

/// Blood pressure components
pub const BLOOD_PRESSURE_COMPONENTS: &[CompositeComponent] = &[
    CompositeComponent {
        name: "systolic",
        synonyms: &["systolic", "sbp", "high_pressure", "highpressure"],
        required: true,
    },
    CompositeComponent {
        name: "diastolic",
        synonyms: &["diastolic", "dbp", "low_pressure", "lowpressure"],
        required: true,
    },
    CompositeComponent {
        name: "pulse",
        synonyms: &["pulse", "sphygmus", "heart_rate", "heartrate"],
        required: false,
    },
];

/// Whether a reading carries one value or several named components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingShape {
    /// A single scalar placed in `primary_value`
    Atomic,
    /// Several named values placed in metadata
    Composite(&'static [CompositeComponent]),
}

/// Health metric understood by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Step count
    Steps,
    /// Distance walked or run
    Distance,
    /// Active energy burned
    ActiveCalories,
    /// Instantaneous heart rate
    HeartRate,
    /// Resting heart rate
    RestingHeartRate,
    /// Blood glucose level
    BloodGlucose,
    /// Systolic and diastolic blood pressure
    BloodPressure,
    /// Blood oxygen saturation
    BloodOxygen,
    /// Body temperature
    BodyTemperature,
    /// Body weight
    Weight,
    /// Body height
    Height,
    /// Body fat percentage
    BodyFat,
    /// Body mass index
    Bmi,
    /// Sleep duration
    Sleep,
    /// Water intake
    Water,
}

impl DataType {
    /// Every data type, in declaration order
    pub const ALL: [Self; 15] = [
        Self::Steps,
        Self::Distance,
        Self::ActiveCalories,
        Self::HeartRate,
        Self::RestingHeartRate,
        Self::BloodGlucose,
        Self::BloodPressure,
        Self::BloodOxygen,
        Self::BodyTemperature,
        Self::Weight,
        Self::Height,
        Self::BodyFat,
        Self::Bmi,
        Self::Sleep,
        Self::Water,
    ];

    /// Stable string key
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Steps => "steps",
            Self::Distance => "distance",
            Self::ActiveCalories => "active_calories",
            Self::HeartRate => "heart_rate",
            Self::RestingHeartRate => "resting_heart_rate",
            Self::BloodGlucose => "blood_glucose",
            Self::BloodPressure => "blood_pressure",
            Self::BloodOxygen => "blood_oxygen",
            Self::BodyTemperature => "body_temperature",
            Self::Weight => "weight",
            Self::Height => "height",
            Self::BodyFat => "body_fat",
            Self::Bmi => "bmi",
            Self::Sleep => "sleep",
            Self::Water => "water",
        }
    }

    /// Human-readable name
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Steps => "Steps",
            Self::Distance => "Distance",
            Self::ActiveCalories => "Active Calories",
            Self::HeartRate => "Heart Rate",
            Self::RestingHeartRate => "Resting Heart Rate",
            Self::BloodGlucose => "Blood Glucose",
            Self::BloodPressure => "Blood Pressure",
            Self::BloodOxygen => "Blood Oxygen",
            Self::BodyTemperature => "Body Temperature",
            Self::Weight => "Weight",
            Self::Height => "Height",
            Self::BodyFat => "Body Fat",
            Self::Bmi => "BMI",
            Self::Sleep => "Sleep",
            Self::Water => "Water",
        }
    }

    /// Canonical unit of normalized readings
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Steps => "count",
            Self::Distance => "m",
            Self::ActiveCalories => "kcal",
            Self::HeartRate | Self::RestingHeartRate => "bpm",
            Self::BloodGlucose => "mmol/L",
            Self::BloodPressure => "mmHg",
            Self::BloodOxygen | Self::BodyFat => "%",
            Self::BodyTemperature => "°C",
            Self::Weight => "kg",
            Self::Height => "cm",
            Self::Bmi => "kg/m²",
            Self::Sleep => "min",
            Self::Water => "mL",
        }
    }

    /// Atomic or composite classification
    #[must_use]
    pub const fn shape(self) -> ReadingShape {
        match self {
            Self::BloodPressure => ReadingShape::Composite(BLOOD_PRESSURE_COMPONENTS),
            _ => ReadingShape::Atomic,
        }
    }

    /// Whether readings of this type carry named components instead of a primary value
    #[must_use]
    pub const fn is_composite(self) -> bool {
        matches!(self.shape(), ReadingShape::Composite(_))
    }

    /// Declared components (empty for atomic types)
    #[must_use]
    pub const fn components(self) -> &'static [CompositeComponent] {
        match self.shape() {
            ReadingShape::Composite(components) => components,
            ReadingShape::Atomic => &[],
        }
    }

    /// Field names commonly used by vendors for the primary value
    ///
    /// Consulted after the platform's own binding and before falling back to
    /// the first numeric field of a sample.
    #[must_use]
    pub const fn common_field_names(self) -> &'static [&'static str] {
        match self {
            Self::Steps => &["steps", "count", "step_count"],
            Self::Distance => &["distance"],
            Self::ActiveCalories => &["calorie", "calories", "energy"],
            Self::HeartRate | Self::RestingHeartRate => &["heart_rate", "bpm", "rate"],
            Self::BloodGlucose => &["glucose", "level", "glucose_level"],
            Self::BloodOxygen => &["spo2", "saturation", "oxygen_saturation"],
            Self::BodyTemperature => &["temperature", "body_temperature"],
            Self::Weight => &["weight", "body_weight"],
            Self::Height => &["height"],
            Self::BodyFat => &["body_fat", "body_fat_rate", "percentage"],
            Self::Bmi => &["bmi"],
            Self::Sleep => &["duration", "sleep_duration", "minutes"],
            Self::Water => &["amount", "volume", "water"],
            Self::BloodPressure => &[],
        }
    }

    /// Parse a stable key
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == key)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DataType {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::from_key(&normalized).ok_or_else(|| ParseKeyError {
            kind: "data type",
            key: s.to_owned(),
        })
    }
}
