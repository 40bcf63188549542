// ABOUTME: Static per-platform descriptors binding data types to vendor identifiers and scopes
// ABOUTME: Records max query span, minimum SDK version and whether the grant query is reliable
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use chrono::Duration;
use health_bridge_core::{DataType, HealthOperation, Platform};

/// Binding of one data type to a vendor's identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeBinding {
    /// Data type being bound
    pub data_type: DataType,
    /// Vendor data type identifier
    pub vendor_type: &'static str,
    /// Vendor permission scope stem; the operation key is appended
    pub scope: &'static str,
    /// Vendor field holding the primary value (atomic types)
    pub primary_field: Option<&'static str>,
}

impl TypeBinding {
    /// Vendor scope string for `operation`
    #[must_use]
    pub fn scope_for(&self, operation: HealthOperation) -> String {
        format!("{}.{}", self.scope, operation.key())
    }
}

/// Static description of one platform's vendor SDK
#[derive(Debug, Clone, Copy)]
pub struct PlatformDescriptor {
    /// Platform identity
    pub platform: Platform,
    /// Whether the SDK reports read grants truthfully
    pub grant_query_reliable: bool,
    /// Largest window one vendor read accepts, in days
    pub max_query_span_days: i64,
    /// Minimum vendor SDK or app version the adapter works with
    pub min_sdk_version: u32,
    /// Data type bindings
    pub bindings: &'static [TypeBinding],
}

impl PlatformDescriptor {
    /// Binding for `data_type`
    #[must_use]
    pub fn binding(&self, data_type: DataType) -> Option<&'static TypeBinding> {
        self.bindings.iter().find(|b| b.data_type == data_type)
    }

    /// Largest window one vendor read accepts
    #[must_use]
    pub fn max_query_span(&self) -> Duration {
        Duration::days(self.max_query_span_days)
    }

    /// Vendor field holding the primary value of `data_type`
    #[must_use]
    pub fn primary_field(&self, data_type: DataType) -> Option<&'static str> {
        self.binding(data_type).and_then(|b| b.primary_field)
    }
}

const fn bind(
    data_type: DataType,
    vendor_type: &'static str,
    scope: &'static str,
    primary_field: Option<&'static str>,
) -> TypeBinding {
    TypeBinding {
        data_type,
        vendor_type,
        scope,
        primary_field,
    }
}

const SAMSUNG_BINDINGS: &[TypeBinding] = &[
    bind(
        DataType::Steps,
        "com.samsung.health.step_count",
        "com.samsung.health.step_count",
        Some("count"),
    ),
    bind(
        DataType::ActiveCalories,
        "com.samsung.shealth.calories_burned",
        "com.samsung.shealth.calories_burned",
        Some("active_calorie"),
    ),
    bind(
        DataType::HeartRate,
        "com.samsung.health.heart_rate",
        "com.samsung.health.heart_rate",
        Some("heart_rate"),
    ),
    bind(
        DataType::BloodGlucose,
        "com.samsung.health.blood_glucose",
        "com.samsung.health.blood_glucose",
        Some("glucose"),
    ),
    bind(
        DataType::BloodPressure,
        "com.samsung.health.blood_pressure",
        "com.samsung.health.blood_pressure",
        None,
    ),
    bind(
        DataType::BloodOxygen,
        "com.samsung.health.oxygen_saturation",
        "com.samsung.health.oxygen_saturation",
        Some("spo2"),
    ),
    bind(
        DataType::BodyTemperature,
        "com.samsung.health.body_temperature",
        "com.samsung.health.body_temperature",
        Some("temperature"),
    ),
    bind(
        DataType::Weight,
        "com.samsung.health.weight",
        "com.samsung.health.weight",
        Some("weight"),
    ),
    bind(
        DataType::Height,
        "com.samsung.health.height",
        "com.samsung.health.height",
        Some("height"),
    ),
    bind(
        DataType::BodyFat,
        "com.samsung.health.weight",
        "com.samsung.health.weight",
        Some("body_fat"),
    ),
    bind(DataType::Sleep, "com.samsung.health.sleep", "com.samsung.health.sleep", Some("duration")),
    bind(
        DataType::Water,
        "com.samsung.health.water_intake",
        "com.samsung.health.water_intake",
        Some("amount"),
    ),
];

const HUAWEI_BINDINGS: &[TypeBinding] = &[
    bind(
        DataType::Steps,
        "com.huawei.continuous.steps.delta",
        "https://www.huawei.com/healthkit/step",
        Some("steps"),
    ),
    bind(
        DataType::Distance,
        "com.huawei.continuous.distance.delta",
        "https://www.huawei.com/healthkit/distance",
        Some("distance"),
    ),
    bind(
        DataType::ActiveCalories,
        "com.huawei.continuous.calories.burnt",
        "https://www.huawei.com/healthkit/calories",
        Some("calories_total"),
    ),
    bind(
        DataType::HeartRate,
        "com.huawei.instantaneous.heart_rate",
        "https://www.huawei.com/healthkit/heartrate",
        Some("bpm"),
    ),
    bind(
        DataType::RestingHeartRate,
        "com.huawei.instantaneous.resting_heart_rate",
        "https://www.huawei.com/healthkit/heartrate",
        Some("bpm"),
    ),
    bind(
        DataType::BloodGlucose,
        "com.huawei.instantaneous.blood_glucose",
        "https://www.huawei.com/healthkit/bloodglucose",
        Some("level"),
    ),
    bind(
        DataType::BloodPressure,
        "com.huawei.instantaneous.blood_pressure",
        "https://www.huawei.com/healthkit/bloodpressure",
        None,
    ),
    bind(
        DataType::BloodOxygen,
        "com.huawei.instantaneous.spo2",
        "https://www.huawei.com/healthkit/oxygensaturation",
        Some("saturation"),
    ),
    bind(
        DataType::BodyTemperature,
        "com.huawei.instantaneous.body.temperature",
        "https://www.huawei.com/healthkit/bodytemperature",
        Some("temperature"),
    ),
    bind(
        DataType::Weight,
        "com.huawei.instantaneous.body_weight",
        "https://www.huawei.com/healthkit/bodyweight",
        Some("body_weight"),
    ),
    bind(
        DataType::Height,
        "com.huawei.instantaneous.height",
        "https://www.huawei.com/healthkit/heightweight",
        Some("height"),
    ),
    bind(
        DataType::BodyFat,
        "com.huawei.instantaneous.body_fat_rate",
        "https://www.huawei.com/healthkit/bodyweight",
        Some("body_fat_rate"),
    ),
    bind(
        DataType::Bmi,
        "com.huawei.instantaneous.bmi",
        "https://www.huawei.com/healthkit/bodyweight",
        Some("bmi"),
    ),
    bind(
        DataType::Sleep,
        "com.huawei.continuous.sleep.fragment",
        "https://www.huawei.com/healthkit/sleep",
        Some("duration"),
    ),
];

const APPLE_BINDINGS: &[TypeBinding] = &[
    bind(
        DataType::Steps,
        "HKQuantityTypeIdentifierStepCount",
        "HKQuantityTypeIdentifierStepCount",
        Some("quantity"),
    ),
    bind(
        DataType::Distance,
        "HKQuantityTypeIdentifierDistanceWalkingRunning",
        "HKQuantityTypeIdentifierDistanceWalkingRunning",
        Some("quantity"),
    ),
    bind(
        DataType::ActiveCalories,
        "HKQuantityTypeIdentifierActiveEnergyBurned",
        "HKQuantityTypeIdentifierActiveEnergyBurned",
        Some("quantity"),
    ),
    bind(
        DataType::HeartRate,
        "HKQuantityTypeIdentifierHeartRate",
        "HKQuantityTypeIdentifierHeartRate",
        Some("quantity"),
    ),
    bind(
        DataType::RestingHeartRate,
        "HKQuantityTypeIdentifierRestingHeartRate",
        "HKQuantityTypeIdentifierRestingHeartRate",
        Some("quantity"),
    ),
    bind(
        DataType::BloodGlucose,
        "HKQuantityTypeIdentifierBloodGlucose",
        "HKQuantityTypeIdentifierBloodGlucose",
        Some("quantity"),
    ),
    bind(
        DataType::BloodPressure,
        "HKCorrelationTypeIdentifierBloodPressure",
        "HKCorrelationTypeIdentifierBloodPressure",
        None,
    ),
    bind(
        DataType::BloodOxygen,
        "HKQuantityTypeIdentifierOxygenSaturation",
        "HKQuantityTypeIdentifierOxygenSaturation",
        Some("quantity"),
    ),
    bind(
        DataType::BodyTemperature,
        "HKQuantityTypeIdentifierBodyTemperature",
        "HKQuantityTypeIdentifierBodyTemperature",
        Some("quantity"),
    ),
    bind(
        DataType::Weight,
        "HKQuantityTypeIdentifierBodyMass",
        "HKQuantityTypeIdentifierBodyMass",
        Some("quantity"),
    ),
    bind(
        DataType::Height,
        "HKQuantityTypeIdentifierHeight",
        "HKQuantityTypeIdentifierHeight",
        Some("quantity"),
    ),
    bind(
        DataType::BodyFat,
        "HKQuantityTypeIdentifierBodyFatPercentage",
        "HKQuantityTypeIdentifierBodyFatPercentage",
        Some("quantity"),
    ),
    bind(
        DataType::Bmi,
        "HKQuantityTypeIdentifierBodyMassIndex",
        "HKQuantityTypeIdentifierBodyMassIndex",
        Some("quantity"),
    ),
    bind(
        DataType::Sleep,
        "HKCategoryTypeIdentifierSleepAnalysis",
        "HKCategoryTypeIdentifierSleepAnalysis",
        Some("minutes"),
    ),
    bind(
        DataType::Water,
        "HKQuantityTypeIdentifierDietaryWater",
        "HKQuantityTypeIdentifierDietaryWater",
        Some("quantity"),
    ),
];

const GOOGLE_FIT_BINDINGS: &[TypeBinding] = &[
    bind(
        DataType::Steps,
        "com.google.step_count.delta",
        "https://www.googleapis.com/auth/fitness.activity",
        Some("steps"),
    ),
    bind(
        DataType::Distance,
        "com.google.distance.delta",
        "https://www.googleapis.com/auth/fitness.location",
        Some("distance"),
    ),
    bind(
        DataType::ActiveCalories,
        "com.google.calories.expended",
        "https://www.googleapis.com/auth/fitness.activity",
        Some("calories"),
    ),
    bind(
        DataType::HeartRate,
        "com.google.heart_rate.bpm",
        "https://www.googleapis.com/auth/fitness.heart_rate",
        Some("bpm"),
    ),
    bind(
        DataType::BloodGlucose,
        "com.google.blood_glucose",
        "https://www.googleapis.com/auth/fitness.blood_glucose",
        Some("blood_glucose_level"),
    ),
    bind(
        DataType::BloodPressure,
        "com.google.blood_pressure",
        "https://www.googleapis.com/auth/fitness.blood_pressure",
        None,
    ),
    bind(
        DataType::BloodOxygen,
        "com.google.oxygen_saturation",
        "https://www.googleapis.com/auth/fitness.oxygen_saturation",
        Some("oxygen_saturation"),
    ),
    bind(
        DataType::BodyTemperature,
        "com.google.body.temperature",
        "https://www.googleapis.com/auth/fitness.body_temperature",
        Some("body_temperature"),
    ),
    bind(
        DataType::Weight,
        "com.google.weight",
        "https://www.googleapis.com/auth/fitness.body",
        Some("weight"),
    ),
    bind(
        DataType::Height,
        "com.google.height",
        "https://www.googleapis.com/auth/fitness.body",
        Some("height"),
    ),
    bind(
        DataType::BodyFat,
        "com.google.body.fat.percentage",
        "https://www.googleapis.com/auth/fitness.body",
        Some("percentage"),
    ),
    bind(
        DataType::Sleep,
        "com.google.sleep.segment",
        "https://www.googleapis.com/auth/fitness.sleep",
        Some("duration"),
    ),
    bind(
        DataType::Water,
        "com.google.hydration",
        "https://www.googleapis.com/auth/fitness.nutrition",
        Some("volume"),
    ),
];

/// Samsung Health data SDK
pub static SAMSUNG_HEALTH: PlatformDescriptor = PlatformDescriptor {
    platform: Platform::SamsungHealth,
    grant_query_reliable: true,
    max_query_span_days: 30,
    min_sdk_version: 6_220_000,
    bindings: SAMSUNG_BINDINGS,
};

/// Huawei Health Kit on-device SDK
///
/// Read grants cannot be queried reliably; the permission manager verifies
/// them by reading.
pub static HUAWEI_HEALTH: PlatformDescriptor = PlatformDescriptor {
    platform: Platform::HuaweiHealth,
    grant_query_reliable: false,
    max_query_span_days: 30,
    min_sdk_version: 6_101_000,
    bindings: HUAWEI_BINDINGS,
};

/// Huawei Health Kit REST API
///
/// Uses the same data type identifiers and scopes as the device SDK. The
/// span is that of the detail endpoint; the daily endpoint has its own.
pub static HUAWEI_CLOUD: PlatformDescriptor = PlatformDescriptor {
    platform: Platform::HuaweiCloud,
    grant_query_reliable: true,
    max_query_span_days: 30,
    min_sdk_version: 0,
    bindings: HUAWEI_BINDINGS,
};

/// Apple `HealthKit`
///
/// `HealthKit` hides read authorization from apps, so grants are verified by reading.
pub static APPLE_HEALTH: PlatformDescriptor = PlatformDescriptor {
    platform: Platform::AppleHealth,
    grant_query_reliable: false,
    max_query_span_days: 365,
    min_sdk_version: 13,
    bindings: APPLE_BINDINGS,
};

/// Google Fit
pub static GOOGLE_FIT: PlatformDescriptor = PlatformDescriptor {
    platform: Platform::GoogleFit,
    grant_query_reliable: true,
    max_query_span_days: 90,
    min_sdk_version: 20_000_000,
    bindings: GOOGLE_FIT_BINDINGS,
};

/// Descriptor of `platform`
#[must_use]
pub fn descriptor_for(platform: Platform) -> &'static PlatformDescriptor {
    match platform {
        Platform::SamsungHealth => &SAMSUNG_HEALTH,
        Platform::HuaweiHealth => &HUAWEI_HEALTH,
        Platform::HuaweiCloud => &HUAWEI_CLOUD,
        Platform::AppleHealth => &APPLE_HEALTH,
        Platform::GoogleFit => &GOOGLE_FIT,
    }
}
