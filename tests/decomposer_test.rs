// ABOUTME: Tests for normalizing raw vendor samples into health readings
// ABOUTME: Covers composite blood pressure decomposition, atomic field resolution and dropped samples
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::float_cmp)]
#![allow(missing_docs)]

use health_bridge::decompose::{decompose, decompose_all, DecomposeError};
use health_bridge::{BridgeError, DataType, ErrorCode, Platform, RawSample};
use serde_json::json;

const BP: DataType = DataType::BloodPressure;
const AT: i64 = 1_717_200_000_000;

// ============================================================================
// Composite readings
// ============================================================================

#[test]
fn test_blood_pressure_has_no_primary_value() {
    let sample = RawSample::new("com.samsung.health.blood_pressure", AT)
        .with_field("systolic", 120.0)
        .with_field("diastolic", 80.0);

    let reading = decompose(&sample, BP, Platform::SamsungHealth, None).unwrap();

    assert_eq!(reading.primary_value, None);
    assert_eq!(reading.component("systolic"), Some(120.0));
    assert_eq!(reading.component("diastolic"), Some(80.0));
    assert_eq!(reading.metadata.len(), 2);
    assert_eq!(reading.unit, "mmHg");
    assert_eq!(reading.timestamp_millis, AT);
    assert_eq!(reading.platform, Platform::SamsungHealth);
}

#[test]
fn test_named_components_precede_raw_fields() {
    let sample = RawSample::new("com.huawei.instantaneous.blood_pressure", AT)
        .with_field("systolic_pressure", 131_i64)
        .with_field("diastolic_pressure", 86_i64)
        .with_field("sphygmus", 72_i32)
        .with_field("measure_body_posture", "sitting");

    let reading = decompose(&sample, BP, Platform::HuaweiHealth, None).unwrap();

    let keys: Vec<&str> = reading.metadata.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "systolic",
            "diastolic",
            "pulse",
            "systolic_pressure",
            "diastolic_pressure",
            "sphygmus",
            "measure_body_posture",
        ]
    );
    assert_eq!(reading.component("pulse"), Some(72.0));
    assert_eq!(reading.metadata["measure_body_posture"], json!("sitting"));
}

#[test]
fn test_component_synonyms_are_case_insensitive() {
    let sample = RawSample::new("bp", AT)
        .with_field("SBP", 118_i32)
        .with_field("DBP", 76_i32);

    let reading = decompose(&sample, BP, Platform::GoogleFit, None).unwrap();
    assert_eq!(reading.component("systolic"), Some(118.0));
    assert_eq!(reading.component("diastolic"), Some(76.0));
}

#[test]
fn test_optional_component_may_be_absent() {
    let sample = RawSample::new("bp", AT)
        .with_field("high_pressure", 140.0)
        .with_field("low_pressure", 90.0);

    let reading = decompose(&sample, BP, Platform::HuaweiHealth, None).unwrap();
    assert_eq!(reading.component("pulse"), None);
    assert!(!reading.metadata.contains_key("pulse"));
}

#[test]
fn test_missing_required_component_is_an_error() {
    let sample = RawSample::new("bp", AT).with_field("systolic", 120.0);

    let err = decompose(&sample, BP, Platform::SamsungHealth, None).unwrap_err();
    assert_eq!(
        err,
        DecomposeError::MissingCompositeField {
            data_type: BP,
            component: "diastolic",
        }
    );

    let bridge: BridgeError = err.into();
    assert_eq!(bridge.code(), ErrorCode::CompositeFieldMissing);
    assert!(bridge.to_string().contains("diastolic"));
}

#[test]
fn test_text_component_is_not_zero_filled() {
    let sample = RawSample::new("bp", AT)
        .with_field("systolic", "120")
        .with_field("diastolic", 80.0);

    let err = decompose(&sample, BP, Platform::SamsungHealth, None).unwrap_err();
    assert!(matches!(
        err,
        DecomposeError::MissingCompositeField {
            component: "systolic",
            ..
        }
    ));
}

#[test]
fn test_one_field_never_fills_two_components() {
    let sample = RawSample::new("bp", AT).with_field("systolic_or_diastolic", 120.0);

    let err = decompose(&sample, BP, Platform::SamsungHealth, None).unwrap_err();
    assert!(matches!(
        err,
        DecomposeError::MissingCompositeField {
            component: "diastolic",
            ..
        }
    ));
}

// ============================================================================
// Atomic readings
// ============================================================================

#[test]
fn test_platform_binding_wins_case_insensitively() {
    let sample = RawSample::new("com.huawei.instantaneous.blood_glucose", AT)
        .with_field("glucose", 9.9)
        .with_field("LEVEL", 5.4)
        .with_source("meter-01");

    let reading =
        decompose(&sample, DataType::BloodGlucose, Platform::HuaweiHealth, Some("level")).unwrap();

    assert_eq!(reading.primary_value, Some(5.4));
    assert_eq!(reading.metadata["glucose"], json!(9.9));
    assert!(!reading.metadata.contains_key("LEVEL"));
    assert_eq!(reading.source_label.as_deref(), Some("meter-01"));
    assert_eq!(reading.unit, "mmol/L");
}

#[test]
fn test_common_field_names_used_without_binding() {
    let sample = RawSample::new("glucose", AT)
        .with_field("meal", "after")
        .with_field("glucose", 6.2);

    let reading = decompose(&sample, DataType::BloodGlucose, Platform::GoogleFit, None).unwrap();

    assert_eq!(reading.primary_value, Some(6.2));
    assert_eq!(reading.metadata["meal"], json!("after"));
}

#[test]
fn test_first_numeric_field_is_last_resort() {
    let sample = RawSample::new("weight", AT)
        .with_field("device", "scale")
        .with_field("reading", 71.5)
        .with_field("other", 3.0);

    let reading =
        decompose(&sample, DataType::Weight, Platform::AppleHealth, Some("quantity")).unwrap();
    assert_eq!(reading.primary_value, Some(71.5));
    assert_eq!(reading.metadata.len(), 2);
}

#[test]
fn test_integer_values_normalize_to_f64() {
    let sample = RawSample::new("steps", AT).with_field("count", 1_200_i32);
    let reading =
        decompose(&sample, DataType::Steps, Platform::SamsungHealth, Some("count")).unwrap();
    assert_eq!(reading.primary_value, Some(1200.0));
    assert_eq!(reading.unit, "count");
}

#[test]
fn test_sample_without_numbers_is_rejected() {
    let sample = RawSample::new("steps", AT).with_field("note", "none");
    let err =
        decompose(&sample, DataType::Steps, Platform::SamsungHealth, Some("count")).unwrap_err();
    assert_eq!(
        err,
        DecomposeError::NoNumericField {
            data_type: DataType::Steps
        }
    );
}

// ============================================================================
// Batches
// ============================================================================

#[test]
fn test_decompose_all_separates_dropped_samples() {
    let samples = vec![
        RawSample::new("bp", AT)
            .with_field("systolic", 120.0)
            .with_field("diastolic", 80.0),
        RawSample::new("bp", AT + 1_000).with_field("systolic", 125.0),
        RawSample::new("bp", AT + 2_000)
            .with_field("systolic", 118.0)
            .with_field("diastolic", 79.0),
    ];

    let (readings, dropped) = decompose_all(&samples, BP, Platform::SamsungHealth, None);

    assert_eq!(readings.len(), 2);
    assert_eq!(readings[0].timestamp_millis, AT);
    assert_eq!(readings[1].timestamp_millis, AT + 2_000);
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].timestamp_millis, AT + 1_000);
    assert_eq!(dropped[0].vendor_type, "bp");
    assert_eq!(dropped[0].error.code(), ErrorCode::CompositeFieldMissing);
}

#[test]
fn test_reading_serializes_with_type_key() {
    let sample = RawSample::new("steps", AT).with_field("count", 10_i32);
    let reading =
        decompose(&sample, DataType::Steps, Platform::SamsungHealth, Some("count")).unwrap();

    let value = serde_json::to_value(&reading).unwrap();
    assert_eq!(value["type"], json!("steps"));
    assert_eq!(value["primaryValue"], json!(10.0));
    assert_eq!(value["timestampMillis"], json!(AT));
    assert!(value.get("sourceLabel").is_none());
}
