// ABOUTME: Tests for the static capability registry
// ABOUTME: Covers per-platform support lookups, special-permission flags and the typed guard
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use health_bridge::adapters::descriptor_for;
use health_bridge::capabilities::{
    ensure_supported, entry, requires_special_permission, supported_types, supports, table,
};
use health_bridge::{BridgeError, DataType, ErrorCode, HealthOperation, Platform};

// ============================================================================
// Lookups
// ============================================================================

#[test]
fn test_every_platform_has_a_table() {
    for platform in Platform::ALL {
        let table = table(platform).expect("table for every platform");
        assert_eq!(table.platform, platform);
        assert!(!table.entries.is_empty());
    }
}

#[test]
fn test_samsung_steps_is_read_only() {
    assert!(supports(Platform::SamsungHealth, DataType::Steps, HealthOperation::Read));
    assert!(!supports(Platform::SamsungHealth, DataType::Steps, HealthOperation::Write));

    let row = entry(Platform::SamsungHealth, DataType::Steps).unwrap();
    assert!(row.can_read());
    assert!(!row.can_write());
    assert!(row.notes.is_some());
}

#[test]
fn test_huawei_cloud_never_writes() {
    assert!(supported_types(Platform::HuaweiCloud, Some(HealthOperation::Write)).is_empty());
    assert!(!supported_types(Platform::HuaweiCloud, Some(HealthOperation::Read)).is_empty());
}

#[test]
fn test_missing_row_means_unsupported() {
    assert!(entry(Platform::SamsungHealth, DataType::Distance).is_none());
    assert!(!supports(Platform::SamsungHealth, DataType::Distance, HealthOperation::Read));
    assert!(!supports(Platform::GoogleFit, DataType::Bmi, HealthOperation::Read));
}

#[test]
fn test_supported_types_filters_by_operation() {
    let all = supported_types(Platform::SamsungHealth, None);
    let writable = supported_types(Platform::SamsungHealth, Some(HealthOperation::Write));

    assert!(all.contains(&DataType::Steps));
    assert!(!writable.contains(&DataType::Steps));
    assert!(writable.is_subset(&all));
    assert!(writable.contains(&DataType::BloodPressure));
}

#[test]
fn test_special_permission_flags() {
    assert!(requires_special_permission(Platform::HuaweiHealth, DataType::BloodGlucose));
    assert!(requires_special_permission(Platform::HuaweiCloud, DataType::BloodPressure));
    assert!(!requires_special_permission(Platform::HuaweiHealth, DataType::Steps));
    assert!(!requires_special_permission(Platform::AppleHealth, DataType::BloodGlucose));
    // Unsupported pairs are never flagged
    assert!(!requires_special_permission(Platform::SamsungHealth, DataType::Distance));
}

#[test]
fn test_supported_types_have_vendor_bindings() {
    for platform in Platform::ALL {
        let descriptor = descriptor_for(platform);
        for data_type in supported_types(platform, None) {
            assert!(
                descriptor.binding(data_type).is_some(),
                "{platform} supports {data_type} but has no vendor binding"
            );
        }
    }
}

// ============================================================================
// Typed guard
// ============================================================================

#[test]
fn test_ensure_supported_passes_supported_pairs() {
    ensure_supported(Platform::AppleHealth, DataType::Water, HealthOperation::Write).unwrap();
    ensure_supported(Platform::HuaweiCloud, DataType::Steps, HealthOperation::Read).unwrap();
}

#[test]
fn test_ensure_supported_rejects_with_context() {
    let err = ensure_supported(Platform::SamsungHealth, DataType::Steps, HealthOperation::Write)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnsupportedOperation);
    assert!(!err.is_retryable());
    match err {
        BridgeError::UnsupportedOperation {
            platform,
            data_type,
            operation,
        } => {
            assert_eq!(platform, Platform::SamsungHealth);
            assert_eq!(data_type, DataType::Steps);
            assert_eq!(operation, HealthOperation::Write);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
