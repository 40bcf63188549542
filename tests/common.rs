// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides logging setup, synthetic vendor samples, bridge builders and cloud test config
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `health_bridge`
//!
//! This module provides common test setup functions to reduce duplication
//! across integration tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use health_bridge::adapters::{descriptor_for, DeviceAdapter, SyntheticStore};
use health_bridge::config::{BridgeConfig, CloudConfig};
use health_bridge::permissions::PermissionSettings;
use health_bridge::{DataType, HealthBridge, Platform, RawSample};
use std::env;
use std::sync::{Arc, Once};
use std::time::Duration as StdDuration;
use tracing::Level;

static INIT_LOGGER: Once = Once::new();

/// Redirect URI registered for the test cloud client
pub const TEST_REDIRECT_URI: &str = "com.example.health://oauth/callback";

/// Client id of the test cloud client
pub const TEST_CLIENT_ID: &str = "test-client-id";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // TEST_LOG controls the level; quiet by default
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Midnight UTC of a calendar day
pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap()
}

/// Permission settings without the post-request settle wait
pub fn instant_settings() -> PermissionSettings {
    PermissionSettings {
        settle_delay: StdDuration::ZERO,
        verify_lookback: Duration::days(7),
    }
}

/// Bridge configuration without the post-request settle wait
pub fn instant_config() -> BridgeConfig {
    BridgeConfig {
        permission_settle: StdDuration::ZERO,
        ..BridgeConfig::default()
    }
}

/// A sample shaped the way `platform` stores `data_type`
pub fn vendor_sample(
    platform: Platform,
    data_type: DataType,
    at: DateTime<Utc>,
    value: f64,
) -> RawSample {
    let binding = descriptor_for(platform).binding(data_type).unwrap();
    RawSample::new(binding.vendor_type, at.timestamp_millis())
        .with_field(binding.primary_field.unwrap_or("value"), value)
        .with_source("test-device")
}

/// One blood pressure sample using the vendor's field names
pub fn blood_pressure_sample(
    platform: Platform,
    at: DateTime<Utc>,
    systolic: f64,
    diastolic: f64,
) -> RawSample {
    let binding = descriptor_for(platform)
        .binding(DataType::BloodPressure)
        .unwrap();
    RawSample::new(binding.vendor_type, at.timestamp_millis())
        .with_field("systolic", systolic)
        .with_field("diastolic", diastolic)
}

/// One sample at noon of each of `days` consecutive days from `first`
pub fn daily_samples(
    platform: Platform,
    data_type: DataType,
    first: DateTime<Utc>,
    days: i64,
) -> Vec<RawSample> {
    (0..days)
        .map(|day| {
            let at = first + Duration::days(day) + Duration::hours(12);
            vendor_sample(platform, data_type, at, 5.0 + day as f64 / 10.0)
        })
        .collect()
}

/// Device adapter over `store` for `platform`
pub fn device_adapter(
    platform: Platform,
    store: Arc<SyntheticStore>,
) -> Arc<DeviceAdapter<SyntheticStore>> {
    Arc::new(DeviceAdapter::new(descriptor_for(platform), store))
}

/// Bridge with a single on-device platform backed by `store`
pub fn bridge_with_store(platform: Platform, store: Arc<SyntheticStore>) -> HealthBridge {
    init_test_logging();
    HealthBridge::builder()
        .config(instant_config())
        .with_device_store(platform, store)
        .build()
        .unwrap()
}

/// Cloud configuration pointing every endpoint at a mock server
pub fn cloud_config(server_uri: &str) -> CloudConfig {
    let mut config = CloudConfig::new(TEST_CLIENT_ID, TEST_REDIRECT_URI);
    config.auth_url = format!("{server_uri}/oauth2/v3/authorize");
    config.token_url = format!("{server_uri}/oauth2/v3/token");
    config.api_base_url = format!("{server_uri}/healthkit/v2");
    config
}

/// Bridge whose cloud endpoints point at a mock server
pub fn cloud_bridge(server_uri: &str) -> HealthBridge {
    init_test_logging();
    HealthBridge::builder()
        .config(BridgeConfig {
            cloud: Some(cloud_config(server_uri)),
            ..instant_config()
        })
        .build()
        .unwrap()
}
