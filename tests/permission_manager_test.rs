// ABOUTME: Tests for the permission lifecycle manager across reliable, unreliable and cloud platforms
// ABOUTME: Covers consent requests, foreground context, verify-by-read, gating and cloud revocation
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Duration, Utc};
use common::{device_adapter, init_test_logging, instant_settings, vendor_sample};
use health_bridge::adapters::{descriptor_for, CloudAdapter, HealthAdapter, SyntheticStore};
use health_bridge::models::{GrantEvidence, OperationSet};
use health_bridge::oauth2_client::TokenStore;
use health_bridge::permissions::{ForegroundContext, PermissionManager, PermissionSettings};
use health_bridge::{
    BridgeError, DataType, ErrorCode, HealthOperation, PermissionCheck, PermissionState, Platform,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

const READ: HealthOperation = HealthOperation::Read;
const WRITE: HealthOperation = HealthOperation::Write;

fn manager(platform: Platform, store: &Arc<SyntheticStore>) -> PermissionManager {
    init_test_logging();
    let adapter: Arc<dyn HealthAdapter> = device_adapter(platform, Arc::clone(store));
    PermissionManager::new(adapter, instant_settings())
}

fn samsung() -> (Arc<SyntheticStore>, PermissionManager) {
    let store = Arc::new(SyntheticStore::new(Platform::SamsungHealth));
    let manager = manager(Platform::SamsungHealth, &store);
    (store, manager)
}

fn huawei(store: SyntheticStore) -> (Arc<SyntheticStore>, PermissionManager) {
    let store = Arc::new(store.reporting_grants(false));
    let manager = manager(Platform::HuaweiHealth, &store);
    (store, manager)
}

fn cloud_manager(tokens: &Arc<TokenStore>) -> PermissionManager {
    init_test_logging();
    let adapter: Arc<dyn HealthAdapter> = Arc::new(CloudAdapter::new(
        Client::new(),
        "http://127.0.0.1:9/healthkit/v2",
        Arc::clone(tokens),
    ));
    PermissionManager::new(adapter, instant_settings())
}

fn scope(platform: Platform, data_type: DataType, operation: HealthOperation) -> String {
    descriptor_for(platform)
        .binding(data_type)
        .unwrap()
        .scope_for(operation)
}

fn screen() -> ForegroundContext {
    ForegroundContext::new("permissions-screen")
}

// ============================================================================
// Reliable platforms
// ============================================================================

#[tokio::test]
async fn test_fresh_tuple_is_not_determined() {
    let (_store, manager) = samsung();

    let check = manager.check_permission(DataType::HeartRate, READ).await.unwrap();

    assert_eq!(check, PermissionCheck::reported(PermissionState::NotDetermined));
    assert!(manager.record(DataType::HeartRate, READ).is_none());
}

#[tokio::test]
async fn test_request_without_foreground_context_fails_before_vendor_call() {
    let (store, manager) = samsung();

    let err = manager
        .request_permissions(None, &[DataType::HeartRate], OperationSet::READ, None)
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::NoActiveContext);
    assert_eq!(store.consent_requests(), 0);
    assert_eq!(store.sessions_opened(), 0);
}

#[tokio::test]
async fn test_request_grants_every_pair() {
    let (store, manager) = samsung();
    let context = screen();

    let granted = manager
        .request_permissions(
            Some(&context),
            &[DataType::HeartRate, DataType::BloodGlucose],
            OperationSet::READ_WRITE,
            Some("Track your vitals"),
        )
        .await
        .unwrap();

    assert!(granted);
    assert_eq!(store.consent_requests(), 1);
    assert_eq!(manager.records().len(), 4);
    assert!(manager
        .records()
        .iter()
        .all(|r| r.state == PermissionState::Granted && r.evidence == GrantEvidence::Reported));

    let check = manager.check_permission(DataType::BloodGlucose, WRITE).await.unwrap();
    assert!(check.is_granted());
    manager.authorize(DataType::HeartRate, READ).await.unwrap();
}

#[tokio::test]
async fn test_refused_request_records_denial_and_blocks_reads() {
    let store = Arc::new(SyntheticStore::new(Platform::SamsungHealth).granting_requests(false));
    let manager = manager(Platform::SamsungHealth, &store);

    let granted = manager
        .request_permissions(Some(&screen()), &[DataType::Weight], OperationSet::READ, None)
        .await
        .unwrap();

    assert!(!granted);
    let record = manager.record(DataType::Weight, READ).unwrap();
    assert_eq!(record.state, PermissionState::Denied);

    let check = manager.check_permission(DataType::Weight, READ).await.unwrap();
    assert!(check.is_refused());

    let err = manager.authorize(DataType::Weight, READ).await.unwrap_err();
    assert!(matches!(
        err,
        BridgeError::NotAuthorized {
            data_type: Some(DataType::Weight),
            operation: Some(HealthOperation::Read),
            ..
        }
    ));
}

#[tokio::test]
async fn test_unsupported_pair_rejected_before_consent_ui() {
    let (store, manager) = samsung();

    let err = manager
        .request_permissions(
            Some(&screen()),
            &[DataType::HeartRate, DataType::Steps],
            OperationSet::WRITE,
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::UnsupportedOperation);
    assert_eq!(store.consent_requests(), 0);
}

#[tokio::test]
async fn test_empty_request_is_config_error() {
    let (_store, manager) = samsung();

    let err = manager
        .request_permissions(Some(&screen()), &[], OperationSet::READ, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigError);

    let err = manager
        .request_permissions(Some(&screen()), &[DataType::HeartRate], OperationSet::empty(), None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigError);
}

#[tokio::test]
async fn test_settle_delay_waits_before_requery() {
    let store = Arc::new(SyntheticStore::new(Platform::SamsungHealth));
    let adapter: Arc<dyn HealthAdapter> =
        device_adapter(Platform::SamsungHealth, Arc::clone(&store));
    let manager = PermissionManager::new(
        adapter,
        PermissionSettings {
            settle_delay: StdDuration::from_millis(50),
            ..PermissionSettings::default()
        },
    );

    let started = Instant::now();
    manager
        .request_permissions(Some(&screen()), &[DataType::HeartRate], OperationSet::READ, None)
        .await
        .unwrap();

    assert!(started.elapsed() >= StdDuration::from_millis(50));
}

#[tokio::test]
async fn test_cancelled_consent_skips_settle_delay() {
    let store = Arc::new(SyntheticStore::new(Platform::SamsungHealth).cancelling_consent(true));
    let adapter: Arc<dyn HealthAdapter> =
        device_adapter(Platform::SamsungHealth, Arc::clone(&store));
    let manager = PermissionManager::new(
        adapter,
        PermissionSettings {
            settle_delay: StdDuration::from_secs(5),
            ..PermissionSettings::default()
        },
    );

    let started = Instant::now();
    let granted = manager
        .request_permissions(Some(&screen()), &[DataType::HeartRate], OperationSet::READ, None)
        .await
        .unwrap();

    assert!(!granted);
    assert!(started.elapsed() < StdDuration::from_secs(1));
    assert_eq!(store.consent_requests(), 1);
    assert_eq!(
        manager.record(DataType::HeartRate, READ).unwrap().state,
        PermissionState::Denied
    );
}

#[tokio::test]
async fn test_vendor_reported_denial_is_recorded_without_a_request() {
    let store = Arc::new(
        SyntheticStore::new(Platform::SamsungHealth).with_denied(scope(
            Platform::SamsungHealth,
            DataType::HeartRate,
            READ,
        )),
    );
    let manager = manager(Platform::SamsungHealth, &store);

    let check = manager.check_permission(DataType::HeartRate, READ).await.unwrap();

    assert_eq!(check, PermissionCheck::reported(PermissionState::Denied));
    let record = manager.record(DataType::HeartRate, READ).unwrap();
    assert_eq!(record.state, PermissionState::Denied);
    assert_eq!(record.evidence, GrantEvidence::Reported);
    assert_eq!(store.consent_requests(), 0);
    let err = manager.authorize(DataType::HeartRate, READ).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotAuthorized);
}

#[tokio::test]
async fn test_restricted_scope_survives_consent_request() {
    let store = Arc::new(
        SyntheticStore::new(Platform::GoogleFit).with_restricted(scope(
            Platform::GoogleFit,
            DataType::Weight,
            WRITE,
        )),
    );
    let manager = manager(Platform::GoogleFit, &store);

    let check = manager.check_permission(DataType::Weight, WRITE).await.unwrap();
    assert_eq!(check, PermissionCheck::reported(PermissionState::Restricted));
    assert!(check.is_refused());

    let granted = manager
        .request_permissions(Some(&screen()), &[DataType::Weight], OperationSet::READ_WRITE, None)
        .await
        .unwrap();

    assert!(!granted);
    assert_eq!(
        manager.record(DataType::Weight, READ).unwrap().state,
        PermissionState::Granted
    );
    assert_eq!(
        manager.record(DataType::Weight, WRITE).unwrap().state,
        PermissionState::Restricted
    );
}

#[tokio::test]
async fn test_unavailable_vendor_reports_adapter_unavailable() {
    let store = Arc::new(SyntheticStore::new(Platform::SamsungHealth).uninstalled());
    let manager = manager(Platform::SamsungHealth, &store);

    let err = manager.check_permission(DataType::HeartRate, READ).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::AdapterUnavailable);
}

// ============================================================================
// Platforms that hide read grants
// ============================================================================

#[tokio::test]
async fn test_read_grant_verified_by_recent_data() {
    let recent = vendor_sample(
        Platform::HuaweiHealth,
        DataType::BloodGlucose,
        Utc::now() - Duration::hours(2),
        5.8,
    );
    let (store, manager) =
        huawei(SyntheticStore::new(Platform::HuaweiHealth).with_samples([recent]));

    let check = manager.check_permission(DataType::BloodGlucose, READ).await.unwrap();

    assert_eq!(check, PermissionCheck::VerifiedByRead { records: 1 });
    assert_eq!(store.read_calls(), 1);
    let record = manager.record(DataType::BloodGlucose, READ).unwrap();
    assert_eq!(record.state, PermissionState::Granted);
    assert_eq!(record.evidence, GrantEvidence::ReadVerified);
}

#[tokio::test]
async fn test_verification_read_spans_lookback() {
    let (store, manager) = huawei(SyntheticStore::new(Platform::HuaweiHealth));

    manager.check_permission(DataType::Weight, READ).await.unwrap();

    let reads = store.reads();
    assert_eq!(reads.len(), 1);
    let span = reads[0].end_millis - reads[0].start_millis + 1;
    assert_eq!(span, Duration::days(7).num_milliseconds());
}

#[tokio::test]
async fn test_empty_verification_read_is_not_guessed() {
    let (_store, manager) = huawei(SyntheticStore::new(Platform::HuaweiHealth));

    let check = manager.check_permission(DataType::BloodGlucose, READ).await.unwrap();

    assert_eq!(check, PermissionCheck::NoDataUnverified);
    assert!(!check.is_granted());
    assert!(!check.is_refused());
    let record = manager.record(DataType::BloodGlucose, READ).unwrap();
    assert_eq!(record.state, PermissionState::NotDetermined);
    assert_eq!(record.evidence, GrantEvidence::NoData);
}

#[tokio::test]
async fn test_empty_verification_read_keeps_verified_grant() {
    let recent = vendor_sample(
        Platform::HuaweiHealth,
        DataType::BloodGlucose,
        Utc::now() - Duration::milliseconds(100),
        5.8,
    );
    let store = Arc::new(
        SyntheticStore::new(Platform::HuaweiHealth)
            .with_samples([recent])
            .reporting_grants(false),
    );
    let adapter: Arc<dyn HealthAdapter> =
        device_adapter(Platform::HuaweiHealth, Arc::clone(&store));
    let manager = PermissionManager::new(
        adapter,
        PermissionSettings {
            settle_delay: StdDuration::ZERO,
            verify_lookback: Duration::milliseconds(300),
        },
    );

    let first = manager.check_permission(DataType::BloodGlucose, READ).await.unwrap();
    assert_eq!(first, PermissionCheck::VerifiedByRead { records: 1 });

    // The only sample has aged out of the verification window
    tokio::time::sleep(StdDuration::from_millis(400)).await;
    let second = manager.check_permission(DataType::BloodGlucose, READ).await.unwrap();

    assert_eq!(second, PermissionCheck::NoDataUnverified);
    let record = manager.record(DataType::BloodGlucose, READ).unwrap();
    assert_eq!(record.state, PermissionState::Granted);
    assert_eq!(record.evidence, GrantEvidence::ReadVerified);
}

#[tokio::test]
async fn test_empty_verification_read_keeps_refusal() {
    let (store, manager) =
        huawei(SyntheticStore::new(Platform::HuaweiHealth).cancelling_consent(true));

    let granted = manager
        .request_permissions(Some(&screen()), &[DataType::Weight], OperationSet::READ, None)
        .await
        .unwrap();
    assert!(!granted);

    let check = manager.check_permission(DataType::Weight, READ).await.unwrap();

    assert_eq!(check, PermissionCheck::NoDataUnverified);
    assert_eq!(store.read_calls(), 1);
    assert_eq!(
        manager.record(DataType::Weight, READ).unwrap().state,
        PermissionState::Denied
    );
}

#[tokio::test]
async fn test_denied_verification_read_is_a_refusal() {
    let (_store, manager) = huawei(
        SyntheticStore::new(Platform::HuaweiHealth).enforcing_read_scopes(true),
    );

    let check = manager.check_permission(DataType::Steps, READ).await.unwrap();

    assert_eq!(check, PermissionCheck::reported(PermissionState::Denied));
    assert_eq!(
        manager.record(DataType::Steps, READ).unwrap().state,
        PermissionState::Denied
    );
}

#[tokio::test]
async fn test_write_grants_are_never_verified_by_reading() {
    let (store, manager) = huawei(SyntheticStore::new(Platform::HuaweiHealth));

    let check = manager.check_permission(DataType::Weight, WRITE).await.unwrap();

    assert_eq!(check, PermissionCheck::reported(PermissionState::NotDetermined));
    assert_eq!(store.read_calls(), 0);
}

#[tokio::test]
async fn test_reads_pass_gate_where_grants_are_hidden() {
    let (_store, manager) = huawei(SyntheticStore::new(Platform::HuaweiHealth));

    manager.authorize(DataType::Steps, READ).await.unwrap();
    let err = manager.authorize(DataType::Steps, WRITE).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotAuthorized);
}

#[tokio::test]
async fn test_on_device_platforms_have_no_revocation() {
    let (_store, manager) = samsung();
    assert!(!manager.revoke_all());
    assert!(!manager.is_revoked());
}

// ============================================================================
// Cloud revocation
// ============================================================================

#[tokio::test]
async fn test_cloud_grant_follows_token_scopes() {
    let tokens = Arc::new(TokenStore::new());
    let manager = cloud_manager(&tokens);

    let check = manager.check_permission(DataType::Steps, READ).await.unwrap();
    assert_eq!(check, PermissionCheck::reported(PermissionState::NotDetermined));

    tokens.set_credentials("access-token", "client-1");
    let check = manager.check_permission(DataType::Steps, READ).await.unwrap();
    assert!(check.is_granted());
}

#[tokio::test]
async fn test_revocation_is_terminal_until_reauthorized() {
    let tokens = Arc::new(TokenStore::new());
    tokens.set_credentials("access-token", "client-1");
    let manager = cloud_manager(&tokens);
    manager.mark_authorized(&[DataType::Steps, DataType::Weight], OperationSet::READ);

    assert!(manager.revoke_all());
    assert!(manager.is_revoked());
    assert!(manager
        .records()
        .iter()
        .all(|r| r.state == PermissionState::Denied && r.evidence == GrantEvidence::Revoked));

    // The token is still present, but revocation wins
    let check = manager.check_permission(DataType::Steps, READ).await.unwrap();
    assert_eq!(check, PermissionCheck::reported(PermissionState::Denied));
    let err = manager.authorize(DataType::Steps, READ).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotAuthorized);

    manager.mark_authorized(&[DataType::Steps], OperationSet::READ);
    assert!(!manager.is_revoked());
    manager.authorize(DataType::Steps, READ).await.unwrap();
}

#[tokio::test]
async fn test_cloud_consent_ui_is_unsupported() {
    let tokens = Arc::new(TokenStore::new());
    let manager = cloud_manager(&tokens);

    let err = manager
        .request_permissions(Some(&screen()), &[DataType::Steps], OperationSet::READ, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AdapterUnavailable);
}

#[tokio::test]
async fn test_reset_clears_records_and_revocation() {
    let tokens = Arc::new(TokenStore::new());
    let manager = cloud_manager(&tokens);
    manager.mark_authorized(&[DataType::Steps], OperationSet::READ);
    manager.revoke_all();

    manager.reset();

    assert!(manager.records().is_empty());
    assert!(!manager.is_revoked());
}
