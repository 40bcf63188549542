// ABOUTME: Permission lifecycle manager tracking grant state per platform, data type and operation
// ABOUTME: Verifies read grants by reading where vendors cannot report them, and handles cloud revocation
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Permission Lifecycle
//!
//! Each (platform, data type, operation) tuple moves from `not_determined` to
//! `granted`, `denied` or `restricted`. Records are created lazily.
//!
//! Two platforms (Apple `HealthKit`, Huawei on-device) hide read grants. For
//! those a narrow read over a recent window stands in for the grant query: a
//! returned record proves the grant, while an empty result is surfaced as
//! [`PermissionCheck::NoDataUnverified`] rather than guessed at.
//!
//! The settle wait after an interactive request is a heuristic. Vendor
//! consent screens may report completion before the grant is queryable.

pub use crate::adapters::ForegroundContext;

use crate::adapters::HealthAdapter;
use crate::capabilities;
use crate::logging::BridgeLogger;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use health_bridge_core::constants::timing;
use health_bridge_core::models::{GrantEvidence, OperationSet, PermissionKey, PermissionRecord};
use health_bridge_core::{
    BridgeError, BridgeResult, DataType, HealthOperation, PermissionCheck, PermissionState,
    Platform, QueryWindow,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};

/// Tunables of the permission lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionSettings {
    /// Wait after an interactive request before re-querying grant state
    pub settle_delay: StdDuration,
    /// Window of the verification read
    pub verify_lookback: Duration,
}

impl Default for PermissionSettings {
    fn default() -> Self {
        Self {
            settle_delay: StdDuration::from_millis(timing::DEFAULT_PERMISSION_SETTLE_MS),
            verify_lookback: Duration::days(timing::DEFAULT_VERIFY_LOOKBACK_DAYS),
        }
    }
}

/// Owner of one platform's permission records
pub struct PermissionManager {
    platform: Platform,
    adapter: Arc<dyn HealthAdapter>,
    records: DashMap<PermissionKey, PermissionRecord>,
    revoked: AtomicBool,
    settings: PermissionSettings,
}

impl PermissionManager {
    /// Manage permissions of `adapter`'s platform
    #[must_use]
    pub fn new(adapter: Arc<dyn HealthAdapter>, settings: PermissionSettings) -> Self {
        Self {
            platform: adapter.platform(),
            adapter,
            records: DashMap::new(),
            revoked: AtomicBool::new(false),
            settings,
        }
    }

    /// Platform whose records this manager owns
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Settings in effect
    #[must_use]
    pub const fn settings(&self) -> &PermissionSettings {
        &self.settings
    }

    /// Whether cloud consent was revoked and not yet re-granted
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::Acquire)
    }

    /// Recorded state of one tuple
    #[must_use]
    pub fn record(
        &self,
        data_type: DataType,
        operation: HealthOperation,
    ) -> Option<PermissionRecord> {
        self.records
            .get(&PermissionKey::new(self.platform, data_type, operation))
            .map(|r| r.value().clone())
    }

    /// Every record, ordered by data type then operation
    #[must_use]
    pub fn records(&self) -> Vec<PermissionRecord> {
        let mut records: Vec<PermissionRecord> =
            self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|r| r.key);
        records
    }

    fn set(
        &self,
        data_type: DataType,
        operation: HealthOperation,
        state: PermissionState,
        evidence: GrantEvidence,
    ) {
        let key = PermissionKey::new(self.platform, data_type, operation);
        let previous = self.records.insert(
            key,
            PermissionRecord {
                key,
                state,
                evidence,
                updated_at: Utc::now(),
            },
        );
        if previous.is_none_or(|p| p.state != state) {
            BridgeLogger::log_permission_event(
                self.platform,
                data_type,
                operation,
                "transition",
                &format!("{state:?}"),
            );
        }
    }

    fn recorded_state(&self, data_type: DataType, operation: HealthOperation) -> PermissionState {
        self.record(data_type, operation)
            .map_or(PermissionState::NotDetermined, |r| r.state)
    }

    /// Current grant state of one tuple
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` for tuples the platform does not offer,
    /// `AdapterUnavailable` if the adapter cannot initialize, and adapter
    /// errors other than a permission refusal
    pub async fn check_permission(
        &self,
        data_type: DataType,
        operation: HealthOperation,
    ) -> BridgeResult<PermissionCheck> {
        capabilities::ensure_supported(self.platform, data_type, operation)?;
        if self.is_revoked() {
            return Ok(PermissionCheck::reported(PermissionState::Denied));
        }
        self.adapter.initialize().await?;

        let state = match self.adapter.check_permission(data_type, operation).await {
            Ok(state) => state,
            Err(e) if e.is_permission_denied() => PermissionState::Denied,
            Err(e) => return Err(e.into()),
        };
        if state != PermissionState::NotDetermined {
            self.set(data_type, operation, state, GrantEvidence::Reported);
            return Ok(PermissionCheck::reported(state));
        }

        if self.adapter.grant_query_reliable() || operation == HealthOperation::Write {
            let prior = self.recorded_state(data_type, operation);
            let state = if prior.is_refused() {
                prior
            } else {
                PermissionState::NotDetermined
            };
            return Ok(PermissionCheck::reported(state));
        }

        self.verify_by_read(data_type).await
    }

    async fn verify_by_read(&self, data_type: DataType) -> BridgeResult<PermissionCheck> {
        let lookback = self.settings.verify_lookback.min(self.adapter.max_query_span());
        let window = QueryWindow::trailing(Utc::now(), lookback)?;
        debug!(
            platform = %self.platform,
            data_type = %data_type,
            window = %window,
            "Verifying read grant by reading"
        );

        match self.adapter.read_raw(data_type, &window).await {
            Ok(samples) if samples.is_empty() => {
                // An empty window says nothing about the grant; keep decisive records.
                if self.recorded_state(data_type, HealthOperation::Read)
                    == PermissionState::NotDetermined
                {
                    self.set(
                        data_type,
                        HealthOperation::Read,
                        PermissionState::NotDetermined,
                        GrantEvidence::NoData,
                    );
                }
                Ok(PermissionCheck::NoDataUnverified)
            }
            Ok(samples) => {
                self.set(
                    data_type,
                    HealthOperation::Read,
                    PermissionState::Granted,
                    GrantEvidence::ReadVerified,
                );
                Ok(PermissionCheck::VerifiedByRead {
                    records: samples.len(),
                })
            }
            Err(e) if e.is_permission_denied() => {
                self.set(
                    data_type,
                    HealthOperation::Read,
                    PermissionState::Denied,
                    GrantEvidence::Reported,
                );
                Ok(PermissionCheck::reported(PermissionState::Denied))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Present the vendor consent UI for every (type, operation) pair
    ///
    /// All pairs are validated against the capability registry before any
    /// vendor call. Returns whether the UI completed and no pair ended up
    /// refused.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` for any unsupported pair,
    /// `NoActiveContext` when `context` is `None`, and adapter errors
    pub async fn request_permissions(
        &self,
        context: Option<&ForegroundContext>,
        data_types: &[DataType],
        operations: OperationSet,
        reason: Option<&str>,
    ) -> BridgeResult<bool> {
        if data_types.is_empty() || operations.is_empty() {
            return Err(BridgeError::config(
                "request_permissions needs at least one data type and one operation",
            ));
        }
        for data_type in data_types {
            for operation in operations.operations() {
                capabilities::ensure_supported(self.platform, *data_type, operation)?;
            }
            if capabilities::requires_special_permission(self.platform, *data_type) {
                info!(
                    platform = %self.platform,
                    data_type = %data_type,
                    "Data type requires special vendor approval before it can be granted"
                );
            }
        }

        let context = context.ok_or_else(|| BridgeError::NoActiveContext {
            operation: "request_permissions".to_owned(),
        })?;

        self.adapter.initialize().await?;
        let accepted = self
            .adapter
            .request_permission(context, data_types, operations, reason)
            .await?;

        if accepted && !self.settings.settle_delay.is_zero() {
            tokio::time::sleep(self.settings.settle_delay).await;
        }
        if accepted {
            self.revoked.store(false, Ordering::Release);
        }

        let reliable = self.adapter.grant_query_reliable();
        let mut all_granted = accepted;
        for data_type in data_types {
            for operation in operations.operations() {
                let reported = match self.adapter.check_permission(*data_type, operation).await {
                    Ok(state) => state,
                    Err(e) if e.is_permission_denied() => PermissionState::Denied,
                    Err(e) => return Err(e.into()),
                };
                let state = match reported {
                    PermissionState::NotDetermined if reliable || !accepted => {
                        PermissionState::Denied
                    }
                    other => other,
                };
                if state.is_refused() {
                    all_granted = false;
                }
                self.set(*data_type, operation, state, GrantEvidence::Reported);
            }
        }

        info!(
            platform = %self.platform,
            accepted = accepted,
            granted = all_granted,
            "Permission request completed"
        );
        Ok(all_granted)
    }

    /// Gate used before reads and writes
    ///
    /// A tuple with no decisive record passes on platforms that cannot report
    /// read grants: the read itself is the verification there.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` or `NotAuthorized`
    pub async fn authorize(
        &self,
        data_type: DataType,
        operation: HealthOperation,
    ) -> BridgeResult<()> {
        capabilities::ensure_supported(self.platform, data_type, operation)?;
        if self.is_revoked() {
            return Err(BridgeError::NotAuthorized {
                platform: self.platform,
                data_type: Some(data_type),
                operation: Some(operation),
                reason: "consent was revoked; call request_permissions to authorize again"
                    .to_owned(),
            });
        }

        match self.recorded_state(data_type, operation) {
            PermissionState::Granted => return Ok(()),
            state if state.is_refused() => {
                return Err(BridgeError::not_authorized(
                    self.platform,
                    data_type,
                    operation,
                ));
            }
            _ => {}
        }
        if !self.adapter.grant_query_reliable() && operation == HealthOperation::Read {
            return Ok(());
        }

        self.adapter.initialize().await?;
        match self.adapter.check_permission(data_type, operation).await {
            Ok(PermissionState::Granted) => {
                self.set(
                    data_type,
                    operation,
                    PermissionState::Granted,
                    GrantEvidence::Reported,
                );
                Ok(())
            }
            Ok(_) => Err(BridgeError::not_authorized(self.platform, data_type, operation)),
            Err(e) if e.is_permission_denied() => {
                Err(BridgeError::not_authorized(self.platform, data_type, operation))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Record grants obtained outside the vendor consent UI
    ///
    /// Used when a cloud token is installed; lifts any revocation.
    pub fn mark_authorized(&self, data_types: &[DataType], operations: OperationSet) {
        self.revoked.store(false, Ordering::Release);
        for data_type in data_types {
            for operation in operations.operations() {
                self.set(
                    *data_type,
                    operation,
                    PermissionState::Granted,
                    GrantEvidence::Reported,
                );
            }
        }
    }

    /// Invalidate every record after the cloud consent was revoked
    ///
    /// Terminal until a later request or token exchange succeeds. Returns
    /// `false` on on-device platforms, which have no revocation.
    pub fn revoke_all(&self) -> bool {
        if !self.platform.is_cloud() {
            warn!(platform = %self.platform, "Revocation is only tracked for cloud platforms");
            return false;
        }
        self.revoked.store(true, Ordering::Release);
        let now = Utc::now();
        for mut record in self.records.iter_mut() {
            record.state = PermissionState::Denied;
            record.evidence = GrantEvidence::Revoked;
            record.updated_at = now;
        }
        info!(platform = %self.platform, "All permission records revoked");
        true
    }

    /// Drop every record and any revocation
    pub fn reset(&self) {
        self.records.clear();
        self.revoked.store(false, Ordering::Release);
        debug!(platform = %self.platform, "Permission records cleared");
    }
}
