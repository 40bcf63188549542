// ABOUTME: Vendor health SDK adapter contract and the narrower vendor store boundary
// ABOUTME: One adapter per platform, built by a factory keyed on platform identity
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Vendor SDK Adapters
//!
//! Every platform is reached through [`HealthAdapter`]. On-device platforms
//! share one implementation, [`DeviceAdapter`], parameterized by a static
//! [`PlatformDescriptor`] and a [`VendorStore`] that talks to the native SDK
//! channel. The Huawei cloud variant is [`CloudAdapter`], which talks HTTPS.
//!
//! Session handles are owned by their adapter: `initialize` acquires one,
//! `cleanup` releases it, and both may be called any number of times.

/// Huawei Health Kit REST adapter
pub mod cloud;
/// Static platform descriptors
pub mod descriptor;
/// Descriptor-driven adapter over a vendor store
pub mod device;
/// In-memory vendor store
pub mod synthetic;

pub use cloud::{CloudAdapter, CloudQueryKind};
pub use descriptor::{descriptor_for, PlatformDescriptor, TypeBinding};
pub use device::{DeviceAdapter, ManagedSession};
pub use synthetic::{SyntheticSession, SyntheticStore};

use async_trait::async_trait;
use chrono::Duration;
use health_bridge_core::models::{OperationSet, RawSample, RawSampleSet, WriteValue};
use health_bridge_core::{
    AdapterError, BridgeError, BridgeResult, DataType, HealthOperation, PermissionState, Platform,
    QueryWindow,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Proof that the host has a visible UI able to present vendor consent screens
///
/// Interactive permission requests take one of these; a host running in the
/// background has none to give.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundContext {
    id: Uuid,
    label: String,
}

impl ForegroundContext {
    /// Context for the screen called `label`
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
        }
    }

    /// Unique id of this context
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Screen label supplied by the host
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Vendor app or SDK presence as reported by the native channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorProbe {
    /// Whether the vendor app or SDK is installed
    pub installed: bool,
    /// Installed version code, if known
    pub version: Option<u32>,
}

/// Read issued to a vendor store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorRead {
    /// Vendor data type identifier
    pub vendor_type: String,
    /// Vendor scope that authorizes the read
    pub scope: String,
    /// Inclusive window start (epoch millis)
    pub start_millis: i64,
    /// Inclusive window end (epoch millis)
    pub end_millis: i64,
}

/// Boundary to a vendor SDK's native channel
///
/// Hosts implement this over their platform channel; [`SyntheticStore`] is
/// the in-memory implementation.
#[async_trait]
pub trait VendorStore: Send + Sync + 'static {
    /// Handle to an open vendor session
    type Session: Clone + Send + Sync + 'static;

    /// Report vendor app or SDK presence
    async fn probe(&self) -> VendorProbe;

    /// Open a vendor session
    async fn open_session(&self) -> Result<Self::Session, AdapterError>;

    /// Close a vendor session
    async fn close_session(&self, session: &Self::Session);

    /// Reported state per scope, or `None` when the vendor cannot report grants
    ///
    /// Scopes missing from the map have never been decided.
    async fn scope_states(
        &self,
        session: &Self::Session,
    ) -> Result<Option<BTreeMap<String, PermissionState>>, AdapterError>;

    /// Show the vendor consent UI for `scopes`
    ///
    /// Returns whether the UI completed without the user cancelling it.
    async fn request_scopes(
        &self,
        session: &Self::Session,
        context: &ForegroundContext,
        scopes: &[String],
        reason: Option<&str>,
    ) -> Result<bool, AdapterError>;

    /// Read samples in one window bounded by the vendor's own limit
    async fn read_samples(
        &self,
        session: &Self::Session,
        read: &VendorRead,
    ) -> Result<RawSampleSet, AdapterError>;

    /// Insert one sample under `scope`
    async fn insert_sample(
        &self,
        session: &Self::Session,
        scope: &str,
        sample: RawSample,
    ) -> Result<bool, AdapterError>;
}

/// Contract every platform adapter implements
#[async_trait]
pub trait HealthAdapter: Send + Sync {
    /// Platform served by this adapter
    fn platform(&self) -> Platform;

    /// Whether `check_permission` reports read grants truthfully
    fn grant_query_reliable(&self) -> bool;

    /// Largest window a single `read_raw` accepts
    fn max_query_span(&self) -> Duration;

    /// Vendor field holding the primary value of `data_type`
    fn primary_field(&self, data_type: DataType) -> Option<&'static str>;

    /// Whether the vendor app or SDK is present and recent enough
    async fn is_available(&self) -> bool;

    /// Acquire the vendor session; a second call while initialized is a no-op
    async fn initialize(&self) -> Result<(), AdapterError>;

    /// Grant state as reported by the vendor
    async fn check_permission(
        &self,
        data_type: DataType,
        operation: HealthOperation,
    ) -> Result<PermissionState, AdapterError>;

    /// Present the vendor consent UI
    async fn request_permission(
        &self,
        context: &ForegroundContext,
        data_types: &[DataType],
        operations: OperationSet,
        reason: Option<&str>,
    ) -> Result<bool, AdapterError>;

    /// Read one window no wider than `max_query_span`
    async fn read_raw(
        &self,
        data_type: DataType,
        window: &QueryWindow,
    ) -> Result<RawSampleSet, AdapterError>;

    /// Write one value
    async fn write_raw(&self, data_type: DataType, value: &WriteValue)
        -> Result<bool, AdapterError>;

    /// Release the vendor session; safe to call repeatedly
    async fn cleanup(&self);
}

/// Build the adapter of an on-device platform over `store`
///
/// # Errors
///
/// Returns `AdapterUnavailable` for `huawei_cloud`, which is built from
/// cloud credentials instead of a vendor store
pub fn create_device_adapter<S: VendorStore>(
    platform: Platform,
    store: Arc<S>,
) -> BridgeResult<Arc<dyn HealthAdapter>> {
    if platform.is_cloud() {
        return Err(BridgeError::AdapterUnavailable {
            platform,
            reason: "cloud platforms are served by CloudAdapter".to_owned(),
        });
    }
    Ok(Arc::new(DeviceAdapter::new(descriptor_for(platform), store)))
}
