// ABOUTME: Descriptor-driven adapter for on-device vendor SDKs over a VendorStore
// ABOUTME: Owns the vendor session handle with serialized, idempotent acquire and release
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::{
    ForegroundContext, HealthAdapter, PlatformDescriptor, TypeBinding, VendorRead, VendorStore,
};
use async_trait::async_trait;
use chrono::Duration;
use health_bridge_core::models::{OperationSet, RawSample, RawSampleSet, WriteAmount, WriteValue};
use health_bridge_core::{
    AdapterError, DataType, HealthOperation, PermissionState, Platform, QueryWindow,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Vendor session handle owned by one adapter
///
/// `acquire` and `release` serialize on the same lock, so concurrent
/// initialization opens at most one session.
pub struct ManagedSession<S: VendorStore> {
    handle: Mutex<Option<S::Session>>,
    allocations: AtomicUsize,
}

impl<S: VendorStore> Default for ManagedSession<S> {
    fn default() -> Self {
        Self {
            handle: Mutex::new(None),
            allocations: AtomicUsize::new(0),
        }
    }
}

impl<S: VendorStore> ManagedSession<S> {
    /// Return the open session, opening one if needed
    ///
    /// # Errors
    ///
    /// Returns the store's error if opening fails
    pub async fn acquire(&self, store: &S) -> Result<S::Session, AdapterError> {
        let mut guard = self.handle.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }
        let session = store.open_session().await?;
        *guard = Some(session.clone());
        self.allocations.fetch_add(1, Ordering::Relaxed);
        Ok(session)
    }

    /// The open session, if any
    pub async fn current(&self) -> Option<S::Session> {
        self.handle.lock().await.clone()
    }

    /// Close the open session; returns whether one was open
    pub async fn release(&self, store: &S) -> bool {
        let mut guard = self.handle.lock().await;
        match guard.take() {
            Some(session) => {
                store.close_session(&session).await;
                true
            }
            None => false,
        }
    }

    /// Number of sessions opened over the lifetime of this handle
    #[must_use]
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }
}

/// Adapter for any on-device platform
pub struct DeviceAdapter<S: VendorStore> {
    descriptor: &'static PlatformDescriptor,
    store: Arc<S>,
    session: ManagedSession<S>,
    max_span: Duration,
}

impl<S: VendorStore> DeviceAdapter<S> {
    /// Create an adapter for `descriptor` over `store`
    #[must_use]
    pub fn new(descriptor: &'static PlatformDescriptor, store: Arc<S>) -> Self {
        Self {
            descriptor,
            store,
            session: ManagedSession::default(),
            max_span: descriptor.max_query_span(),
        }
    }

    /// Override the platform's max query span
    #[must_use]
    pub fn with_max_span(mut self, max_span: Duration) -> Self {
        self.max_span = max_span;
        self
    }

    /// Static descriptor of the platform
    #[must_use]
    pub const fn descriptor(&self) -> &'static PlatformDescriptor {
        self.descriptor
    }

    /// Underlying vendor store
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Number of vendor sessions this adapter has opened
    #[must_use]
    pub fn session_allocations(&self) -> usize {
        self.session.allocations()
    }

    async fn open_session(&self) -> Result<S::Session, AdapterError> {
        self.session
            .current()
            .await
            .ok_or(AdapterError::NotInitialized {
                platform: self.descriptor.platform,
            })
    }

    fn binding(&self, data_type: DataType) -> Result<&'static TypeBinding, AdapterError> {
        self.descriptor
            .binding(data_type)
            .ok_or_else(|| AdapterError::Unsupported {
                platform: self.descriptor.platform,
                feature: format!("data type {data_type}"),
            })
    }

    fn sample_from_write(
        &self,
        binding: &TypeBinding,
        value: &WriteValue,
    ) -> Result<RawSample, AdapterError> {
        let platform = self.descriptor.platform;
        let mut sample = RawSample::new(binding.vendor_type, value.start.timestamp_millis());
        if let Some(end) = value.end {
            sample = sample.with_end(end.timestamp_millis());
        }

        match (&value.amount, binding.data_type.is_composite()) {
            (WriteAmount::Scalar(amount), false) => {
                let field = binding.primary_field.unwrap_or("value");
                Ok(sample.with_field(field, *amount))
            }
            (WriteAmount::Composite(components), true) => {
                for declared in binding.data_type.components() {
                    let present = components.iter().any(|(name, _)| name == declared.name);
                    if declared.required && !present {
                        return Err(AdapterError::Rejected {
                            platform,
                            message: format!(
                                "{} write is missing the '{}' component",
                                binding.data_type, declared.name
                            ),
                        });
                    }
                }
                Ok(components
                    .iter()
                    .fold(sample, |s, (name, amount)| s.with_field(name.as_str(), *amount)))
            }
            (_, composite) => Err(AdapterError::Rejected {
                platform,
                message: format!(
                    "{} expects a {} value",
                    binding.data_type,
                    if composite { "composite" } else { "scalar" }
                ),
            }),
        }
    }
}

#[async_trait]
impl<S: VendorStore> HealthAdapter for DeviceAdapter<S> {
    fn platform(&self) -> Platform {
        self.descriptor.platform
    }

    fn grant_query_reliable(&self) -> bool {
        self.descriptor.grant_query_reliable
    }

    fn max_query_span(&self) -> Duration {
        self.max_span
    }

    fn primary_field(&self, data_type: DataType) -> Option<&'static str> {
        self.descriptor.primary_field(data_type)
    }

    async fn is_available(&self) -> bool {
        let probe = self.store.probe().await;
        probe.installed
            && probe
                .version
                .is_some_and(|v| v >= self.descriptor.min_sdk_version)
    }

    async fn initialize(&self) -> Result<(), AdapterError> {
        let platform = self.descriptor.platform;
        let probe = self.store.probe().await;
        if !probe.installed {
            return Err(AdapterError::unavailable(
                platform,
                "vendor app or SDK is not installed",
            ));
        }
        match probe.version {
            Some(version) if version >= self.descriptor.min_sdk_version => {}
            Some(version) => {
                return Err(AdapterError::unavailable(
                    platform,
                    format!(
                        "version {version} is below the minimum {}",
                        self.descriptor.min_sdk_version
                    ),
                ));
            }
            None => {
                return Err(AdapterError::unavailable(
                    platform,
                    "vendor version could not be determined",
                ));
            }
        }

        let before = self.session.allocations();
        self.session.acquire(&self.store).await?;
        if self.session.allocations() > before {
            info!(platform = %platform, "Vendor session opened");
        }
        Ok(())
    }

    async fn check_permission(
        &self,
        data_type: DataType,
        operation: HealthOperation,
    ) -> Result<PermissionState, AdapterError> {
        let binding = self.binding(data_type)?;
        let session = self.open_session().await?;
        let scope = binding.scope_for(operation);
        let state = self
            .store
            .scope_states(&session)
            .await?
            .and_then(|states| states.get(&scope).copied())
            .unwrap_or_default();
        debug!(
            platform = %self.descriptor.platform,
            scope = %scope,
            state = ?state,
            "Vendor grant query"
        );
        Ok(state)
    }

    async fn request_permission(
        &self,
        context: &ForegroundContext,
        data_types: &[DataType],
        operations: OperationSet,
        reason: Option<&str>,
    ) -> Result<bool, AdapterError> {
        let session = self.open_session().await?;
        let mut scopes = Vec::new();
        for data_type in data_types {
            let binding = self.binding(*data_type)?;
            for operation in operations.operations() {
                let scope = binding.scope_for(operation);
                if !scopes.contains(&scope) {
                    scopes.push(scope);
                }
            }
        }

        info!(
            platform = %self.descriptor.platform,
            context = %context.label(),
            scopes = scopes.len(),
            "Presenting vendor consent UI"
        );
        self.store
            .request_scopes(&session, context, &scopes, reason)
            .await
    }

    async fn read_raw(
        &self,
        data_type: DataType,
        window: &QueryWindow,
    ) -> Result<RawSampleSet, AdapterError> {
        let binding = self.binding(data_type)?;
        let session = self.open_session().await?;
        let read = VendorRead {
            vendor_type: binding.vendor_type.to_owned(),
            scope: binding.scope_for(HealthOperation::Read),
            start_millis: window.start_millis(),
            end_millis: window.end_millis(),
        };
        self.store.read_samples(&session, &read).await
    }

    async fn write_raw(
        &self,
        data_type: DataType,
        value: &WriteValue,
    ) -> Result<bool, AdapterError> {
        let binding = self.binding(data_type)?;
        let sample = self.sample_from_write(binding, value)?;
        let session = self.open_session().await?;
        self.store
            .insert_sample(&session, &binding.scope_for(HealthOperation::Write), sample)
            .await
    }

    async fn cleanup(&self) {
        if self.session.release(&self.store).await {
            info!(platform = %self.descriptor.platform, "Vendor session closed");
        } else {
            debug!(
                platform = %self.descriptor.platform,
                "Cleanup called without an open session"
            );
        }
    }
}
