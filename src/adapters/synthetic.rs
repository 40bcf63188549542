// ABOUTME: In-memory vendor store for development, demos and tests
// ABOUTME: Configurable samples, grant behavior, failing windows and call counters
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

// RwLock poisoning is reported as a transient vendor failure

//! # Synthetic Vendor Store
//!
//! Stands in for a native SDK channel. Unlike a real vendor store it:
//!
//! - Holds samples in memory, keyed by vendor data type
//! - Lets callers choose whether grants are reportable, which scopes are
//!   denied or restricted, and whether the consent UI grants what it is asked for
//! - Fails reads overlapping configured windows with a transient error
//! - Counts sessions, reads and consent requests for assertions

use super::{ForegroundContext, VendorProbe, VendorRead, VendorStore};
use async_trait::async_trait;
use health_bridge_core::models::{RawSample, RawSampleSet};
use health_bridge_core::{AdapterError, PermissionState, Platform};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::RwLock;
use tracing::debug;

/// Session handle issued by [`SyntheticStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticSession {
    /// Sequence number of the session
    pub id: u64,
}

/// In-memory vendor store
pub struct SyntheticStore {
    platform: Platform,
    installed: bool,
    version: u32,
    reports_grants: bool,
    grant_on_request: bool,
    cancel_consent: bool,
    enforce_read_scopes: bool,
    samples: RwLock<HashMap<String, Vec<RawSample>>>,
    scope_states: RwLock<BTreeMap<String, PermissionState>>,
    failing_windows: RwLock<Vec<(i64, i64)>>,
    reads: RwLock<Vec<VendorRead>>,
    next_session: AtomicU64,
    sessions_opened: AtomicUsize,
    sessions_closed: AtomicUsize,
    consent_requests: AtomicUsize,
    inserted: AtomicUsize,
}

impl SyntheticStore {
    /// Installed, recent store that reports grants and grants every request
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            installed: true,
            version: u32::MAX,
            reports_grants: true,
            grant_on_request: true,
            cancel_consent: false,
            enforce_read_scopes: false,
            samples: RwLock::new(HashMap::new()),
            scope_states: RwLock::new(BTreeMap::new()),
            failing_windows: RwLock::new(Vec::new()),
            reads: RwLock::new(Vec::new()),
            next_session: AtomicU64::new(1),
            sessions_opened: AtomicUsize::new(0),
            sessions_closed: AtomicUsize::new(0),
            consent_requests: AtomicUsize::new(0),
            inserted: AtomicUsize::new(0),
        }
    }

    /// Report the vendor app as missing
    #[must_use]
    pub const fn uninstalled(mut self) -> Self {
        self.installed = false;
        self
    }

    /// Report a specific vendor version
    #[must_use]
    pub const fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Whether `scope_states` answers (`false` mimics SDKs that hide read grants)
    #[must_use]
    pub const fn reporting_grants(mut self, reports: bool) -> Self {
        self.reports_grants = reports;
        self
    }

    /// Whether the consent UI grants what it is asked for
    #[must_use]
    pub const fn granting_requests(mut self, grant: bool) -> Self {
        self.grant_on_request = grant;
        self
    }

    /// Whether the user dismisses the consent UI without answering
    #[must_use]
    pub const fn cancelling_consent(mut self, cancel: bool) -> Self {
        self.cancel_consent = cancel;
        self
    }

    /// Fail reads whose scope is not granted with `PermissionDenied`
    #[must_use]
    pub const fn enforcing_read_scopes(mut self, enforce: bool) -> Self {
        self.enforce_read_scopes = enforce;
        self
    }

    /// Pre-load samples
    #[must_use]
    pub fn with_samples(self, samples: impl IntoIterator<Item = RawSample>) -> Self {
        for sample in samples {
            self.add_sample(sample);
        }
        self
    }

    /// Pre-grant a scope
    #[must_use]
    pub fn with_granted(self, scope: impl Into<String>) -> Self {
        self.grant(scope);
        self
    }

    /// Pre-deny a scope
    #[must_use]
    pub fn with_denied(self, scope: impl Into<String>) -> Self {
        self.set_scope_state(scope, PermissionState::Denied);
        self
    }

    /// Block a scope by policy; the consent UI cannot grant it
    #[must_use]
    pub fn with_restricted(self, scope: impl Into<String>) -> Self {
        self.set_scope_state(scope, PermissionState::Restricted);
        self
    }

    /// Add one sample, keyed by its vendor type
    pub fn add_sample(&self, sample: RawSample) {
        if let Ok(mut samples) = self.samples.write() {
            samples
                .entry(sample.vendor_type.clone())
                .or_default()
                .push(sample);
        }
    }

    /// Grant a scope
    pub fn grant(&self, scope: impl Into<String>) {
        self.set_scope_state(scope, PermissionState::Granted);
    }

    /// Switch a scope off, as a user would in the vendor's settings
    pub fn revoke(&self, scope: &str) {
        self.set_scope_state(scope, PermissionState::Denied);
    }

    /// Set the state the vendor reports for `scope`
    pub fn set_scope_state(&self, scope: impl Into<String>, state: PermissionState) {
        if let Ok(mut states) = self.scope_states.write() {
            states.insert(scope.into(), state);
        }
    }

    /// Fail reads overlapping `[start_millis, end_millis]` with a transient error
    pub fn fail_window(&self, start_millis: i64, end_millis: i64) {
        if let Ok(mut windows) = self.failing_windows.write() {
            windows.push((start_millis, end_millis));
        }
    }

    /// Every read issued so far, in order
    #[must_use]
    pub fn reads(&self) -> Vec<VendorRead> {
        self.reads.read().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of reads issued so far
    #[must_use]
    pub fn read_calls(&self) -> usize {
        self.reads.read().map_or(0, |r| r.len())
    }

    /// Sessions opened so far
    #[must_use]
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::Relaxed)
    }

    /// Sessions closed so far
    #[must_use]
    pub fn sessions_closed(&self) -> usize {
        self.sessions_closed.load(Ordering::Relaxed)
    }

    /// Consent UI presentations so far
    #[must_use]
    pub fn consent_requests(&self) -> usize {
        self.consent_requests.load(Ordering::Relaxed)
    }

    /// Samples inserted through writes so far
    #[must_use]
    pub fn inserted(&self) -> usize {
        self.inserted.load(Ordering::Relaxed)
    }

    /// Whether `scope` is currently granted
    #[must_use]
    pub fn is_granted(&self, scope: &str) -> bool {
        self.scope_states
            .read()
            .is_ok_and(|s| s.get(scope).is_some_and(|state| state.is_granted()))
    }

    fn poisoned(&self) -> AdapterError {
        AdapterError::transient(self.platform, "synthetic store lock poisoned")
    }

    fn window_fails(&self, start_millis: i64, end_millis: i64) -> Result<bool, AdapterError> {
        let windows = self.failing_windows.read().map_err(|_| self.poisoned())?;
        Ok(windows
            .iter()
            .any(|(start, end)| *start <= end_millis && start_millis <= *end))
    }
}

#[async_trait]
impl VendorStore for SyntheticStore {
    type Session = SyntheticSession;

    async fn probe(&self) -> VendorProbe {
        VendorProbe {
            installed: self.installed,
            version: self.installed.then_some(self.version),
        }
    }

    async fn open_session(&self) -> Result<Self::Session, AdapterError> {
        if !self.installed {
            return Err(AdapterError::InitFailed {
                platform: self.platform,
                reason: "vendor store is not installed".to_owned(),
            });
        }
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
        Ok(SyntheticSession {
            id: self.next_session.fetch_add(1, Ordering::Relaxed),
        })
    }

    async fn close_session(&self, session: &Self::Session) {
        debug!(platform = %self.platform, session = session.id, "Synthetic session closed");
        self.sessions_closed.fetch_add(1, Ordering::Relaxed);
    }

    async fn scope_states(
        &self,
        _session: &Self::Session,
    ) -> Result<Option<BTreeMap<String, PermissionState>>, AdapterError> {
        if !self.reports_grants {
            return Ok(None);
        }
        let states = self.scope_states.read().map_err(|_| self.poisoned())?;
        Ok(Some(states.clone()))
    }

    async fn request_scopes(
        &self,
        _session: &Self::Session,
        _context: &ForegroundContext,
        scopes: &[String],
        _reason: Option<&str>,
    ) -> Result<bool, AdapterError> {
        self.consent_requests.fetch_add(1, Ordering::Relaxed);
        if self.cancel_consent {
            return Ok(false);
        }
        if self.grant_on_request {
            let mut states = self.scope_states.write().map_err(|_| self.poisoned())?;
            for scope in scopes {
                if states.get(scope) != Some(&PermissionState::Restricted) {
                    states.insert(scope.clone(), PermissionState::Granted);
                }
            }
        }
        Ok(true)
    }

    async fn read_samples(
        &self,
        _session: &Self::Session,
        read: &VendorRead,
    ) -> Result<RawSampleSet, AdapterError> {
        self.reads
            .write()
            .map_err(|_| self.poisoned())?
            .push(read.clone());

        if self.window_fails(read.start_millis, read.end_millis)? {
            return Err(AdapterError::transient(
                self.platform,
                format!(
                    "vendor store timed out reading [{}, {}]",
                    read.start_millis, read.end_millis
                ),
            ));
        }
        if self.enforce_read_scopes && !self.is_granted(&read.scope) {
            return Err(AdapterError::PermissionDenied {
                platform: self.platform,
                scope: read.scope.clone(),
            });
        }

        let samples = self.samples.read().map_err(|_| self.poisoned())?;
        Ok(samples
            .get(&read.vendor_type)
            .map(|all| {
                all.iter()
                    .filter(|s| (read.start_millis..=read.end_millis).contains(&s.start_millis))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_sample(
        &self,
        _session: &Self::Session,
        scope: &str,
        sample: RawSample,
    ) -> Result<bool, AdapterError> {
        if !self.is_granted(scope) {
            return Err(AdapterError::PermissionDenied {
                platform: self.platform,
                scope: scope.to_owned(),
            });
        }
        self.add_sample(sample);
        self.inserted.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }
}
