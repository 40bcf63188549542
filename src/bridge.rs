// ABOUTME: Host-facing HealthBridge tying adapters, permissions, the query planner and the cloud client together
// ABOUTME: Validates capability and range before any I/O and keeps per-entry outcomes for batch writes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Health Bridge
//!
//! One [`HealthBridge`] serves every registered platform. On-device platforms
//! are registered with a [`VendorStore`] or a ready-made adapter; the Huawei
//! cloud platform is always present and becomes usable once a token is
//! installed, either through the PKCE flow or `set_cloud_credentials`.

use crate::adapters::{
    descriptor_for, CloudAdapter, CloudQueryKind, DeviceAdapter, ForegroundContext, HealthAdapter,
    VendorStore,
};
use crate::capabilities;
use crate::config::BridgeConfig;
use crate::oauth2_client::{
    AuthorizationFlow, AuthorizationRequest, CallbackDisposition, ConsentClient, OAuth2Client,
    PrivacyAuthStatus, TokenStore, UserConsents,
};
use crate::permissions::PermissionManager;
use crate::query::{self, CloudQuery, QueryOutcome};
use crate::utils::http_client::{api_client, oauth_client};
use chrono::{DateTime, Utc};
use health_bridge_core::constants::oauth;
use health_bridge_core::models::{OperationSet, PermissionRecord, WriteValue};
use health_bridge_core::{
    BridgeError, BridgeResult, DataType, HealthOperation, PermissionCheck, Platform, QueryWindow,
};
use reqwest::Client;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Per-entry results of a batch write
#[derive(Debug, Clone, Default)]
pub struct WriteOutcome {
    /// Result of each submitted data type
    pub entries: BTreeMap<DataType, Result<bool, BridgeError>>,
}

impl WriteOutcome {
    /// Whether every entry was written
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.entries.values().all(|r| matches!(r, Ok(true)))
    }

    /// Entries that failed with an error
    pub fn failures(&self) -> impl Iterator<Item = (&DataType, &BridgeError)> {
        self.entries
            .iter()
            .filter_map(|(t, r)| r.as_ref().err().map(|e| (t, e)))
    }
}

struct PlatformHandle {
    adapter: Arc<dyn HealthAdapter>,
    permissions: PermissionManager,
}

struct CloudSession {
    tokens: Arc<TokenStore>,
    adapter: Arc<CloudAdapter>,
    consent: ConsentClient,
    flow: Option<AuthorizationFlow>,
}

/// Builder for [`HealthBridge`]
pub struct HealthBridgeBuilder {
    config: BridgeConfig,
    adapters: Vec<Arc<dyn HealthAdapter>>,
    http: Option<Client>,
}

impl HealthBridgeBuilder {
    /// Use `config` instead of the defaults
    #[must_use]
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an on-device platform backed by `store`
    ///
    /// A max span override from the configuration applies.
    #[must_use]
    pub fn with_device_store<S: VendorStore>(self, platform: Platform, store: Arc<S>) -> Self {
        let mut adapter = DeviceAdapter::new(descriptor_for(platform), store);
        if let Some(span) = self.config.max_span_override(platform) {
            adapter = adapter.with_max_span(span);
        }
        self.with_adapter(Arc::new(adapter))
    }

    /// Register a ready-made adapter, replacing any for the same platform
    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn HealthAdapter>) -> Self {
        self.adapters.retain(|a| a.platform() != adapter.platform());
        self.adapters.push(adapter);
        self
    }

    /// Send cloud requests through `client`
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Build the bridge
    ///
    /// # Errors
    ///
    /// Returns `Config` if an adapter was registered for `huawei_cloud`, or if
    /// the cloud configuration is invalid
    pub fn build(self) -> BridgeResult<HealthBridge> {
        let settings = self.config.permission_settings();
        let mut platforms = HashMap::new();
        for adapter in self.adapters {
            let platform = adapter.platform();
            if platform.is_cloud() {
                return Err(BridgeError::config(
                    "huawei_cloud is served by the built-in cloud adapter",
                ));
            }
            platforms.insert(
                platform,
                PlatformHandle {
                    permissions: PermissionManager::new(Arc::clone(&adapter), settings),
                    adapter,
                },
            );
        }

        let tokens = Arc::new(TokenStore::new());
        let api_http = self.http.clone().unwrap_or_else(api_client);
        let api_base = self
            .config
            .cloud
            .as_ref()
            .map_or(oauth::HUAWEI_HEALTH_API_BASE, |c| c.api_base_url.as_str())
            .to_owned();
        let cloud_adapter = Arc::new(CloudAdapter::new(
            api_http.clone(),
            api_base.clone(),
            Arc::clone(&tokens),
        ));

        let flow = match &self.config.cloud {
            Some(cloud) => {
                cloud.validate()?;
                let client = OAuth2Client::with_http_client(
                    cloud.to_oauth2_config(),
                    self.http.unwrap_or_else(oauth_client),
                );
                Some(AuthorizationFlow::new(Arc::new(client), Arc::clone(&tokens)))
            }
            None => None,
        };

        let cloud_dyn: Arc<dyn HealthAdapter> = cloud_adapter.clone();
        platforms.insert(
            Platform::HuaweiCloud,
            PlatformHandle {
                permissions: PermissionManager::new(Arc::clone(&cloud_dyn), settings),
                adapter: cloud_dyn,
            },
        );

        info!(
            platforms = platforms.len(),
            cloud_flow = flow.is_some(),
            "Health bridge ready"
        );
        Ok(HealthBridge {
            platforms,
            cloud: CloudSession {
                consent: ConsentClient::new(api_http, api_base, Arc::clone(&tokens)),
                tokens,
                adapter: cloud_adapter,
                flow,
            },
            config: self.config,
        })
    }
}

/// Host application API
pub struct HealthBridge {
    platforms: HashMap<Platform, PlatformHandle>,
    cloud: CloudSession,
    config: BridgeConfig,
}

impl HealthBridge {
    /// Start building a bridge
    #[must_use]
    pub fn builder() -> HealthBridgeBuilder {
        HealthBridgeBuilder {
            config: BridgeConfig::default(),
            adapters: Vec::new(),
            http: None,
        }
    }

    /// Configuration in effect
    #[must_use]
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Registered platforms, cloud included
    #[must_use]
    pub fn platforms(&self) -> BTreeSet<Platform> {
        self.platforms.keys().copied().collect()
    }

    fn handle(&self, platform: Platform) -> BridgeResult<&PlatformHandle> {
        self.platforms
            .get(&platform)
            .ok_or_else(|| BridgeError::AdapterUnavailable {
                platform,
                reason: "no adapter is registered for this platform".to_owned(),
            })
    }

    /// Whether the platform's vendor app or SDK is usable
    pub async fn is_available(&self, platform: Platform) -> bool {
        match self.handle(platform) {
            Ok(handle) => handle.adapter.is_available().await,
            Err(_) => false,
        }
    }

    /// Open the platform's vendor session; repeated calls are no-ops
    ///
    /// # Errors
    ///
    /// Returns `AdapterUnavailable` if the vendor SDK is missing, too old or
    /// fails to open a session
    pub async fn initialize(&self, platform: Platform) -> BridgeResult<()> {
        self.handle(platform)?.adapter.initialize().await?;
        Ok(())
    }

    /// Release the platform's vendor session
    pub async fn cleanup(&self, platform: Platform) {
        if let Ok(handle) = self.handle(platform) {
            handle.adapter.cleanup().await;
        }
    }

    /// Grant state of `data_types` for `operation`
    ///
    /// Every type is validated before any vendor call.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` for any unsupported type, or the first
    /// adapter failure
    pub async fn check_permissions(
        &self,
        platform: Platform,
        data_types: &[DataType],
        operation: HealthOperation,
    ) -> BridgeResult<BTreeMap<DataType, PermissionCheck>> {
        for data_type in data_types {
            capabilities::ensure_supported(platform, *data_type, operation)?;
        }
        let handle = self.handle(platform)?;
        let mut checks = BTreeMap::new();
        for data_type in data_types {
            let check = handle
                .permissions
                .check_permission(*data_type, operation)
                .await?;
            checks.insert(*data_type, check);
        }
        Ok(checks)
    }

    /// Present the vendor consent UI
    ///
    /// `context` must be the foreground screen; a background host passes
    /// `None` and gets `NoActiveContext`. The cloud platform is authorized
    /// through [`Self::begin_cloud_authorization`] instead.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation`, `NoActiveContext` or adapter failures
    pub async fn request_permissions(
        &self,
        platform: Platform,
        data_types: &[DataType],
        operations: OperationSet,
        reason: Option<&str>,
        context: Option<&ForegroundContext>,
    ) -> BridgeResult<bool> {
        self.handle(platform)?
            .permissions
            .request_permissions(context, data_types, operations, reason)
            .await
    }

    /// Read `data_type` over `[start, end]`
    ///
    /// # Errors
    ///
    /// See [`Self::read_health_data_cancellable`]
    pub async fn read_health_data(
        &self,
        platform: Platform,
        data_type: DataType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: Option<usize>,
    ) -> BridgeResult<QueryOutcome> {
        self.read_health_data_cancellable(
            platform,
            data_type,
            start,
            end,
            limit,
            &CancellationToken::new(),
        )
        .await
    }

    /// Read `data_type` over `[start, end]`, stopping early when `cancel` fires
    ///
    /// An empty outcome means "no data"; a refused grant is an error.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` or `UnsupportedOperation` before any I/O, then
    /// `AdapterUnavailable`, `NotAuthorized`, or a non-transient adapter error
    /// raised before any reading was merged
    pub async fn read_health_data_cancellable(
        &self,
        platform: Platform,
        data_type: DataType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: Option<usize>,
        cancel: &CancellationToken,
    ) -> BridgeResult<QueryOutcome> {
        let window = QueryWindow::new(start, end)?;
        capabilities::ensure_supported(platform, data_type, HealthOperation::Read)?;
        let handle = self.handle(platform)?;
        handle.adapter.initialize().await?;
        handle
            .permissions
            .authorize(data_type, HealthOperation::Read)
            .await?;
        query::execute(handle.adapter.as_ref(), data_type, &window, limit, cancel).await
    }

    /// Write several values, keeping one outcome per data type
    ///
    /// Every type is validated before anything is written.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` for any unwritable type and
    /// `AdapterUnavailable` if the session cannot be opened; per-entry
    /// failures are in the outcome
    pub async fn write_health_data(
        &self,
        platform: Platform,
        values: BTreeMap<DataType, WriteValue>,
    ) -> BridgeResult<WriteOutcome> {
        for data_type in values.keys() {
            capabilities::ensure_supported(platform, *data_type, HealthOperation::Write)?;
        }
        let handle = self.handle(platform)?;
        handle.adapter.initialize().await?;

        let mut outcome = WriteOutcome::default();
        for (data_type, value) in values {
            let result = match handle
                .permissions
                .authorize(data_type, HealthOperation::Write)
                .await
            {
                Ok(()) => handle
                    .adapter
                    .write_raw(data_type, &value)
                    .await
                    .map_err(BridgeError::from),
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                warn!(platform = %platform, data_type = %data_type, error = %e, "Write failed");
            }
            outcome.entries.insert(data_type, result);
        }
        Ok(outcome)
    }

    fn cloud_permissions(&self) -> BridgeResult<&PermissionManager> {
        Ok(&self.handle(Platform::HuaweiCloud)?.permissions)
    }

    fn cloud_read_types() -> Vec<DataType> {
        capabilities::supported_types(Platform::HuaweiCloud, Some(HealthOperation::Read))
            .into_iter()
            .collect()
    }

    /// Install a cloud token obtained outside the PKCE flow
    ///
    /// Every cloud-readable type is considered granted afterwards.
    pub fn set_cloud_credentials(
        &self,
        access_token: impl Into<String>,
        client_id: impl Into<String>,
    ) {
        self.cloud.tokens.set_credentials(access_token, client_id);
        self.cloud.consent.reset();
        if let Ok(permissions) = self.cloud_permissions() {
            permissions.mark_authorized(&Self::cloud_read_types(), OperationSet::READ);
        }
        info!("Cloud credentials installed");
    }

    /// Read from the cloud detail or daily endpoint
    ///
    /// Daily queries cover whole UTC days from the start date to the end date.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange`, `UnsupportedOperation`, `NotAuthorized` when
    /// no token is installed or consent was revoked, or a non-transient
    /// endpoint failure raised before any reading was merged
    pub async fn read_cloud_health_data(
        &self,
        data_type: DataType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        kind: CloudQueryKind,
    ) -> BridgeResult<QueryOutcome> {
        let mut window = QueryWindow::new(start, end)?;
        capabilities::ensure_supported(Platform::HuaweiCloud, data_type, HealthOperation::Read)?;
        if !self.cloud.tokens.has_token() {
            return Err(BridgeError::NotAuthorized {
                platform: Platform::HuaweiCloud,
                data_type: Some(data_type),
                operation: Some(HealthOperation::Read),
                reason: "no cloud access token; complete the cloud authorization \
                         or call set_cloud_credentials"
                    .to_owned(),
            });
        }
        self.cloud_permissions()?
            .authorize(data_type, HealthOperation::Read)
            .await?;
        self.refresh_if_expiring().await;

        if kind == CloudQueryKind::Daily {
            window = QueryWindow::from_days(start.date_naive(), end.date_naive())?;
        }
        let source = CloudQuery::new(Arc::clone(&self.cloud.adapter), kind);
        query::execute(&source, data_type, &window, None, &CancellationToken::new()).await
    }

    fn flow(&self) -> BridgeResult<&AuthorizationFlow> {
        self.cloud.flow.as_ref().ok_or_else(|| {
            BridgeError::config("cloud OAuth client is not configured; set HUAWEI_CLOUD_CLIENT_ID")
        })
    }

    /// Start a PKCE authorization; open the returned URL in a browser
    ///
    /// # Errors
    ///
    /// Returns `Config` when no cloud client is configured
    pub fn begin_cloud_authorization(&self) -> BridgeResult<AuthorizationRequest> {
        Ok(self.flow()?.begin()?)
    }

    /// Classify a URL the host's web view is about to load
    #[must_use]
    pub fn intercept_cloud_callback(&self, url: &str) -> CallbackDisposition {
        self.cloud
            .flow
            .as_ref()
            .map_or(CallbackDisposition::NotCallback, |flow| flow.intercept(url))
    }

    /// Complete the authorization from the redirect URL
    ///
    /// Returns the cloud data types the new token grants. A token without a
    /// scope list grants every cloud-readable type.
    ///
    /// # Errors
    ///
    /// Returns `Config` when no cloud client is configured, or the `OAuth`
    /// error of the callback or token exchange
    pub async fn handle_cloud_callback(&self, url: &str) -> BridgeResult<BTreeSet<DataType>> {
        let token = self.flow()?.handle_callback(url).await?;
        let descriptor = descriptor_for(Platform::HuaweiCloud);
        let granted: BTreeSet<DataType> = match token.scopes() {
            Some(scopes) => Self::cloud_read_types()
                .into_iter()
                .filter(|t| {
                    descriptor.binding(*t).is_some_and(|b| {
                        scopes.contains(&b.scope_for(HealthOperation::Read).as_str())
                    })
                })
                .collect(),
            None => Self::cloud_read_types().into_iter().collect(),
        };

        self.cloud.consent.reset();
        let permissions = self.cloud_permissions()?;
        permissions.reset();
        let granted_types: Vec<DataType> = granted.iter().copied().collect();
        permissions.mark_authorized(&granted_types, OperationSet::READ);
        info!(granted = granted.len(), "Cloud authorization completed");
        Ok(granted)
    }

    // A failed refresh leaves the current token in place; it may still be valid.
    async fn refresh_if_expiring(&self) {
        let expiring = self
            .cloud
            .tokens
            .get()
            .is_some_and(|c| c.token.will_expire_soon() && c.token.refresh_token.is_some());
        if !expiring || self.flow().is_err() {
            return;
        }
        debug!("Cloud token expires soon; refreshing before the read");
        if let Err(e) = self.refresh_cloud_token().await {
            warn!(error = %e, "Cloud token refresh failed; reading with the current token");
        }
    }

    /// Exchange the stored refresh token for a new access token
    ///
    /// # Errors
    ///
    /// Returns `Config` without a cloud client, `NotAuthorized` without a
    /// refresh token, or the token endpoint's `OAuth` error
    pub async fn refresh_cloud_token(&self) -> BridgeResult<()> {
        let flow = self.flow()?;
        let refresh = self
            .cloud
            .tokens
            .get()
            .and_then(|c| c.token.refresh_token)
            .ok_or_else(|| {
                BridgeError::not_authorized_for(
                    Platform::HuaweiCloud,
                    "no refresh token; complete the cloud authorization again",
                )
            })?;
        let token = flow.client().refresh_token(&refresh).await?;
        if !self.cloud.tokens.replace_token(token) {
            warn!("Cloud tokens were cleared during refresh; new token discarded");
        }
        Ok(())
    }

    /// Privacy authorization status of the cloud user
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized` without a token, `ExternalService` otherwise
    pub async fn check_privacy_auth_status(&self) -> BridgeResult<PrivacyAuthStatus> {
        self.cloud.consent.check_privacy_auth_status().await
    }

    /// Scopes the cloud user consented to
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized` when the user has not authorized the app or
    /// no scope is consented
    pub async fn get_user_consents(&self) -> BridgeResult<UserConsents> {
        self.cloud.consent.get_user_consents().await
    }

    /// Revoke cloud consent; local tokens are gone when this returns `Ok`
    ///
    /// # Errors
    ///
    /// Returns the consent endpoint's failure; nothing is revoked locally then
    pub async fn revoke_consent(&self, delete_data_immediately: bool) -> BridgeResult<()> {
        self.cloud
            .consent
            .revoke_consent(delete_data_immediately)
            .await?;
        self.cloud_permissions()?.revoke_all();
        if let Some(flow) = &self.cloud.flow {
            flow.reset();
        }
        Ok(())
    }

    /// Permission records of `platform`
    #[must_use]
    pub fn permission_records(&self, platform: Platform) -> Vec<PermissionRecord> {
        self.handle(platform)
            .map(|h| h.permissions.records())
            .unwrap_or_default()
    }

    /// Release every session and forget every grant and token
    pub async fn logout(&self) {
        for handle in self.platforms.values() {
            handle.adapter.cleanup().await;
            handle.permissions.reset();
        }
        self.cloud.tokens.clear();
        self.cloud.consent.reset();
        if let Some(flow) = &self.cloud.flow {
            flow.reset();
        }
        info!("Logged out of every platform");
    }
}
