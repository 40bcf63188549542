// ABOUTME: Environment-based configuration for permission timing, span overrides and the cloud OAuth client
// ABOUTME: Validates every value up front and reports malformed input as a Config error
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::oauth2_client::OAuth2Config;
use crate::permissions::PermissionSettings;
use chrono::Duration;
use health_bridge_core::constants::{env_vars, oauth, timing};
use health_bridge_core::{BridgeError, BridgeResult, Platform};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;
use tracing::{debug, info};
use url::Url;

/// Cloud OAuth client settings
#[derive(Clone, PartialEq, Eq)]
pub struct CloudConfig {
    /// OAuth client id
    pub client_id: String,
    /// Secret for confidential clients
    pub client_secret: Option<String>,
    /// Redirect URI registered with the provider
    pub redirect_uri: String,
    /// Authorization endpoint
    pub auth_url: String,
    /// Token endpoint
    pub token_url: String,
    /// Health Kit REST base
    pub api_base_url: String,
    /// Scopes to request
    pub scopes: Vec<String>,
}

impl fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("redirect_uri", &self.redirect_uri)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl CloudConfig {
    /// Settings for `client_id` and `redirect_uri` against the Huawei production endpoints
    #[must_use]
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: redirect_uri.into(),
            auth_url: oauth::HUAWEI_AUTH_URL.to_owned(),
            token_url: oauth::HUAWEI_TOKEN_URL.to_owned(),
            api_base_url: oauth::HUAWEI_HEALTH_API_BASE.to_owned(),
            scopes: oauth::HUAWEI_DEFAULT_SCOPES
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }

    /// Load from the environment; `None` when no client id is set
    ///
    /// # Errors
    ///
    /// Returns `Config` if the redirect URI is missing or a URL is malformed
    pub fn from_env() -> BridgeResult<Option<Self>> {
        Self::from_source(&|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`]
    pub fn from_source(lookup: &dyn Fn(&str) -> Option<String>) -> BridgeResult<Option<Self>> {
        let Some(client_id) = non_empty(lookup(env_vars::CLOUD_CLIENT_ID)) else {
            debug!("{} not set; cloud access disabled", env_vars::CLOUD_CLIENT_ID);
            return Ok(None);
        };
        let redirect_uri = non_empty(lookup(env_vars::CLOUD_REDIRECT_URI)).ok_or_else(|| {
            BridgeError::config(format!(
                "{} is required when {} is set",
                env_vars::CLOUD_REDIRECT_URI,
                env_vars::CLOUD_CLIENT_ID
            ))
        })?;

        let mut config = Self::new(client_id, redirect_uri);
        config.client_secret = non_empty(lookup(env_vars::CLOUD_CLIENT_SECRET));
        if let Some(url) = non_empty(lookup(env_vars::CLOUD_AUTH_URL)) {
            config.auth_url = url;
        }
        if let Some(url) = non_empty(lookup(env_vars::CLOUD_TOKEN_URL)) {
            config.token_url = url;
        }
        if let Some(url) = non_empty(lookup(env_vars::CLOUD_API_BASE_URL)) {
            config.api_base_url = url;
        }
        if let Some(scopes) = non_empty(lookup(env_vars::CLOUD_SCOPES)) {
            config.scopes = parse_scopes(&scopes);
        }
        config.validate()?;
        Ok(Some(config))
    }

    /// Check that every URL parses and at least one scope is set
    ///
    /// # Errors
    ///
    /// Returns `Config` naming the first invalid value
    pub fn validate(&self) -> BridgeResult<()> {
        for (name, value) in [
            (env_vars::CLOUD_REDIRECT_URI, &self.redirect_uri),
            (env_vars::CLOUD_AUTH_URL, &self.auth_url),
            (env_vars::CLOUD_TOKEN_URL, &self.token_url),
            (env_vars::CLOUD_API_BASE_URL, &self.api_base_url),
        ] {
            Url::parse(value).map_err(|e| {
                BridgeError::config(format!("{name} '{value}' is not a valid URL: {e}"))
            })?;
        }
        if self.scopes.is_empty() {
            return Err(BridgeError::config(format!(
                "{} contains no scopes",
                env_vars::CLOUD_SCOPES
            )));
        }
        Ok(())
    }

    /// OAuth client configuration
    #[must_use]
    pub fn to_oauth2_config(&self) -> OAuth2Config {
        OAuth2Config {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            auth_url: self.auth_url.clone(),
            token_url: self.token_url.clone(),
            redirect_uri: self.redirect_uri.clone(),
            scopes: self.scopes.clone(),
        }
    }
}

/// Bridge-wide settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Wait after an interactive permission request
    pub permission_settle: StdDuration,
    /// Lookback of verification reads, in days
    pub verify_lookback_days: i64,
    /// Per-platform max span overrides, in days
    pub max_span_overrides: HashMap<Platform, i64>,
    /// Cloud client settings, if cloud access is configured
    pub cloud: Option<CloudConfig>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            permission_settle: StdDuration::from_millis(timing::DEFAULT_PERMISSION_SETTLE_MS),
            verify_lookback_days: timing::DEFAULT_VERIFY_LOOKBACK_DAYS,
            max_span_overrides: HashMap::new(),
            cloud: None,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `Config` for malformed numbers, out-of-range values or URLs
    pub fn from_env() -> BridgeResult<Self> {
        info!("Loading configuration from environment variables");
        Self::from_source(&|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`]
    pub fn from_source(lookup: &dyn Fn(&str) -> Option<String>) -> BridgeResult<Self> {
        let settle_ms: u64 = parse_or(
            lookup,
            env_vars::PERMISSION_SETTLE_MS,
            timing::DEFAULT_PERMISSION_SETTLE_MS,
        )?;
        if settle_ms > timing::MAX_PERMISSION_SETTLE_MS {
            return Err(BridgeError::config(format!(
                "{} must be at most {}, got {settle_ms}",
                env_vars::PERMISSION_SETTLE_MS,
                timing::MAX_PERMISSION_SETTLE_MS
            )));
        }

        let verify_lookback_days = check_days(
            env_vars::VERIFY_LOOKBACK_DAYS,
            parse_or(
                lookup,
                env_vars::VERIFY_LOOKBACK_DAYS,
                timing::DEFAULT_VERIFY_LOOKBACK_DAYS,
            )?,
        )?;

        let mut max_span_overrides = HashMap::new();
        for platform in Platform::ALL {
            let key = format!(
                "{}{}",
                env_vars::MAX_SPAN_DAYS_PREFIX,
                platform.key().to_ascii_uppercase()
            );
            if let Some(days) = parse_opt::<i64>(lookup, &key)? {
                max_span_overrides.insert(platform, check_days(&key, days)?);
            }
        }

        let config = Self {
            permission_settle: StdDuration::from_millis(settle_ms),
            verify_lookback_days,
            max_span_overrides,
            cloud: CloudConfig::from_source(lookup)?,
        };
        info!(
            settle_ms = settle_ms,
            verify_lookback_days = verify_lookback_days,
            overrides = config.max_span_overrides.len(),
            cloud = config.cloud.is_some(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Permission manager settings derived from this configuration
    #[must_use]
    pub fn permission_settings(&self) -> PermissionSettings {
        PermissionSettings {
            settle_delay: self.permission_settle,
            verify_lookback: bounded_days(self.verify_lookback_days),
        }
    }

    /// Max span override for `platform`
    #[must_use]
    pub fn max_span_override(&self, platform: Platform) -> Option<Duration> {
        self.max_span_overrides
            .get(&platform)
            .map(|days| bounded_days(*days))
    }
}

fn check_days(key: &str, days: i64) -> BridgeResult<i64> {
    if !(1..=timing::MAX_CONFIGURED_DAYS).contains(&days) {
        return Err(BridgeError::config(format!(
            "{key} must be between 1 and {}, got {days}",
            timing::MAX_CONFIGURED_DAYS
        )));
    }
    Ok(days)
}

// Fields are public, so values set in code bypass `check_days`
fn bounded_days(days: i64) -> Duration {
    Duration::days(days.clamp(1, timing::MAX_CONFIGURED_DAYS))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn parse_opt<T>(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> BridgeResult<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    non_empty(lookup(key))
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| BridgeError::config(format!("invalid {key} value '{raw}': {e}")))
        })
        .transpose()
}

fn parse_or<T>(lookup: &dyn Fn(&str) -> Option<String>, key: &str, default: T) -> BridgeResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}

/// Parse space- or comma-separated scopes
fn parse_scopes(scopes: &str) -> Vec<String> {
    scopes
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
