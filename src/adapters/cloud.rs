// ABOUTME: Huawei Health Kit REST adapter reading detail and daily sample sets over HTTPS
// ABOUTME: Uses the process-local cloud token; cannot present consent UI or write data
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::{descriptor::HUAWEI_CLOUD, ForegroundContext, HealthAdapter, TypeBinding};
use crate::oauth2_client::{CloudCredentials, TokenStore};
use async_trait::async_trait;
use chrono::Duration;
use health_bridge_core::constants::{cloud_paths, oauth, timing};
use health_bridge_core::models::{OperationSet, RawSample, RawSampleSet, WriteValue};
use health_bridge_core::{
    AdapterError, DataType, HealthOperation, PermissionState, Platform, QueryWindow, RawValue,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const PLATFORM: Platform = Platform::HuaweiCloud;
const NANOS_PER_MILLI: i64 = 1_000_000;

/// Cloud aggregation endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudQueryKind {
    /// Individual sample points
    Detail,
    /// One aggregated point per day
    Daily,
}

impl CloudQueryKind {
    /// Largest window the endpoint accepts per request
    #[must_use]
    pub fn max_span(self) -> Duration {
        match self {
            Self::Detail => Duration::days(timing::CLOUD_DETAIL_MAX_SPAN_DAYS),
            Self::Daily => Duration::days(timing::CLOUD_DAILY_MAX_SPAN_DAYS),
        }
    }

    const fn path(self) -> &'static str {
        match self {
            Self::Detail => cloud_paths::SAMPLE_SET_POLYMERIZE,
            Self::Daily => cloud_paths::SAMPLE_SET_DAILY_POLYMERIZE,
        }
    }
}

impl fmt::Display for CloudQueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Detail => "detail",
            Self::Daily => "daily",
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct PolymerizeResponse {
    #[serde(default)]
    group: Vec<SampleGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SampleGroup {
    #[serde(default)]
    sample_set: Vec<SampleSet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SampleSet {
    #[serde(default)]
    data_collector_id: Option<String>,
    #[serde(default)]
    sample_points: Vec<SamplePoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SamplePoint {
    start_time: i64,
    #[serde(default)]
    end_time: Option<i64>,
    #[serde(default)]
    data_type_name: Option<String>,
    #[serde(default)]
    value: Vec<PointValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointValue {
    field_name: String,
    #[serde(default)]
    integer_value: Option<i64>,
    #[serde(default)]
    long_value: Option<i64>,
    #[serde(default)]
    float_value: Option<f64>,
    #[serde(default)]
    string_value: Option<String>,
}

impl PointValue {
    fn into_raw(self) -> (String, RawValue) {
        let value = if let Some(v) = self.integer_value.or(self.long_value) {
            RawValue::Long(v)
        } else if let Some(v) = self.float_value {
            RawValue::Double(v)
        } else if let Some(v) = self.string_value {
            RawValue::Text(v)
        } else {
            RawValue::Other(Value::Null)
        };
        (self.field_name, value)
    }
}

impl SamplePoint {
    fn into_sample(self, fallback_type: &str, source: Option<&String>) -> RawSample {
        let vendor_type = self
            .data_type_name
            .unwrap_or_else(|| fallback_type.to_owned());
        let mut sample = RawSample::new(vendor_type, self.start_time / NANOS_PER_MILLI);
        if let Some(end) = self.end_time {
            sample = sample.with_end(end / NANOS_PER_MILLI);
        }
        if let Some(source) = source {
            sample = sample.with_source(source.clone());
        }
        self.value.into_iter().fold(sample, |s, v| {
            let (name, value) = v.into_raw();
            s.with_field(name, value)
        })
    }
}

/// Adapter for the Huawei Health Kit REST API
pub struct CloudAdapter {
    http: Client,
    api_base: String,
    tokens: Arc<TokenStore>,
}

impl CloudAdapter {
    /// Create an adapter against `api_base` reading tokens from `tokens`
    #[must_use]
    pub fn new(http: Client, api_base: impl Into<String>, tokens: Arc<TokenStore>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            tokens,
        }
    }

    /// Token store consulted on every request
    #[must_use]
    pub const fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    fn binding(data_type: DataType) -> Result<&'static TypeBinding, AdapterError> {
        HUAWEI_CLOUD
            .binding(data_type)
            .ok_or_else(|| AdapterError::Unsupported {
                platform: PLATFORM,
                feature: format!("data type {data_type}"),
            })
    }

    fn credentials(&self, scope: &str) -> Result<CloudCredentials, AdapterError> {
        match self.tokens.get() {
            Some(credentials) if !credentials.token.is_expired() => Ok(credentials),
            _ => Err(AdapterError::PermissionDenied {
                platform: PLATFORM,
                scope: scope.to_owned(),
            }),
        }
    }

    /// Read individual sample points in one window of at most 30 days
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` without a usable token or when the service
    /// rejects it, `Transient` on transport failures, throttling and server
    /// errors, and `Rejected` for other refusals
    pub async fn read_detail(
        &self,
        data_type: DataType,
        window: &QueryWindow,
    ) -> Result<RawSampleSet, AdapterError> {
        self.read(CloudQueryKind::Detail, data_type, window).await
    }

    /// Read through the endpoint selected by `kind`
    ///
    /// Daily reads cover the calendar days (UTC) the window touches.
    ///
    /// # Errors
    ///
    /// Same as [`Self::read_detail`]
    pub async fn read(
        &self,
        kind: CloudQueryKind,
        data_type: DataType,
        window: &QueryWindow,
    ) -> Result<RawSampleSet, AdapterError> {
        let binding = Self::binding(data_type)?;
        let scope = binding.scope_for(HealthOperation::Read);
        let credentials = self.credentials(&scope)?;

        let body = match kind {
            CloudQueryKind::Detail => json!({
                "polymerizeWith": [{ "dataTypeName": binding.vendor_type }],
                "startTime": window.start_millis(),
                "endTime": window.end_millis(),
            }),
            CloudQueryKind::Daily => json!({
                "dataTypes": [binding.vendor_type],
                "startDay": window.start().format("%Y%m%d").to_string(),
                "endDay": window.end().format("%Y%m%d").to_string(),
                "timeZone": "+0000",
            }),
        };

        let url = format!("{}{}", self.api_base, kind.path());
        debug!(
            kind = %kind,
            data_type = %data_type,
            window = %window,
            "Cloud sample set request"
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(&credentials.token.access_token)
            .header(oauth::CLIENT_ID_HEADER, &credentials.client_id)
            .json(&body)
            .send()
            .await
            .map_err(|e| AdapterError::transient(PLATFORM, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(classify_status(status, scope, &message));
        }

        let parsed: PolymerizeResponse =
            response.json().await.map_err(|e| AdapterError::Rejected {
                platform: PLATFORM,
                message: format!("invalid sample set response: {e}"),
            })?;

        Ok(parsed
            .group
            .into_iter()
            .flat_map(|group| group.sample_set)
            .flat_map(|set| {
                let source = set.data_collector_id;
                set.sample_points
                    .into_iter()
                    .map(|point| point.into_sample(binding.vendor_type, source.as_ref()))
                    .collect::<Vec<_>>()
            })
            .collect())
    }
}

fn classify_status(status: StatusCode, scope: String, message: &str) -> AdapterError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        AdapterError::PermissionDenied {
            platform: PLATFORM,
            scope,
        }
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        AdapterError::transient(PLATFORM, format!("{status}: {message}"))
    } else {
        AdapterError::Rejected {
            platform: PLATFORM,
            message: format!("{status}: {message}"),
        }
    }
}

#[async_trait]
impl HealthAdapter for CloudAdapter {
    fn platform(&self) -> Platform {
        PLATFORM
    }

    fn grant_query_reliable(&self) -> bool {
        HUAWEI_CLOUD.grant_query_reliable
    }

    fn max_query_span(&self) -> Duration {
        CloudQueryKind::Detail.max_span()
    }

    fn primary_field(&self, data_type: DataType) -> Option<&'static str> {
        HUAWEI_CLOUD.primary_field(data_type)
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn initialize(&self) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn check_permission(
        &self,
        data_type: DataType,
        operation: HealthOperation,
    ) -> Result<PermissionState, AdapterError> {
        let binding = Self::binding(data_type)?;
        if operation == HealthOperation::Write {
            return Ok(PermissionState::NotDetermined);
        }
        let Some(credentials) = self.tokens.get() else {
            return Ok(PermissionState::NotDetermined);
        };
        let wanted = binding.scope_for(HealthOperation::Read);
        Ok(match credentials.token.scopes() {
            None => PermissionState::Granted,
            Some(scopes) if scopes.contains(&wanted.as_str()) => PermissionState::Granted,
            Some(_) => PermissionState::Denied,
        })
    }

    async fn request_permission(
        &self,
        _context: &ForegroundContext,
        _data_types: &[DataType],
        _operations: OperationSet,
        _reason: Option<&str>,
    ) -> Result<bool, AdapterError> {
        Err(AdapterError::Unsupported {
            platform: PLATFORM,
            feature: "interactive consent; use the cloud authorization flow".to_owned(),
        })
    }

    async fn read_raw(
        &self,
        data_type: DataType,
        window: &QueryWindow,
    ) -> Result<RawSampleSet, AdapterError> {
        self.read_detail(data_type, window).await
    }

    async fn write_raw(
        &self,
        _data_type: DataType,
        _value: &WriteValue,
    ) -> Result<bool, AdapterError> {
        Err(AdapterError::Unsupported {
            platform: PLATFORM,
            feature: "writes".to_owned(),
        })
    }

    async fn cleanup(&self) {}
}
