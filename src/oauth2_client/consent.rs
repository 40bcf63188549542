// ABOUTME: Privacy authorization status, user consent listing and consent revocation calls
// ABOUTME: A successful revocation discards local tokens before returning
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::{CloudCredentials, TokenStore};
use health_bridge_core::constants::{cloud_paths, oauth};
use health_bridge_core::{BridgeError, BridgeResult, Platform};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Whether the user has authorized the app to use their health data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrivacyAuthStatus {
    /// Authorized
    Authorized,
    /// Not (or no longer) authorized
    NotAuthorized,
    /// The account cannot use the health service (region, age)
    NotEligibleUser,
}

impl PrivacyAuthStatus {
    /// Map the service's numeric status
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Authorized,
            3 => Self::NotEligibleUser,
            _ => Self::NotAuthorized,
        }
    }
}

/// One consented scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsentScope {
    /// Scope URI
    pub scope: String,
    /// Localized description
    pub description: String,
}

/// Consents the user has given this app
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserConsents {
    /// App name as shown to the user
    pub app_name: Option<String>,
    /// When the consent was given, as reported by the service
    pub auth_time: Option<String>,
    /// Consented scopes
    pub scopes: Vec<ConsentScope>,
}

#[derive(Debug, Deserialize)]
struct PrivacyRecord {
    status: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConsentResponse {
    #[serde(default)]
    app_name: Option<String>,
    #[serde(default)]
    auth_time: Option<String>,
    #[serde(default)]
    scope_lang_item: BTreeMap<String, String>,
}

/// Client for consent endpoints of the cloud health API
pub struct ConsentClient {
    http: Client,
    api_base: String,
    tokens: Arc<TokenStore>,
    last_status: RwLock<Option<PrivacyAuthStatus>>,
}

impl ConsentClient {
    /// Create a client for `api_base` using tokens from `tokens`
    #[must_use]
    pub fn new(http: Client, api_base: impl Into<String>, tokens: Arc<TokenStore>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            tokens,
            last_status: RwLock::new(None),
        }
    }

    /// Last status returned by [`Self::check_privacy_auth_status`]
    #[must_use]
    pub fn last_status(&self) -> Option<PrivacyAuthStatus> {
        self.last_status.read().ok().and_then(|s| *s)
    }

    fn remember(&self, status: Option<PrivacyAuthStatus>) {
        if let Ok(mut last) = self.last_status.write() {
            *last = status;
        }
    }

    fn credentials(&self) -> BridgeResult<CloudCredentials> {
        self.tokens.get().ok_or_else(|| {
            BridgeError::not_authorized_for(
                Platform::HuaweiCloud,
                "no cloud access token; complete the cloud authorization first",
            )
        })
    }

    fn authorized(
        &self,
        builder: RequestBuilder,
        credentials: &CloudCredentials,
    ) -> RequestBuilder {
        builder
            .bearer_auth(&credentials.token.access_token)
            .header(oauth::CLIENT_ID_HEADER, &credentials.client_id)
    }

    async fn send(&self, service: &str, builder: RequestBuilder) -> BridgeResult<Response> {
        let response = builder.send().await.map_err(|e| BridgeError::ExternalService {
            service: service.to_owned(),
            status: None,
            message: e.to_string(),
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(BridgeError::not_authorized_for(
                Platform::HuaweiCloud,
                format!("{service} rejected the access token ({status}); authorize again"),
            ));
        }
        Err(BridgeError::ExternalService {
            service: service.to_owned(),
            status: Some(status.as_u16()),
            message: body,
        })
    }

    /// Query the user's privacy authorization status
    ///
    /// An empty record list means the user never authorized the app.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized` without a token or when the token is rejected,
    /// `ExternalService` for other failures
    pub async fn check_privacy_auth_status(&self) -> BridgeResult<PrivacyAuthStatus> {
        let credentials = self.credentials()?;
        let url = format!("{}{}", self.api_base, cloud_paths::PRIVACY_RECORDS);
        let response = self
            .send(
                "privacy_records",
                self.authorized(self.http.get(&url), &credentials),
            )
            .await?;

        let records: Vec<PrivacyRecord> =
            response
                .json()
                .await
                .map_err(|e| BridgeError::ExternalService {
                    service: "privacy_records".to_owned(),
                    status: None,
                    message: format!("invalid response: {e}"),
                })?;
        let status = records
            .first()
            .map_or(PrivacyAuthStatus::NotAuthorized, |r| {
                PrivacyAuthStatus::from_code(r.status)
            });

        self.remember(Some(status));
        info!(status = ?status, "Privacy authorization status checked");
        Ok(status)
    }

    /// List the scopes the user consented to
    ///
    /// Checks the privacy status first if it is not known yet.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized` when the privacy status is not `authorized` or
    /// when the service reports no consented scopes
    pub async fn get_user_consents(&self) -> BridgeResult<UserConsents> {
        let status = match self.last_status() {
            Some(status) => status,
            None => self.check_privacy_auth_status().await?,
        };
        if status != PrivacyAuthStatus::Authorized {
            return Err(BridgeError::not_authorized_for(
                Platform::HuaweiCloud,
                format!(
                    "privacy authorization status is {status:?}; \
                     the user must authorize the app first"
                ),
            ));
        }

        let credentials = self.credentials()?;
        let url = format!(
            "{}{}/{}",
            self.api_base,
            cloud_paths::CONSENTS,
            credentials.client_id
        );
        let request = self
            .http
            .get(&url)
            .query(&[("lang", oauth::CONSENT_LANGUAGE)]);
        let response = self
            .send("consents", self.authorized(request, &credentials))
            .await?;
        let consent: ConsentResponse =
            response
                .json()
                .await
                .map_err(|e| BridgeError::ExternalService {
                    service: "consents".to_owned(),
                    status: None,
                    message: format!("invalid response: {e}"),
                })?;

        if consent.scope_lang_item.is_empty() {
            return Err(BridgeError::not_authorized_for(
                Platform::HuaweiCloud,
                "no scopes are consented for this app",
            ));
        }
        Ok(UserConsents {
            app_name: consent.app_name,
            auth_time: consent.auth_time,
            scopes: consent
                .scope_lang_item
                .into_iter()
                .map(|(scope, description)| ConsentScope { scope, description })
                .collect(),
        })
    }

    /// Revoke the app's consent, optionally deleting the user's cloud data
    ///
    /// On success every local token is discarded before this returns.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized` without a token, `ExternalService` if the
    /// service refuses; tokens are kept in that case
    pub async fn revoke_consent(&self, delete_data_immediately: bool) -> BridgeResult<()> {
        let credentials = self.credentials()?;
        let url = format!(
            "{}{}/{}",
            self.api_base,
            cloud_paths::CONSENTS,
            credentials.client_id
        );
        let request = self
            .http
            .delete(&url)
            .query(&[("deleteData", delete_data_immediately)]);
        if let Err(e) = self
            .send("consents", self.authorized(request, &credentials))
            .await
        {
            warn!(error = %e, "Consent revocation failed");
            return Err(e);
        }

        self.tokens.clear();
        self.remember(Some(PrivacyAuthStatus::NotAuthorized));
        info!(delete_data = delete_data_immediately, "Cloud consent revoked; tokens discarded");
        Ok(())
    }

    /// Forget the cached privacy status
    pub fn reset(&self) {
        self.remember(None);
    }
}
