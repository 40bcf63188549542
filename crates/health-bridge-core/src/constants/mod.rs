// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Timing defaults, cloud endpoints, OAuth parameters and environment variable names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Pure data constants grouped by domain. Anything a deployment may want to
//! change is also readable from the environment; see `env_vars`.

/// Service identity
pub mod service {
    /// Service name used in logs
    pub const SERVICE_NAME: &str = "health-bridge";
    /// Crate version
    pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Permission lifecycle and query timing defaults
pub mod timing {
    /// Wait after an interactive permission request before re-querying grant state
    pub const DEFAULT_PERMISSION_SETTLE_MS: u64 = 1_500;
    /// Upper bound accepted for the settle wait
    pub const MAX_PERMISSION_SETTLE_MS: u64 = 30_000;
    /// Lookback of the verification read on platforms without a grant query
    pub const DEFAULT_VERIFY_LOOKBACK_DAYS: i64 = 7;
    /// Upper bound accepted for configured day counts (lookback, span overrides)
    pub const MAX_CONFIGURED_DAYS: i64 = 3_650;
    /// Maximum span of the cloud detail (sample set) endpoint
    pub const CLOUD_DETAIL_MAX_SPAN_DAYS: i64 = 30;
    /// Maximum span of the cloud daily aggregate endpoint
    pub const CLOUD_DAILY_MAX_SPAN_DAYS: i64 = 31;
    /// Tokens expiring within this many seconds are treated as expiring soon
    pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 300;
}

/// OAuth 2.0 parameters for the cloud PKCE flow
pub mod oauth {
    /// Huawei account authorization endpoint
    pub const HUAWEI_AUTH_URL: &str = "https://oauth-login.cloud.huawei.com/oauth2/v3/authorize";
    /// Huawei account token endpoint
    pub const HUAWEI_TOKEN_URL: &str = "https://oauth-login.cloud.huawei.com/oauth2/v3/token";
    /// Health Kit REST API base
    pub const HUAWEI_HEALTH_API_BASE: &str = "https://health-api.cloud.huawei.com/healthkit/v2";
    /// Scopes requested when none are configured
    pub const HUAWEI_DEFAULT_SCOPES: &[&str] = &[
        "openid",
        "https://www.huawei.com/healthkit/step.read",
        "https://www.huawei.com/healthkit/heartrate.read",
        "https://www.huawei.com/healthkit/bloodglucose.read",
        "https://www.huawei.com/healthkit/bloodpressure.read",
        "https://www.huawei.com/healthkit/bodyweight.read",
    ];
    /// PKCE code verifier length (RFC 7636 allows 43..=128)
    pub const CODE_VERIFIER_LENGTH: usize = 64;
    /// PKCE challenge method
    pub const CODE_CHALLENGE_METHOD: &str = "S256";
    /// Length of the random `state` nonce
    pub const STATE_LENGTH: usize = 32;
    /// Header carrying the client id on Health Kit REST calls
    pub const CLIENT_ID_HEADER: &str = "x-client-id";
    /// Language requested for consent descriptions
    pub const CONSENT_LANGUAGE: &str = "en";
}

/// Health Kit REST paths relative to the API base
pub mod cloud_paths {
    /// Detail sample-set aggregation
    pub const SAMPLE_SET_POLYMERIZE: &str = "/sampleSet:polymerize";
    /// Daily aggregation
    pub const SAMPLE_SET_DAILY_POLYMERIZE: &str = "/sampleSet:dailyPolymerize";
    /// Privacy authorization records
    pub const PRIVACY_RECORDS: &str = "/profile/privacyRecords";
    /// Consent records, suffixed with the client id
    pub const CONSENTS: &str = "/consents";
}

/// Environment variable names
pub mod env_vars {
    /// Settle wait after an interactive request, milliseconds
    pub const PERMISSION_SETTLE_MS: &str = "HEALTH_BRIDGE_PERMISSION_SETTLE_MS";
    /// Verification read lookback, days
    pub const VERIFY_LOOKBACK_DAYS: &str = "HEALTH_BRIDGE_VERIFY_LOOKBACK_DAYS";
    /// Prefix of per-platform max span overrides; suffix is the uppercased platform key
    pub const MAX_SPAN_DAYS_PREFIX: &str = "HEALTH_BRIDGE_MAX_SPAN_DAYS_";
    /// Cloud OAuth client id
    pub const CLOUD_CLIENT_ID: &str = "HUAWEI_CLOUD_CLIENT_ID";
    /// Cloud OAuth client secret
    pub const CLOUD_CLIENT_SECRET: &str = "HUAWEI_CLOUD_CLIENT_SECRET";
    /// Cloud OAuth redirect URI
    pub const CLOUD_REDIRECT_URI: &str = "HUAWEI_CLOUD_REDIRECT_URI";
    /// Cloud authorization endpoint override
    pub const CLOUD_AUTH_URL: &str = "HUAWEI_CLOUD_AUTH_URL";
    /// Cloud token endpoint override
    pub const CLOUD_TOKEN_URL: &str = "HUAWEI_CLOUD_TOKEN_URL";
    /// Cloud REST API base override
    pub const CLOUD_API_BASE_URL: &str = "HUAWEI_CLOUD_API_BASE_URL";
    /// Space-separated cloud scopes
    pub const CLOUD_SCOPES: &str = "HUAWEI_CLOUD_SCOPES";
}
