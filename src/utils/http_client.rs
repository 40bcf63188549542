// ABOUTME: Shared HTTP client utilities with connection pooling and timeout configuration
// ABOUTME: Separate clients for short OAuth token calls and longer Health Kit data calls
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Create a new HTTP client with custom timeout settings
///
/// Falls back to a default client if the builder fails.
#[must_use]
pub fn create_client_with_timeout(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Create a new HTTP client optimized for OAuth flows
///
/// Token exchanges should be fast; a slow token endpoint fails early.
#[must_use]
pub fn oauth_client() -> Client {
    create_client_with_timeout(15, 5) // 15s request timeout, 5s connect timeout
}

/// Create a new HTTP client for Health Kit data and consent calls
///
/// Aggregation over a full 30-day window can take a while.
#[must_use]
pub fn api_client() -> Client {
    create_client_with_timeout(60, 10) // 60s request timeout, 10s connect timeout
}
