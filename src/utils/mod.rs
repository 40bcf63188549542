// ABOUTME: Utility modules shared across the health bridge
// ABOUTME: Currently the shared reqwest clients used by the OAuth and cloud layers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// Shared HTTP clients
pub mod http_client;
