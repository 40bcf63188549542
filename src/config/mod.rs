// ABOUTME: Configuration module for the health bridge
// ABOUTME: Environment-only settings; there are no configuration files
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// Environment configuration
pub mod environment;

pub use environment::{BridgeConfig, CloudConfig};
