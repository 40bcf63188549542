// ABOUTME: Command implementations for health-bridge-cli
// ABOUTME: Local commands need no credentials; cloud commands talk to the Huawei endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod cloud;
pub mod local;
