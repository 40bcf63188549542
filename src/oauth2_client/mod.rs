// ABOUTME: OAuth 2.0 PKCE client for the Huawei cloud health API
// ABOUTME: Authorization URLs, callback interception, token exchange, token storage and consent calls
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # OAuth 2.0 Client Module
//!
//! The bridge acts as a public OAuth 2.0 client of the Huawei account service
//! on behalf of the user. This module handles:
//! - PKCE authorization URLs with a fresh verifier and `state` per attempt
//! - Redirect interception and code-for-token exchange
//! - The process-local token store
//! - Privacy status, consent listing and consent revocation

/// Core OAuth 2.0 client implementation
pub mod client;
/// Privacy status and consent management
pub mod consent;
/// Authorization-code flow state machine
pub mod flow;
/// Process-local token storage
pub mod token_store;

pub use client::{generate_state, OAuth2Client, OAuth2Config, OAuth2Token, PkceParams};
pub use consent::{ConsentClient, ConsentScope, PrivacyAuthStatus, UserConsents};
pub use flow::{
    classify_callback, AuthorizationFlow, AuthorizationRequest, CallbackDisposition, FlowState,
    OAuthSession,
};
pub use token_store::{CloudCredentials, TokenStore};
