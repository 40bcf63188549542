// ABOUTME: Cloud OAuth and consent commands
// ABOUTME: Configuration comes from the HUAWEI_CLOUD_* environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use anyhow::{bail, Context, Result};
use health_bridge::config::BridgeConfig;
use health_bridge::oauth2_client::CallbackDisposition;
use health_bridge::HealthBridge;
use tokio::io::{self, AsyncBufReadExt, BufReader};

fn bridge() -> Result<HealthBridge> {
    let config = BridgeConfig::from_env()?;
    Ok(HealthBridge::builder().config(config).build()?)
}

fn bridge_with_token(access_token: String, client_id: Option<String>) -> Result<HealthBridge> {
    let bridge = bridge()?;
    let client_id = client_id
        .or_else(|| bridge.config().cloud.as_ref().map(|c| c.client_id.clone()))
        .context("pass --client-id or set HUAWEI_CLOUD_CLIENT_ID")?;
    bridge.set_cloud_credentials(access_token, client_id);
    Ok(bridge)
}

pub async fn authorize() -> Result<()> {
    let bridge = bridge()?;
    let request = bridge.begin_cloud_authorization()?;
    println!("Open this URL and sign in:\n\n{}\n", request.url);
    println!("Paste the URL you were redirected to:");

    let mut lines = BufReader::new(io::stdin()).lines();
    let callback = lines
        .next_line()
        .await?
        .context("no callback URL on stdin")?;
    let callback = callback.trim();
    if bridge.intercept_cloud_callback(callback) != CallbackDisposition::Actionable {
        bail!("'{callback}' is not a redirect carrying a code or error");
    }

    let granted = bridge.handle_cloud_callback(callback).await?;
    let keys: Vec<&str> = granted.iter().map(|t| t.key()).collect();
    println!("Authorized. Readable types: {}", keys.join(", "));
    Ok(())
}

pub async fn privacy_status(access_token: String, client_id: Option<String>) -> Result<()> {
    let bridge = bridge_with_token(access_token, client_id)?;
    let status = bridge.check_privacy_auth_status().await?;
    println!("{}", serde_json::to_string(&status)?);
    Ok(())
}

pub async fn consents(access_token: String, client_id: Option<String>) -> Result<()> {
    let bridge = bridge_with_token(access_token, client_id)?;
    let consents = bridge.get_user_consents().await?;
    println!("{}", serde_json::to_string_pretty(&consents)?);
    Ok(())
}

pub async fn revoke(
    access_token: String,
    client_id: Option<String>,
    delete_data: bool,
) -> Result<()> {
    let bridge = bridge_with_token(access_token, client_id)?;
    bridge.revoke_consent(delete_data).await?;
    println!("Consent revoked{}", if delete_data { "; cloud data deletion requested" } else { "" });
    Ok(())
}
