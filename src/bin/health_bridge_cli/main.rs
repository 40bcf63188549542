// ABOUTME: health-bridge-cli - command-line tool for inspecting and exercising the health bridge
// ABOUTME: Capability tables, query plans, a synthetic end-to-end demo and the cloud OAuth flow
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Show what Huawei on-device can read
//! health-bridge-cli capabilities --platform huawei_health --operation read
//!
//! # Show how a 45-day window is chunked for Samsung Health
//! health-bridge-cli plan --platform samsung_health --start 2025-01-01 --end 2025-02-14
//!
//! # Read synthetic blood pressure samples through the planner and decomposer
//! health-bridge-cli demo --platform huawei_health --data-type blood_pressure --days 45
//!
//! # Run the cloud PKCE flow (needs HUAWEI_CLOUD_CLIENT_ID and HUAWEI_CLOUD_REDIRECT_URI)
//! health-bridge-cli authorize
//!
//! # Consent management with an existing access token
//! health-bridge-cli privacy-status --access-token <token>
//! health-bridge-cli consents --access-token <token>
//! health-bridge-cli revoke --access-token <token> --delete-data
//! ```

mod commands;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{value_parser, Parser, Subcommand};
use health_bridge::logging::LoggingConfig;
use health_bridge::{DataType, HealthOperation, Platform};

#[derive(Parser)]
#[command(
    name = "health-bridge-cli",
    about = "Health Bridge CLI",
    long_about = "Inspect capability tables and query plans, run a synthetic end-to-end read, and drive the Huawei cloud OAuth flow."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Print the capability table
    Capabilities {
        /// Only this platform
        #[arg(long)]
        platform: Option<Platform>,

        /// Only types supporting this operation (read or write)
        #[arg(long, value_parser = parse_operation)]
        operation: Option<HealthOperation>,
    },

    /// Print the chunks a read over [start, end] is split into
    Plan {
        /// Platform whose span limit applies
        #[arg(long)]
        platform: Platform,

        /// First day (YYYY-MM-DD, UTC)
        #[arg(long)]
        start: NaiveDate,

        /// Last day (YYYY-MM-DD, UTC)
        #[arg(long)]
        end: NaiveDate,

        /// Override the platform's max span
        #[arg(long, value_parser = value_parser!(i64).range(1..=3_650))]
        max_span_days: Option<i64>,
    },

    /// Read synthetic samples through the full bridge
    Demo {
        /// On-device platform to simulate
        #[arg(long, default_value = "huawei_health")]
        platform: Platform,

        /// Data type to read
        #[arg(long, default_value = "blood_pressure")]
        data_type: DataType,

        /// Days of history to generate and read
        #[arg(long, default_value = "45", value_parser = value_parser!(i64).range(1..=3_650))]
        days: i64,

        /// Stop after this many readings
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Run the cloud PKCE authorization flow interactively
    Authorize,

    /// Show the cloud privacy authorization status
    PrivacyStatus {
        #[command(flatten)]
        token: TokenArgs,
    },

    /// List the scopes the cloud user consented to
    Consents {
        #[command(flatten)]
        token: TokenArgs,
    },

    /// Revoke the cloud consent
    Revoke {
        #[command(flatten)]
        token: TokenArgs,

        /// Also delete the user's cloud data immediately
        #[arg(long)]
        delete_data: bool,
    },
}

/// Access token for consent calls
#[derive(clap::Args)]
struct TokenArgs {
    /// Cloud access token
    #[arg(long)]
    access_token: String,

    /// OAuth client id (defaults to HUAWEI_CLOUD_CLIENT_ID)
    #[arg(long)]
    client_id: Option<String>,
}

fn parse_operation(value: &str) -> Result<HealthOperation, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "read" => Ok(HealthOperation::Read),
        "write" => Ok(HealthOperation::Write),
        other => Err(format!("unknown operation '{other}' (expected read or write)")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        "debug".clone_into(&mut logging.level);
    }
    logging.init()?;

    match cli.command {
        Command::Capabilities {
            platform,
            operation,
        } => {
            commands::local::capabilities(platform, operation);
            Ok(())
        }
        Command::Plan {
            platform,
            start,
            end,
            max_span_days,
        } => commands::local::plan(platform, start, end, max_span_days),
        Command::Demo {
            platform,
            data_type,
            days,
            limit,
        } => commands::local::demo(platform, data_type, days, limit).await,
        Command::Authorize => commands::cloud::authorize().await,
        Command::PrivacyStatus { token } => {
            commands::cloud::privacy_status(token.access_token, token.client_id).await
        }
        Command::Consents { token } => {
            commands::cloud::consents(token.access_token, token.client_id).await
        }
        Command::Revoke { token, delete_data } => {
            commands::cloud::revoke(token.access_token, token.client_id, delete_data).await
        }
    }
}
