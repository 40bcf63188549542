// ABOUTME: Capability, plan and synthetic demo commands
// ABOUTME: Runs entirely in-process against the in-memory vendor store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use health_bridge::adapters::{descriptor_for, ForegroundContext, SyntheticStore};
use health_bridge::capabilities;
use health_bridge::config::BridgeConfig;
use health_bridge::models::OperationSet;
use health_bridge::query::plan as plan_window;
use health_bridge::{DataType, HealthBridge, HealthOperation, Platform, QueryWindow, RawSample};
use std::sync::Arc;
use std::time::Duration as StdDuration;

pub fn capabilities(platform: Option<Platform>, operation: Option<HealthOperation>) {
    let platforms = platform.map_or_else(|| Platform::ALL.to_vec(), |p| vec![p]);
    for platform in platforms {
        println!("{} ({})", platform.display_name(), platform.key());
        let Some(table) = capabilities::table(platform) else {
            println!("  no capability table");
            continue;
        };
        for (data_type, entry) in &table.entries {
            if operation.is_some_and(|op| !entry.operations.allows(op)) {
                continue;
            }
            let ops: Vec<&str> = entry.operations.operations().iter().map(|o| o.key()).collect();
            println!(
                "  {:<20} {:<12}{}",
                data_type.key(),
                ops.join("+"),
                if entry.requires_special_permission {
                    " special permission"
                } else {
                    ""
                }
            );
        }
    }
}

pub fn plan(
    platform: Platform,
    start: NaiveDate,
    end: NaiveDate,
    max_span_days: Option<i64>,
) -> Result<()> {
    let window = QueryWindow::from_days(start, end)?;
    let max_span = max_span_days.map_or_else(
        || descriptor_for(platform).max_query_span(),
        Duration::days,
    );
    let plan = plan_window(&window, max_span)?;
    println!(
        "{} over {window}: {} chunk(s) of at most {} day(s)",
        platform.key(),
        plan.chunks().len(),
        max_span.num_days()
    );
    for (i, chunk) in plan.chunks().iter().enumerate() {
        println!("  #{i:<3} {chunk}");
    }
    Ok(())
}

fn synthetic_sample(
    platform: Platform,
    data_type: DataType,
    at_millis: i64,
    n: i64,
) -> Result<RawSample> {
    let binding = descriptor_for(platform)
        .binding(data_type)
        .with_context(|| format!("{} has no binding for {data_type}", platform.key()))?;
    let wobble = f64::from(u8::try_from(n.rem_euclid(7)).unwrap_or_default());
    let sample = RawSample::new(binding.vendor_type, at_millis).with_source("health-bridge-cli");
    Ok(if data_type.is_composite() {
        sample
            .with_field("systolic_pressure", 115.0 + wobble)
            .with_field("diastolic_pressure", 75.0 + wobble / 2.0)
            .with_field("sphygmus", 64_i32)
    } else {
        sample.with_field(binding.primary_field.unwrap_or("value"), 1_000.0 + wobble * 10.0)
    })
}

pub async fn demo(
    platform: Platform,
    data_type: DataType,
    days: i64,
    limit: Option<usize>,
) -> Result<()> {
    if platform.is_cloud() {
        bail!("demo simulates on-device platforms only");
    }
    if days < 1 {
        bail!("--days must be at least 1");
    }
    capabilities::ensure_supported(platform, data_type, HealthOperation::Read)?;

    let end = Utc::now();
    let start = end - Duration::days(days);
    let step = Duration::hours(6).num_milliseconds();
    let samples = (0..days * 4)
        .map(|n| synthetic_sample(platform, data_type, start.timestamp_millis() + n * step, n))
        .collect::<Result<Vec<_>>>()?;

    let store = Arc::new(SyntheticStore::new(platform).with_samples(samples));
    let config = BridgeConfig {
        permission_settle: StdDuration::ZERO,
        ..BridgeConfig::from_env()?
    };
    let bridge = HealthBridge::builder()
        .config(config)
        .with_device_store(platform, Arc::clone(&store))
        .build()?;

    bridge.initialize(platform).await?;
    let context = ForegroundContext::new("health-bridge-cli");
    let granted = bridge
        .request_permissions(
            platform,
            &[data_type],
            OperationSet::READ,
            Some("synthetic demo"),
            Some(&context),
        )
        .await?;
    println!("permission request granted: {granted}");

    let outcome = bridge
        .read_health_data(platform, data_type, start, end, limit)
        .await?;
    println!(
        "{} readings from {} of {} chunk(s), {} vendor read(s), {} dropped, truncated: {}",
        outcome.readings.len(),
        outcome.chunks_attempted,
        outcome.chunks_planned,
        store.read_calls(),
        outcome.dropped.len(),
        outcome.truncated
    );
    for reading in outcome.readings.iter().take(5) {
        println!("{}", serde_json::to_string(reading)?);
    }

    bridge.cleanup(platform).await;
    Ok(())
}
