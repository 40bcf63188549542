// ABOUTME: Query planner splitting arbitrary windows into vendor-sized chunks read oldest first
// ABOUTME: Merges decomposed readings in time order and records per-chunk failures in a manifest
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Query Planner
//!
//! A read over a window wider than the platform's maximum span is split into
//! contiguous chunks with no gaps or overlaps. Chunks are read in sequence;
//! a transient failure on one chunk is recorded and the query moves on.

mod plan;

pub use plan::{plan, QueryPlan};

use crate::adapters::{CloudAdapter, CloudQueryKind, HealthAdapter};
use crate::decompose::{decompose_all, DroppedSample};
use crate::logging::BridgeLogger;
use async_trait::async_trait;
use chrono::Duration;
use health_bridge_core::models::RawSampleSet;
use health_bridge_core::{
    AdapterError, BridgeError, BridgeResult, DataType, HealthReading, Platform, QueryWindow,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Something that reads one window of raw samples
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// Platform the samples come from
    fn platform(&self) -> Platform;

    /// Largest window one `read_chunk` accepts
    fn max_span(&self) -> Duration;

    /// Vendor field holding the primary value of `data_type`
    fn primary_field(&self, data_type: DataType) -> Option<&'static str>;

    /// Read one window no wider than `max_span`
    async fn read_chunk(
        &self,
        data_type: DataType,
        window: &QueryWindow,
    ) -> Result<RawSampleSet, AdapterError>;
}

#[async_trait]
impl<T: HealthAdapter + ?Sized> ChunkSource for T {
    fn platform(&self) -> Platform {
        HealthAdapter::platform(self)
    }

    fn max_span(&self) -> Duration {
        self.max_query_span()
    }

    fn primary_field(&self, data_type: DataType) -> Option<&'static str> {
        HealthAdapter::primary_field(self, data_type)
    }

    async fn read_chunk(
        &self,
        data_type: DataType,
        window: &QueryWindow,
    ) -> Result<RawSampleSet, AdapterError> {
        self.read_raw(data_type, window).await
    }
}

/// Cloud reads through a specific aggregation endpoint
pub struct CloudQuery {
    adapter: Arc<CloudAdapter>,
    kind: CloudQueryKind,
}

impl CloudQuery {
    /// Read through `kind` using `adapter`
    #[must_use]
    pub const fn new(adapter: Arc<CloudAdapter>, kind: CloudQueryKind) -> Self {
        Self { adapter, kind }
    }

    /// Endpoint used
    #[must_use]
    pub const fn kind(&self) -> CloudQueryKind {
        self.kind
    }
}

#[async_trait]
impl ChunkSource for CloudQuery {
    fn platform(&self) -> Platform {
        Platform::HuaweiCloud
    }

    fn max_span(&self) -> Duration {
        self.kind.max_span()
    }

    fn primary_field(&self, data_type: DataType) -> Option<&'static str> {
        HealthAdapter::primary_field(self.adapter.as_ref(), data_type)
    }

    async fn read_chunk(
        &self,
        data_type: DataType,
        window: &QueryWindow,
    ) -> Result<RawSampleSet, AdapterError> {
        self.adapter.read(self.kind, data_type, window).await
    }
}

/// Chunk that failed transiently
#[derive(Debug, Clone)]
pub struct ChunkFailure {
    /// Window of the failed chunk
    pub window: QueryWindow,
    /// Converted adapter error
    pub error: BridgeError,
}

/// Readings of a query plus its manifest
#[derive(Debug, Clone, Default)]
pub struct QueryOutcome {
    /// Merged readings in non-decreasing timestamp order
    pub readings: Vec<HealthReading>,
    /// Chunks that failed transiently
    pub failures: Vec<ChunkFailure>,
    /// Samples that could not be normalized
    pub dropped: Vec<DroppedSample>,
    /// Samples a vendor returned whose start lies outside the chunk read
    pub out_of_chunk: usize,
    /// Number of chunks in the plan
    pub chunks_planned: usize,
    /// Number of chunks read or attempted
    pub chunks_attempted: usize,
    /// Whether the limit cut the result short
    pub truncated: bool,
    /// Whether cancellation stopped the query
    pub cancelled: bool,
    /// Non-transient error that stopped the query after partial results
    pub halted: Option<BridgeError>,
}

impl QueryOutcome {
    /// Whether every planned chunk was read successfully
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
            && self.halted.is_none()
            && !self.cancelled
            && !self.truncated
            && self.chunks_attempted == self.chunks_planned
    }
}

/// Run a planned read of `data_type` over `window` against `source`
///
/// A sample belongs to the chunk containing its start time. Vendors may
/// return samples overlapping a chunk boundary (sleep segments, detail
/// points of an aggregate); those are skipped in every other chunk so no
/// sample is merged twice, and counted in [`QueryOutcome::out_of_chunk`].
///
/// # Errors
///
/// Returns `Config` when the source's span is not positive, and any
/// non-transient adapter error raised before a reading was merged
pub async fn execute<S: ChunkSource + ?Sized>(
    source: &S,
    data_type: DataType,
    window: &QueryWindow,
    limit: Option<usize>,
    cancel: &CancellationToken,
) -> BridgeResult<QueryOutcome> {
    let platform = source.platform();
    let plan = plan(window, source.max_span())?;
    let primary_field = source.primary_field(data_type);
    let mut outcome = QueryOutcome {
        chunks_planned: plan.chunks().len(),
        ..QueryOutcome::default()
    };

    if limit == Some(0) {
        outcome.truncated = true;
        return Ok(outcome);
    }

    let chunk_count = plan.chunks().len();
    for (index, chunk) in plan.chunks().iter().enumerate() {
        if cancel.is_cancelled() {
            outcome.cancelled = true;
            break;
        }
        outcome.chunks_attempted += 1;
        debug!(
            platform = %platform,
            data_type = %data_type,
            chunk = index,
            window = %chunk,
            "Reading chunk"
        );

        let read = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = source.read_chunk(data_type, chunk) => Some(result),
        };
        let Some(result) = read else {
            outcome.cancelled = true;
            break;
        };

        let samples = match result {
            Ok(samples) => samples,
            Err(error) if error.is_transient() => {
                warn!(
                    platform = %platform,
                    data_type = %data_type,
                    chunk = index,
                    error = %error,
                    "Chunk read failed; continuing"
                );
                outcome.failures.push(ChunkFailure {
                    window: *chunk,
                    error: error.into(),
                });
                continue;
            }
            Err(error) => {
                if outcome.readings.is_empty() {
                    return Err(error.into());
                }
                warn!(
                    platform = %platform,
                    data_type = %data_type,
                    chunk = index,
                    error = %error,
                    "Query halted after partial results"
                );
                outcome.halted = Some(error.into());
                break;
            }
        };

        let returned = samples.len();
        let in_chunk: RawSampleSet = samples
            .into_iter()
            .filter(|s| chunk.contains_millis(s.start_millis))
            .collect();
        if in_chunk.len() < returned {
            debug!(
                platform = %platform,
                chunk = index,
                skipped = returned - in_chunk.len(),
                "Skipped samples starting outside the chunk"
            );
            outcome.out_of_chunk += returned - in_chunk.len();
        }
        let (mut readings, dropped) =
            decompose_all(&in_chunk, data_type, platform, primary_field);
        readings.sort_by_key(|r| r.timestamp_millis);
        outcome.dropped.extend(dropped);

        if let Some(limit) = limit {
            let room = limit.saturating_sub(outcome.readings.len());
            if readings.len() >= room {
                outcome.truncated = readings.len() > room || index + 1 < chunk_count;
                readings.truncate(room);
                outcome.readings.extend(readings);
                break;
            }
        }
        outcome.readings.extend(readings);
    }

    BridgeLogger::log_query_summary(
        platform,
        data_type,
        outcome.chunks_planned,
        outcome.chunks_attempted,
        outcome.readings.len(),
        outcome.failures.len(),
    );
    Ok(outcome)
}
