// ABOUTME: Pure partitioning of a query window into contiguous sub-windows of bounded span
// ABOUTME: Chunk i covers [start + i*M, min(start + (i+1)*M - 1ms, end)]
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use chrono::Duration;
use health_bridge_core::{BridgeError, BridgeResult, QueryWindow};

/// Chunks covering a window, oldest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    window: QueryWindow,
    max_span: Duration,
    chunks: Vec<QueryWindow>,
}

impl QueryPlan {
    /// Window being covered
    #[must_use]
    pub const fn window(&self) -> &QueryWindow {
        &self.window
    }

    /// Span limit used to split the window
    #[must_use]
    pub const fn max_span(&self) -> Duration {
        self.max_span
    }

    /// Sub-windows in read order
    #[must_use]
    pub fn chunks(&self) -> &[QueryWindow] {
        &self.chunks
    }

    /// Whether the window fits in a single read
    #[must_use]
    pub fn is_single(&self) -> bool {
        self.chunks.len() == 1
    }
}

/// Split `window` into sub-windows no wider than `max_span`
///
/// A window whose span is at most `max_span` (including a zero-length
/// window) yields exactly one chunk.
///
/// # Errors
///
/// Returns `Config` if `max_span` is shorter than one millisecond
pub fn plan(window: &QueryWindow, max_span: Duration) -> BridgeResult<QueryPlan> {
    let step = max_span.num_milliseconds();
    if step <= 0 {
        return Err(BridgeError::config(format!(
            "max query span must be at least 1ms, got {max_span}"
        )));
    }

    let end = window.end_millis();
    let mut chunks = Vec::new();
    let mut chunk_start = window.start_millis();
    loop {
        let chunk_end = chunk_start.saturating_add(step - 1).min(end);
        chunks.push(QueryWindow::from_millis(chunk_start, chunk_end)?);
        if chunk_end >= end {
            break;
        }
        chunk_start = chunk_end + 1;
    }

    Ok(QueryPlan {
        window: *window,
        max_span,
        chunks,
    })
}
