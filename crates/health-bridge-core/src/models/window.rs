// ABOUTME: Inclusive query windows with millisecond resolution
// ABOUTME: Validates ordering and expands calendar days to full UTC days
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::{BridgeError, BridgeResult};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive time range of a read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl QueryWindow {
    /// Create a window
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `end` precedes `start`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> BridgeResult<Self> {
        if end < start {
            return Err(BridgeError::InvalidRange {
                start_millis: start.timestamp_millis(),
                end_millis: end.timestamp_millis(),
            });
        }
        Ok(Self { start, end })
    }

    /// Zero-length window at one instant
    #[must_use]
    pub const fn instant(at: DateTime<Utc>) -> Self {
        Self { start: at, end: at }
    }

    /// Window from `first` 00:00:00.000 to `last` 23:59:59.999 UTC
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `last` precedes `first`
    pub fn from_days(first: NaiveDate, last: NaiveDate) -> BridgeResult<Self> {
        let start = Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN));
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| BridgeError::config("invalid end-of-day time"))?;
        let end = Utc.from_utc_datetime(&last.and_time(end_of_day));
        Self::new(start, end)
    }

    /// Window from epoch milliseconds
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if either bound is out of range or reversed
    pub fn from_millis(start_millis: i64, end_millis: i64) -> BridgeResult<Self> {
        let invalid = || BridgeError::InvalidRange {
            start_millis,
            end_millis,
        };
        let start = DateTime::from_timestamp_millis(start_millis).ok_or_else(invalid)?;
        let end = DateTime::from_timestamp_millis(end_millis).ok_or_else(invalid)?;
        Self::new(start, end)
    }

    /// Window of `length` ending at `end` (inclusive span equals `length`)
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `length` is not positive
    pub fn trailing(end: DateTime<Utc>, length: Duration) -> BridgeResult<Self> {
        let start = end - length + Duration::milliseconds(1);
        Self::new(start, end)
    }

    /// Inclusive start
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Inclusive end
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Inclusive span (`end - start + 1ms`)
    #[must_use]
    pub fn span(&self) -> Duration {
        self.end - self.start + Duration::milliseconds(1)
    }

    /// Start as epoch millis
    #[must_use]
    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    /// End as epoch millis
    #[must_use]
    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }

    /// Whether `at` falls inside the window
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// Whether the epoch millisecond `at` falls inside the window
    #[must_use]
    pub fn contains_millis(&self, at: i64) -> bool {
        self.start_millis() <= at && at <= self.end_millis()
    }
}

impl fmt::Display for QueryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}]",
            self.start.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.end.format("%Y-%m-%dT%H:%M:%S%.3fZ")
        )
    }
}
