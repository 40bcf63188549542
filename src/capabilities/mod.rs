// ABOUTME: Static capability registry of platform x data type x operation support
// ABOUTME: Pure lookup with special-permission flags; unknown pairs are unsupported
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Capability Registry
//!
//! Each platform owns a capability table mapping a data type to the
//! operations it supports. A (platform, data type) pair absent from the table
//! is unsupported for both operations. The tables are built once and shared
//! for the life of the process; lookups never fail and never do I/O.

use health_bridge_core::models::OperationSet;
use health_bridge_core::{BridgeError, BridgeResult, DataType, HealthOperation, Platform};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::OnceLock;

/// One row of a capability table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapabilityEntry {
    /// Operations the platform supports for this type
    pub operations: OperationSet,
    /// Whether the vendor requires a separately approved scope for this type
    pub requires_special_permission: bool,
    /// Free-form notes for operators
    pub notes: Option<&'static str>,
}

impl CapabilityEntry {
    const fn new(operations: OperationSet) -> Self {
        Self {
            operations,
            requires_special_permission: false,
            notes: None,
        }
    }

    const fn special(mut self) -> Self {
        self.requires_special_permission = true;
        self
    }

    const fn note(mut self, notes: &'static str) -> Self {
        self.notes = Some(notes);
        self
    }

    /// Whether reading is supported
    #[must_use]
    pub const fn can_read(&self) -> bool {
        self.operations.contains(OperationSet::READ)
    }

    /// Whether writing is supported
    #[must_use]
    pub const fn can_write(&self) -> bool {
        self.operations.contains(OperationSet::WRITE)
    }
}

/// Capability table of one platform
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityTable {
    /// Owning platform
    pub platform: Platform,
    /// Rows keyed by data type
    pub entries: BTreeMap<DataType, CapabilityEntry>,
}

const R: OperationSet = OperationSet::READ;
const RW: OperationSet = OperationSet::READ_WRITE;

fn build_table(platform: Platform, rows: &[(DataType, CapabilityEntry)]) -> CapabilityTable {
    CapabilityTable {
        platform,
        entries: rows.iter().copied().collect(),
    }
}

fn samsung_table() -> CapabilityTable {
    build_table(
        Platform::SamsungHealth,
        &[
            (
                DataType::Steps,
                CapabilityEntry::new(R)
                    .note("step count is written by the Samsung Health app only"),
            ),
            (DataType::ActiveCalories, CapabilityEntry::new(R)),
            (DataType::HeartRate, CapabilityEntry::new(RW)),
            (DataType::BloodGlucose, CapabilityEntry::new(RW)),
            (DataType::BloodPressure, CapabilityEntry::new(RW)),
            (DataType::BloodOxygen, CapabilityEntry::new(R)),
            (DataType::BodyTemperature, CapabilityEntry::new(RW)),
            (DataType::Weight, CapabilityEntry::new(RW)),
            (DataType::Height, CapabilityEntry::new(RW)),
            (DataType::BodyFat, CapabilityEntry::new(RW)),
            (DataType::Sleep, CapabilityEntry::new(R)),
            (DataType::Water, CapabilityEntry::new(RW)),
        ],
    )
}

fn huawei_device_table() -> CapabilityTable {
    let clinical = "health data scope must be approved by Huawei before release";
    build_table(
        Platform::HuaweiHealth,
        &[
            (DataType::Steps, CapabilityEntry::new(RW)),
            (DataType::Distance, CapabilityEntry::new(RW)),
            (DataType::ActiveCalories, CapabilityEntry::new(RW)),
            (DataType::HeartRate, CapabilityEntry::new(RW)),
            (DataType::RestingHeartRate, CapabilityEntry::new(R)),
            (DataType::BloodGlucose, CapabilityEntry::new(RW).special().note(clinical)),
            (DataType::BloodPressure, CapabilityEntry::new(RW).special().note(clinical)),
            (DataType::BloodOxygen, CapabilityEntry::new(RW).special().note(clinical)),
            (DataType::BodyTemperature, CapabilityEntry::new(RW).special().note(clinical)),
            (DataType::Weight, CapabilityEntry::new(RW)),
            (DataType::Height, CapabilityEntry::new(RW)),
            (DataType::BodyFat, CapabilityEntry::new(RW)),
            (DataType::Bmi, CapabilityEntry::new(R)),
            (DataType::Sleep, CapabilityEntry::new(R)),
        ],
    )
}

fn huawei_cloud_table() -> CapabilityTable {
    let clinical = "health data scope must be approved by Huawei before release";
    build_table(
        Platform::HuaweiCloud,
        &[
            (DataType::Steps, CapabilityEntry::new(R)),
            (DataType::Distance, CapabilityEntry::new(R)),
            (DataType::ActiveCalories, CapabilityEntry::new(R)),
            (DataType::HeartRate, CapabilityEntry::new(R)),
            (DataType::BloodGlucose, CapabilityEntry::new(R).special().note(clinical)),
            (DataType::BloodPressure, CapabilityEntry::new(R).special().note(clinical)),
            (DataType::BloodOxygen, CapabilityEntry::new(R).special().note(clinical)),
            (DataType::Weight, CapabilityEntry::new(R)),
            (DataType::Height, CapabilityEntry::new(R)),
            (DataType::BodyFat, CapabilityEntry::new(R)),
            (DataType::Sleep, CapabilityEntry::new(R)),
        ],
    )
}

fn apple_table() -> CapabilityTable {
    build_table(
        Platform::AppleHealth,
        &[
            (DataType::Steps, CapabilityEntry::new(RW)),
            (DataType::Distance, CapabilityEntry::new(RW)),
            (DataType::ActiveCalories, CapabilityEntry::new(RW)),
            (DataType::HeartRate, CapabilityEntry::new(RW)),
            (DataType::RestingHeartRate, CapabilityEntry::new(R).note("computed by the system")),
            (DataType::BloodGlucose, CapabilityEntry::new(RW)),
            (
                DataType::BloodPressure,
                CapabilityEntry::new(RW).note("stored as a correlation of two quantity samples"),
            ),
            (DataType::BloodOxygen, CapabilityEntry::new(RW)),
            (DataType::BodyTemperature, CapabilityEntry::new(RW)),
            (DataType::Weight, CapabilityEntry::new(RW)),
            (DataType::Height, CapabilityEntry::new(RW)),
            (DataType::BodyFat, CapabilityEntry::new(RW)),
            (DataType::Bmi, CapabilityEntry::new(RW)),
            (DataType::Sleep, CapabilityEntry::new(RW)),
            (DataType::Water, CapabilityEntry::new(RW)),
        ],
    )
}

fn google_fit_table() -> CapabilityTable {
    build_table(
        Platform::GoogleFit,
        &[
            (DataType::Steps, CapabilityEntry::new(RW)),
            (DataType::Distance, CapabilityEntry::new(RW)),
            (DataType::ActiveCalories, CapabilityEntry::new(RW)),
            (DataType::HeartRate, CapabilityEntry::new(RW)),
            (DataType::BloodGlucose, CapabilityEntry::new(RW)),
            (DataType::BloodPressure, CapabilityEntry::new(RW)),
            (DataType::BloodOxygen, CapabilityEntry::new(RW)),
            (DataType::BodyTemperature, CapabilityEntry::new(RW)),
            (DataType::Weight, CapabilityEntry::new(RW)),
            (DataType::Height, CapabilityEntry::new(RW)),
            (DataType::BodyFat, CapabilityEntry::new(RW)),
            (DataType::Sleep, CapabilityEntry::new(RW)),
            (DataType::Water, CapabilityEntry::new(RW)),
        ],
    )
}

static TABLES: OnceLock<HashMap<Platform, CapabilityTable>> = OnceLock::new();

fn tables() -> &'static HashMap<Platform, CapabilityTable> {
    TABLES.get_or_init(|| {
        [
            samsung_table(),
            huawei_device_table(),
            huawei_cloud_table(),
            apple_table(),
            google_fit_table(),
        ]
        .into_iter()
        .map(|table| (table.platform, table))
        .collect()
    })
}

/// Capability table of `platform`
#[must_use]
pub fn table(platform: Platform) -> Option<&'static CapabilityTable> {
    tables().get(&platform)
}

/// Full row for a (platform, data type) pair
#[must_use]
pub fn entry(platform: Platform, data_type: DataType) -> Option<&'static CapabilityEntry> {
    table(platform).and_then(|t| t.entries.get(&data_type))
}

/// Whether `platform` supports `operation` on `data_type`
#[must_use]
pub fn supports(platform: Platform, data_type: DataType, operation: HealthOperation) -> bool {
    entry(platform, data_type).is_some_and(|e| e.operations.allows(operation))
}

/// Data types supported by `platform`, optionally restricted to one operation
#[must_use]
pub fn supported_types(
    platform: Platform,
    operation: Option<HealthOperation>,
) -> BTreeSet<DataType> {
    table(platform)
        .map(|t| {
            t.entries
                .iter()
                .filter(|(_, e)| operation.is_none_or(|op| e.operations.allows(op)))
                .map(|(data_type, _)| *data_type)
                .collect()
        })
        .unwrap_or_default()
}

/// Whether the vendor requires a separately approved scope for this type
#[must_use]
pub fn requires_special_permission(platform: Platform, data_type: DataType) -> bool {
    entry(platform, data_type).is_some_and(|e| e.requires_special_permission)
}

/// Typed form of [`supports`]
///
/// # Errors
///
/// Returns `UnsupportedOperation` when the table does not allow the operation
pub fn ensure_supported(
    platform: Platform,
    data_type: DataType,
    operation: HealthOperation,
) -> BridgeResult<()> {
    if supports(platform, data_type, operation) {
        Ok(())
    } else {
        Err(BridgeError::unsupported(platform, data_type, operation))
    }
}
