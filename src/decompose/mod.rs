// ABOUTME: Normalizes raw vendor samples into HealthReadings for atomic and composite data types
// ABOUTME: Locates composite components by tolerant name matching and drops samples missing them
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Composite Field Decomposer
//!
//! Atomic types put one numeric field in `primary_value`. Composite types
//! (blood pressure) have no primary value; their named components go first
//! in `metadata`, followed by every raw vendor field. A composite sample
//! missing a required component is dropped, never zero-filled.

use health_bridge_core::models::{CompositeComponent, RawField, RawSample, ReadingShape};
use health_bridge_core::{BridgeError, DataType, HealthReading, Platform};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Why a sample could not be normalized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecomposeError {
    /// A required component of a composite type was not found
    #[error("{data_type} sample has no field matching the '{component}' component")]
    MissingCompositeField {
        /// Composite data type
        data_type: DataType,
        /// Component that could not be located
        component: &'static str,
    },
    /// An atomic sample carried no numeric field at all
    #[error("{data_type} sample has no numeric field")]
    NoNumericField {
        /// Atomic data type
        data_type: DataType,
    },
}

impl From<DecomposeError> for BridgeError {
    fn from(error: DecomposeError) -> Self {
        match error {
            DecomposeError::MissingCompositeField {
                data_type,
                component,
            } => Self::CompositeFieldMissing {
                data_type,
                component: component.to_owned(),
            },
            DecomposeError::NoNumericField { data_type } => Self::CompositeFieldMissing {
                data_type,
                component: "value".to_owned(),
            },
        }
    }
}

/// Sample left out of a query result
#[derive(Debug, Clone)]
pub struct DroppedSample {
    /// Vendor data type of the sample
    pub vendor_type: String,
    /// Sample time (epoch millis)
    pub timestamp_millis: i64,
    /// Why it was dropped
    pub error: BridgeError,
}

/// Normalize one raw sample
///
/// `primary_field` is the platform's binding for atomic types; when absent or
/// not numeric the type's common field names are tried, then the first
/// numeric field.
///
/// # Errors
///
/// Returns [`DecomposeError`] when a required component or any numeric value
/// cannot be located
pub fn decompose(
    sample: &RawSample,
    data_type: DataType,
    platform: Platform,
    primary_field: Option<&str>,
) -> Result<HealthReading, DecomposeError> {
    let (primary_value, metadata) = match data_type.shape() {
        ReadingShape::Atomic => decompose_atomic(sample, data_type, primary_field)?,
        ReadingShape::Composite(components) => {
            (None, decompose_composite(sample, data_type, components)?)
        }
    };

    Ok(HealthReading {
        data_type,
        primary_value,
        timestamp_millis: sample.start_millis,
        unit: data_type.unit().to_owned(),
        platform,
        source_label: sample.source.clone(),
        metadata,
    })
}

/// Normalize a batch, separating readings from dropped samples
///
/// Order of the input is preserved in both outputs.
#[must_use]
pub fn decompose_all(
    samples: &[RawSample],
    data_type: DataType,
    platform: Platform,
    primary_field: Option<&str>,
) -> (Vec<HealthReading>, Vec<DroppedSample>) {
    let mut readings = Vec::with_capacity(samples.len());
    let mut dropped = Vec::new();
    for sample in samples {
        match decompose(sample, data_type, platform, primary_field) {
            Ok(reading) => readings.push(reading),
            Err(error) => dropped.push(DroppedSample {
                vendor_type: sample.vendor_type.clone(),
                timestamp_millis: sample.start_millis,
                error: error.into(),
            }),
        }
    }
    (readings, dropped)
}

fn numeric_named(fields: &[RawField], name: &str) -> Option<usize> {
    fields
        .iter()
        .position(|f| f.name.eq_ignore_ascii_case(name) && f.value.is_numeric())
}

fn decompose_atomic(
    sample: &RawSample,
    data_type: DataType,
    primary_field: Option<&str>,
) -> Result<(Option<f64>, Map<String, Value>), DecomposeError> {
    let fields = &sample.fields;
    let index = primary_field
        .and_then(|name| numeric_named(fields, name))
        .or_else(|| {
            data_type
                .common_field_names()
                .iter()
                .find_map(|name| numeric_named(fields, name))
        })
        .or_else(|| fields.iter().position(|f| f.value.is_numeric()))
        .ok_or(DecomposeError::NoNumericField { data_type })?;

    let primary = fields[index].value.as_f64();
    let metadata = fields
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, f)| (f.name.clone(), f.value.to_json()))
        .collect();
    Ok((primary, metadata))
}

fn matches_component(field: &RawField, component: &CompositeComponent) -> bool {
    let name = field.name.to_ascii_lowercase();
    field.value.is_numeric() && component.synonyms.iter().any(|s| name.contains(s))
}

fn decompose_composite(
    sample: &RawSample,
    data_type: DataType,
    components: &'static [CompositeComponent],
) -> Result<Map<String, Value>, DecomposeError> {
    let mut consumed = vec![false; sample.fields.len()];
    let mut metadata = Map::new();

    for component in components {
        let found = sample
            .fields
            .iter()
            .enumerate()
            .find(|(i, f)| !consumed[*i] && matches_component(f, component));
        match found {
            Some((i, field)) => {
                consumed[i] = true;
                let value = field
                    .value
                    .as_f64()
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number);
                metadata.insert(component.name.to_owned(), value);
            }
            None if component.required => {
                return Err(DecomposeError::MissingCompositeField {
                    data_type,
                    component: component.name,
                });
            }
            None => {}
        }
    }

    for field in &sample.fields {
        metadata
            .entry(field.name.clone())
            .or_insert_with(|| field.value.to_json());
    }
    Ok(metadata)
}
