//! Shared utilities for the analysis pipeline.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use crate::types::ColumnKind;
use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Semantic kind of a column with the given dtype.
///
/// Booleans, strings, temporal and categorical dtypes are all categorical.
pub fn column_kind(dtype: &DataType) -> ColumnKind {
    if is_numeric_dtype(dtype) {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Calculate the mode (most frequent non-null value) of a Series as a string.
///
/// Ties go to the lexicographically smallest value, so the result does not
/// depend on row order or hashing.
pub fn string_mode(series: &Series) -> PolarsResult<Option<String>> {
    let str_series = series.cast(&DataType::String)?;
    let str_chunked = str_series.str()?;

    let mut value_counts: HashMap<&str, usize> = HashMap::new();
    for val in str_chunked.into_iter().flatten() {
        *value_counts.entry(val).or_insert(0) += 1;
    }

    Ok(value_counts
        .into_iter()
        .max_by(|(a_val, a_count), (b_val, b_count)| {
            a_count.cmp(b_count).then_with(|| b_val.cmp(a_val))
        })
        .map(|(val, _)| val.to_string()))
}

/// Median of the non-null values of a numeric Series.
pub fn numeric_median(series: &Series) -> PolarsResult<Option<f64>> {
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series.median())
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
///
/// The result is always Float64.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let float_series = series.cast(&DataType::Float64)?;
    let values: Vec<f64> = float_series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();

    Ok(Series::new(series.name().clone(), values))
}

/// Fill null values in a Series with a string value.
///
/// Non-string columns are converted to their string rendering.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let str_series = series.cast(&DataType::String)?;
    let values: Vec<&str> = str_series
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();

    Ok(Series::new(series.name().clone(), values))
}

/// Render every value of a Series as an optional string (None for null).
pub fn series_to_strings(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let str_series = series.cast(&DataType::String)?;
    Ok(str_series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Render a group key for display.
pub fn format_key(key: &[Option<String>]) -> String {
    key.iter()
        .map(|v| v.as_deref().unwrap_or("null"))
        .collect::<Vec<_>>()
        .join(" / ")
}

// =============================================================================
// Tests
// =============================================================================
