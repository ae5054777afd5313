use crate::error::{AnalysisError, Result};
use crate::types::{DuplicateSet, MissingEntry, MissingReport};
use crate::utils::is_numeric_dtype;
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Hashable cell value used to compare rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CellKey {
    Null,
    Number(u64),
    Text(String),
}

impl CellKey {
    fn number(value: f64) -> Self {
        // -0.0 == 0.0, and every NaN is the same value
        let normalized = if value == 0.0 {
            0.0
        } else if value.is_nan() {
            f64::NAN
        } else {
            value
        };
        CellKey::Number(normalized.to_bits())
    }
}

/// Read-only audits over a table snapshot.
pub struct QualityAuditor;

impl QualityAuditor {
    /// Missing-value count and percentage for every column, in table order.
    pub fn missing_report(df: &DataFrame) -> MissingReport {
        let total_rows = df.height();
        let entries = df
            .get_columns()
            .iter()
            .map(|col| {
                let count = col.null_count();
                let percentage = if total_rows > 0 {
                    100.0 * count as f64 / total_rows as f64
                } else {
                    0.0
                };
                MissingEntry {
                    column: col.name().to_string(),
                    count,
                    percentage,
                }
            })
            .collect();

        let report = MissingReport {
            total_rows,
            entries,
        };

        let with_missing: Vec<&MissingEntry> = report.columns_with_missing().collect();
        info!("Number of columns with missing values: {}", with_missing.len());
        for entry in with_missing {
            info!(
                "  {}: {} missing values ({:.2}%)",
                entry.column, entry.count, entry.percentage
            );
        }

        report
    }

    /// Rows identical to an earlier row across all columns.
    ///
    /// The first occurrence of each distinct row is not flagged.
    pub fn duplicate_rows(df: &DataFrame) -> Result<DuplicateSet> {
        let keys = Self::row_keys(df, &[])?;
        let mut seen: HashSet<&[CellKey]> = HashSet::with_capacity(keys.len());
        let mask: Vec<bool> = keys
            .iter()
            .map(|key| !seen.insert(key.as_slice()))
            .collect();

        let set = DuplicateSet::from_mask(mask);
        info!("Number of duplicate rows: {}", set.count());
        Ok(set)
    }

    /// Rows identical across all columns except `excluded_columns`.
    ///
    /// Every member of a group of two or more matching rows is flagged,
    /// including the first occurrence.
    pub fn partial_duplicate_rows(
        df: &DataFrame,
        excluded_columns: &[&str],
    ) -> Result<DuplicateSet> {
        for name in excluded_columns {
            if df.column(name).is_err() {
                return Err(AnalysisError::MissingColumn(name.to_string()));
            }
        }

        let keys = Self::row_keys(df, excluded_columns)?;
        let mut group_sizes: HashMap<&[CellKey], usize> = HashMap::with_capacity(keys.len());
        for key in &keys {
            *group_sizes.entry(key.as_slice()).or_insert(0) += 1;
        }

        let mask: Vec<bool> = keys
            .iter()
            .map(|key| group_sizes.get(key.as_slice()).copied().unwrap_or(0) > 1)
            .collect();

        let set = DuplicateSet::from_mask(mask);
        info!(
            "Number of partial duplicate rows (excluding {:?}): {}",
            excluded_columns,
            set.count()
        );
        Ok(set)
    }

    /// Rows of `df` flagged in `set`, limited to the first `limit`.
    pub fn select_rows(df: &DataFrame, set: &DuplicateSet, limit: usize) -> Result<DataFrame> {
        let mask = BooleanChunked::from_slice("duplicate".into(), set.mask());
        let selected = df.filter(&mask)?;
        Ok(selected.head(Some(limit)))
    }

    /// One key per row over every column not in `excluded`.
    fn row_keys(df: &DataFrame, excluded: &[&str]) -> Result<Vec<Vec<CellKey>>> {
        let height = df.height();
        let columns: Vec<&Column> = df
            .get_columns()
            .iter()
            .filter(|col| !excluded.contains(&col.name().as_str()))
            .collect();

        debug!(
            "Building row keys over {} of {} columns",
            columns.len(),
            df.width()
        );

        let mut keys: Vec<Vec<CellKey>> = (0..height)
            .map(|_| Vec::with_capacity(columns.len()))
            .collect();

        for col in columns {
            let series = col.as_materialized_series();
            if is_numeric_dtype(series.dtype()) {
                let float_series = series.cast(&DataType::Float64)?;
                for (row, value) in float_series.f64()?.into_iter().enumerate() {
                    keys[row].push(value.map_or(CellKey::Null, CellKey::number));
                }
            } else {
                let str_series = series.cast(&DataType::String)?;
                for (row, value) in str_series.str()?.into_iter().enumerate() {
                    keys[row].push(value.map_or(CellKey::Null, |s| CellKey::Text(s.to_string())));
                }
            }
        }

        Ok(keys)
    }
}
