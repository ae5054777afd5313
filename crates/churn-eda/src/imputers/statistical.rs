//! Statistical imputation: median for numeric columns, mode for categorical.

use crate::error::{AnalysisError, Result, ResultExt};
use crate::types::{ColumnDescriptor, ColumnFill, ColumnKind, FillValue, ImputationOutcome, TableSchema};
use crate::utils::{fill_numeric_nulls, fill_string_nulls, numeric_median, string_mode};
use polars::prelude::*;
use tracing::{debug, info};

/// Statistical imputation for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill every missing value in the table, in place.
    ///
    /// Columns without missing values are left untouched. Fill values are
    /// computed from the table as it was before this call. Fails when a
    /// column with missing values has no non-missing value at all; in that
    /// case the table is not modified.
    pub fn impute(df: &mut DataFrame, schema: &TableSchema) -> Result<ImputationOutcome> {
        let mut planned: Vec<(Series, ColumnFill)> = Vec::new();

        for descriptor in schema.columns() {
            let column = df
                .column(&descriptor.name)
                .map_err(|_| AnalysisError::MissingColumn(descriptor.name.clone()))?;
            let missing = column.null_count();
            if missing == 0 {
                continue;
            }

            let series = column.as_materialized_series();
            let (filled, value) = Self::fill_column(series, descriptor)?;
            debug!("Filling '{}' ({} missing) with {}", descriptor.name, missing, value);

            planned.push((
                filled,
                ColumnFill {
                    column: descriptor.name.clone(),
                    kind: descriptor.kind,
                    filled: missing,
                    value,
                },
            ));
        }

        let mut outcome = ImputationOutcome::default();
        for (filled, fill) in planned {
            df.replace(&fill.column, filled)
                .context(format!("Replacing column '{}'", fill.column))?;
            info!("Filled '{}' with {}", fill.column, fill.value);
            outcome.fills.push(fill);
        }

        outcome.remaining_nulls = df.get_columns().iter().map(|c| c.null_count()).sum();
        info!("Remaining null values after filling: {}", outcome.remaining_nulls);

        Ok(outcome)
    }

    fn fill_column(series: &Series, descriptor: &ColumnDescriptor) -> Result<(Series, FillValue)> {
        match descriptor.kind {
            ColumnKind::Numeric => {
                let median = numeric_median(series)?.ok_or_else(|| {
                    AnalysisError::ImputationFailed {
                        column: descriptor.name.clone(),
                        reason: "no non-missing values to take a median of".to_string(),
                    }
                })?;
                Ok((fill_numeric_nulls(series, median)?, FillValue::Median(median)))
            }
            ColumnKind::Categorical => {
                let mode = string_mode(series)?.ok_or_else(|| AnalysisError::ImputationFailed {
                    column: descriptor.name.clone(),
                    reason: "no non-missing values to take a mode of".to_string(),
                })?;
                let filled = fill_string_nulls(series, &mode)?;
                Ok((filled, FillValue::Mode(mode)))
            }
        }
    }
}
