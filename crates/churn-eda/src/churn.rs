//! Churn flag derivation and per-group churn rates.

use crate::aggregate::{extract_counts, extract_floats, extract_keys};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result, ResultExt};
use crate::types::{ChurnFlagSummary, ChurnRateRow, ChurnRateTable};
use polars::prelude::*;
use tracing::{info, warn};

const CUSTOMERS_COLUMN: &str = "customers";
const RATE_COLUMN: &str = "churn_rate";

/// Derives the binary churn flag from a status column and aggregates it.
#[derive(Debug, Clone)]
pub struct ChurnCalculator {
    status_column: String,
    attrited_value: String,
    existing_value: String,
    flag_column: String,
}

impl ChurnCalculator {
    pub fn new(
        status_column: impl Into<String>,
        attrited_value: impl Into<String>,
        existing_value: impl Into<String>,
        flag_column: impl Into<String>,
    ) -> Self {
        Self {
            status_column: status_column.into(),
            attrited_value: attrited_value.into(),
            existing_value: existing_value.into(),
            flag_column: flag_column.into(),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.columns.status.as_str(),
            config.attrited_value.as_str(),
            config.existing_value.as_str(),
            config.churn_flag_column.as_str(),
        )
    }

    pub fn flag_column(&self) -> &str {
        &self.flag_column
    }

    /// Append (or replace) the flag column: 1 for attrited, 0 for existing,
    /// null for anything else. Unrecognised statuses are counted, not
    /// coerced to 0.
    pub fn add_churn_flag(&self, df: &mut DataFrame) -> Result<ChurnFlagSummary> {
        let status = df
            .column(&self.status_column)
            .map_err(|_| AnalysisError::MissingColumn(self.status_column.clone()))?
            .as_materialized_series()
            .cast(&DataType::String)?;

        let mut summary = ChurnFlagSummary::default();
        let flags: Vec<Option<i32>> = status
            .str()?
            .into_iter()
            .map(|value| match value {
                Some(v) if v == self.attrited_value => {
                    summary.attrited += 1;
                    Some(1)
                }
                Some(v) if v == self.existing_value => {
                    summary.existing += 1;
                    Some(0)
                }
                _ => {
                    summary.undefined += 1;
                    None
                }
            })
            .collect();

        df.with_column(Series::new(self.flag_column.as_str().into(), flags))
            .context(format!("Adding column '{}'", self.flag_column))?;

        if summary.undefined > 0 {
            warn!(
                "{} rows have a '{}' value that is neither '{}' nor '{}'; their churn flag is undefined",
                summary.undefined, self.status_column, self.attrited_value, self.existing_value
            );
        }
        info!(
            "Churn flag added: {} attrited, {} existing",
            summary.attrited, summary.existing
        );

        Ok(summary)
    }

    /// Mean churn flag per group, highest rate first.
    ///
    /// Groups with equal rates keep the order in which they first appear.
    /// Groups without any defined flag have no rate and come last.
    pub fn churn_rate(&self, df: &DataFrame, group_by: &[String]) -> Result<ChurnRateTable> {
        for name in std::iter::once(&self.flag_column).chain(group_by) {
            if df.column(name).is_err() {
                return Err(AnalysisError::MissingColumn(name.clone()));
            }
        }

        let keys: Vec<Expr> = group_by.iter().map(|c| col(c.as_str())).collect();
        let frame = df
            .clone()
            .lazy()
            .group_by_stable(keys)
            .agg([
                len().alias(CUSTOMERS_COLUMN),
                col(self.flag_column.as_str())
                    .cast(DataType::Float64)
                    .mean()
                    .alias(RATE_COLUMN),
            ])
            .sort(
                [RATE_COLUMN],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_nulls_last(true)
                    .with_maintain_order(true),
            )
            .collect()?;

        let rows = extract_keys(&frame, group_by)?
            .into_iter()
            .zip(extract_counts(&frame, CUSTOMERS_COLUMN)?)
            .zip(extract_floats(&frame, RATE_COLUMN)?)
            .map(|((key, customers), rate)| ChurnRateRow {
                key,
                customers,
                rate,
            })
            .collect::<Vec<_>>();

        info!("Churn rate computed for {} groups", rows.len());

        Ok(ChurnRateTable {
            group_by: group_by.to_vec(),
            rows,
            frame,
        })
    }
}
