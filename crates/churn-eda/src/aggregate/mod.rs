//! Group-by aggregation.
//!
//! Partitions rows by one or more key columns and computes summary
//! statistics of numeric metric columns per group. Groups come out in the
//! order they are first seen unless the request asks for key order.
//!
//! # Example
//!
//! ```rust,ignore
//! use churn_eda::aggregate::{AggregationRequest, Aggregator};
//! use churn_eda::types::Statistic;
//!
//! let request = AggregationRequest::new("By gender", ["Gender"])
//!     .metric("Credit_Limit", &[Statistic::Mean, Statistic::Max])
//!     .sorted_by_keys(true);
//!
//! let result = Aggregator::aggregate(&df, &schema, &request)?;
//! println!("{}", result.frame);
//! ```

mod request;

pub use request::{AggregationRequest, MetricSpec};

use crate::error::{AnalysisError, Result};
use crate::types::{ColumnKind, GroupKey, GroupStats, GroupedAggregate, Statistic, TableSchema};
use crate::utils::series_to_strings;
use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info};

/// Name of the per-group row count column in result frames.
pub const ROWS_COLUMN: &str = "rows";

/// Computes grouped summary statistics.
pub struct Aggregator;

impl Aggregator {
    /// Run one aggregation request against the table.
    ///
    /// Fails with an aggregation-kind error when a grouping or metric column
    /// is absent, or when a metric column is not numeric. Null key values
    /// form their own group.
    pub fn aggregate(
        df: &DataFrame,
        schema: &TableSchema,
        request: &AggregationRequest,
    ) -> Result<GroupedAggregate> {
        Self::validate(schema, request)?;

        let columns: Vec<(String, Statistic)> = request
            .metrics
            .iter()
            .flat_map(|m| m.statistics.iter().map(|s| (m.column.clone(), *s)))
            .collect();

        let keys: Vec<Expr> = request.group_by.iter().map(|c| col(c.as_str())).collect();
        let mut exprs: Vec<Expr> = vec![len().alias(ROWS_COLUMN)];
        exprs.extend(
            columns
                .iter()
                .map(|(metric, stat)| statistic_expr(metric, *stat).alias(output_name(metric, *stat))),
        );

        let mut lf = df.clone().lazy().group_by_stable(keys).agg(exprs);
        if request.sort_by_keys {
            lf = lf.sort(
                request.group_by.clone(),
                SortMultipleOptions::default()
                    .with_nulls_last(true)
                    .with_maintain_order(true),
            );
        }
        let frame = lf.collect()?;
        debug!("'{}' result shape: {:?}", request.name, frame.shape());

        let group_keys = extract_keys(&frame, &request.group_by)?;
        let rows = extract_counts(&frame, ROWS_COLUMN)?;
        let value_columns = columns
            .iter()
            .map(|(metric, stat)| extract_floats(&frame, &output_name(metric, *stat)))
            .collect::<Result<Vec<_>>>()?;

        let groups = group_keys
            .into_iter()
            .zip(rows)
            .enumerate()
            .map(|(i, (key, rows))| GroupStats {
                key,
                rows,
                values: value_columns.iter().map(|values| values[i]).collect(),
            })
            .collect::<Vec<_>>();

        info!("{} aggregation complete ({} groups)", request.name, groups.len());

        Ok(GroupedAggregate {
            group_by: request.group_by.clone(),
            columns,
            groups,
            frame,
        })
    }

    fn validate(schema: &TableSchema, request: &AggregationRequest) -> Result<()> {
        if request.group_by.is_empty() {
            return Err(AnalysisError::InvalidConfig(format!(
                "aggregation '{}' has no grouping columns",
                request.name
            )));
        }

        for key in &request.group_by {
            if schema.get(key).is_none() {
                return Err(AnalysisError::AggregationFailed {
                    column: key.clone(),
                    reason: "grouping column not found".to_string(),
                });
            }
        }

        for metric in &request.metrics {
            let descriptor =
                schema
                    .get(&metric.column)
                    .ok_or_else(|| AnalysisError::AggregationFailed {
                        column: metric.column.clone(),
                        reason: "metric column not found".to_string(),
                    })?;
            if descriptor.kind != ColumnKind::Numeric {
                return Err(AnalysisError::AggregationFailed {
                    column: metric.column.clone(),
                    reason: format!("metric column is {} ({}), not numeric", descriptor.kind, descriptor.dtype),
                });
            }
        }

        // every result column name must be unique
        let mut names: HashSet<String> = HashSet::from([ROWS_COLUMN.to_string()]);
        for key in &request.group_by {
            if !names.insert(key.clone()) {
                return Err(AnalysisError::AggregationFailed {
                    column: key.clone(),
                    reason: format!(
                        "grouping column collides with another result column (reserved: '{}')",
                        ROWS_COLUMN
                    ),
                });
            }
        }
        for (metric, stat) in request.output_columns() {
            let name = output_name(metric, stat);
            if !names.insert(name.clone()) {
                return Err(AnalysisError::AggregationFailed {
                    column: metric.to_string(),
                    reason: format!("result column '{}' would appear more than once", name),
                });
            }
        }

        Ok(())
    }
}

fn statistic_expr(metric: &str, stat: Statistic) -> Expr {
    let values = col(metric).cast(DataType::Float64);
    match stat {
        Statistic::Mean => values.mean(),
        Statistic::Median => values.median(),
        Statistic::Min => values.min(),
        Statistic::Max => values.max(),
        // polars sums an all-null group to 0
        Statistic::Sum => when(values.clone().count().gt(lit(0)))
            .then(values.sum())
            .otherwise(lit(NULL).cast(DataType::Float64)),
    }
}

fn output_name(metric: &str, stat: Statistic) -> String {
    format!("{}_{}", metric, stat)
}

/// Group key tuples of a result frame, row by row.
pub(crate) fn extract_keys(frame: &DataFrame, group_by: &[String]) -> Result<Vec<GroupKey>> {
    let key_columns = group_by
        .iter()
        .map(|name| series_to_strings(frame.column(name)?.as_materialized_series()))
        .collect::<PolarsResult<Vec<_>>>()?;

    Ok((0..frame.height())
        .map(|row| key_columns.iter().map(|values| values[row].clone()).collect())
        .collect())
}

pub(crate) fn extract_counts(frame: &DataFrame, name: &str) -> Result<Vec<usize>> {
    let counts = frame
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::UInt64)?;
    Ok(counts
        .u64()?
        .into_iter()
        .map(|v| v.unwrap_or(0) as usize)
        .collect())
}

pub(crate) fn extract_floats(frame: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let values = frame
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}
