//! Table profiling.
//!
//! Classifies each column as numeric or categorical once, right after
//! loading, and summarises the table's layout for the schema overview.

use crate::types::{ColumnDescriptor, ColumnInfo, TableSchema};
use crate::utils::column_kind;
use polars::prelude::*;
use tracing::debug;

/// Profiler for analyzing table structure.
pub struct TableProfiler;

impl TableProfiler {
    /// Build column descriptors from the frame's dtypes.
    pub fn describe(df: &DataFrame) -> TableSchema {
        let columns = df
            .get_columns()
            .iter()
            .map(|col| {
                let descriptor = ColumnDescriptor {
                    name: col.name().to_string(),
                    kind: column_kind(col.dtype()),
                    dtype: col.dtype().clone(),
                };
                debug!(
                    "  {}: {} (kind: {})",
                    descriptor.name, descriptor.dtype, descriptor.kind
                );
                descriptor
            })
            .collect();

        TableSchema::new(columns)
    }

    /// Per-column overview: dtype, kind and non-null count.
    pub fn column_info(df: &DataFrame, schema: &TableSchema) -> Vec<ColumnInfo> {
        schema
            .columns()
            .iter()
            .filter_map(|descriptor| {
                let col = df.column(&descriptor.name).ok()?;
                Some(ColumnInfo {
                    name: descriptor.name.clone(),
                    dtype: col.dtype().to_string(),
                    kind: descriptor.kind,
                    non_null: col.len() - col.null_count(),
                })
            })
            .collect()
    }
}
