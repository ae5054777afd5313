use crate::error::{AnalysisError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Column descriptors
// ============================================================================

/// Semantic type of a column. Decides which fill statistic applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => write!(f, "numeric"),
            Self::Categorical => write!(f, "categorical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
    pub dtype: DataType,
}

/// Column descriptors of a table, in table order.
///
/// Computed once after loading by [`crate::profiler::TableProfiler::describe`]
/// and passed to every downstream stage.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableSchema {
    columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column that must exist.
    pub fn require(&self, name: &str) -> Result<&ColumnDescriptor> {
        self.get(name)
            .ok_or_else(|| AnalysisError::MissingColumn(name.to_string()))
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
    }

    pub fn categorical_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Categorical)
    }

    /// Record a column appended after profiling (e.g. the churn flag).
    pub fn push(&mut self, descriptor: ColumnDescriptor) {
        self.columns.retain(|c| c.name != descriptor.name);
        self.columns.push(descriptor);
    }

    /// Update stored dtypes from the frame without re-inferring kinds.
    pub fn refresh_dtypes(&mut self, df: &DataFrame) {
        for descriptor in &mut self.columns {
            if let Ok(column) = df.column(&descriptor.name) {
                descriptor.dtype = column.dtype().clone();
            }
        }
    }
}

/// One row of the schema overview printed after loading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub kind: ColumnKind,
    pub non_null: usize,
}

// ============================================================================
// Quality audit results
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingEntry {
    pub column: String,
    pub count: usize,
    /// 100 * count / total rows (0 for an empty table)
    pub percentage: f64,
}

/// Per-column missing counts, one entry per column in table order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingReport {
    pub total_rows: usize,
    pub entries: Vec<MissingEntry>,
}

impl MissingReport {
    pub fn total_missing(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn columns_with_missing(&self) -> impl Iterator<Item = &MissingEntry> {
        self.entries.iter().filter(|e| e.count > 0)
    }

    pub fn get(&self, column: &str) -> Option<&MissingEntry> {
        self.entries.iter().find(|e| e.column == column)
    }
}

/// Row membership flags produced by duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DuplicateSet {
    mask: Vec<bool>,
}

impl DuplicateSet {
    pub fn from_mask(mask: Vec<bool>) -> Self {
        Self { mask }
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn contains(&self, row: usize) -> bool {
        self.mask.get(row).copied().unwrap_or(false)
    }

    /// Flagged row indices, ascending.
    pub fn indices(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(i, &flagged)| flagged.then_some(i))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&flagged| flagged).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

// ============================================================================
// Imputation results
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FillValue {
    Median(f64),
    Mode(String),
}

impl fmt::Display for FillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Median(v) => write!(f, "median {:.2}", v),
            Self::Mode(v) => write!(f, "mode '{}'", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnFill {
    pub column: String,
    pub kind: ColumnKind,
    pub filled: usize,
    pub value: FillValue,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ImputationOutcome {
    pub fills: Vec<ColumnFill>,
    /// Nulls left anywhere in the table after imputation.
    pub remaining_nulls: usize,
}

impl ImputationOutcome {
    pub fn cells_filled(&self) -> usize {
        self.fills.iter().map(|f| f.filled).sum()
    }
}

// ============================================================================
// Aggregation results
// ============================================================================

/// Summary statistic computed per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Mean,
    Median,
    Min,
    Max,
    Sum,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Min => "min",
            Self::Max => "max",
            Self::Sum => "sum",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Statistic {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "sum" => Ok(Self::Sum),
            other => Err(AnalysisError::InvalidConfig(format!(
                "unknown statistic '{}'",
                other
            ))),
        }
    }
}

/// Values of the grouping columns for one group; `None` is a null key value.
pub type GroupKey = Vec<Option<String>>;

#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub key: GroupKey,
    pub rows: usize,
    /// Aligned with [`GroupedAggregate::columns`].
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone)]
pub struct GroupedAggregate {
    pub group_by: Vec<String>,
    /// `(metric column, statistic)` pairs in output order.
    pub columns: Vec<(String, Statistic)>,
    pub groups: Vec<GroupStats>,
    /// Result frame: key columns, `rows`, then one `{metric}_{stat}` column per pair.
    pub frame: DataFrame,
}

impl GroupedAggregate {
    pub fn group(&self, key: &[Option<&str>]) -> Option<&GroupStats> {
        self.groups.iter().find(|g| {
            g.key.len() == key.len()
                && g.key.iter().zip(key).all(|(a, b)| a.as_deref() == *b)
        })
    }

    /// Look up one statistic for one group.
    pub fn get(&self, key: &[Option<&str>], metric: &str, stat: Statistic) -> Option<f64> {
        let idx = self
            .columns
            .iter()
            .position(|(m, s)| m == metric && *s == stat)?;
        self.group(key).and_then(|g| g.values[idx])
    }
}

// ============================================================================
// Churn results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChurnFlagSummary {
    pub attrited: usize,
    pub existing: usize,
    /// Rows whose status matched neither value (including nulls).
    pub undefined: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChurnRateRow {
    pub key: GroupKey,
    pub customers: usize,
    /// Mean churn flag over rows with a defined flag.
    pub rate: Option<f64>,
}

/// Churn rate per group, sorted by rate descending.
#[derive(Debug, Clone)]
pub struct ChurnRateTable {
    pub group_by: Vec<String>,
    pub rows: Vec<ChurnRateRow>,
    pub frame: DataFrame,
}

// ============================================================================
// Analysis report
// ============================================================================

/// Exact and partial duplicate findings with preview rows.
#[derive(Debug, Clone)]
pub struct DuplicateSummary {
    pub exact: DuplicateSet,
    pub exact_preview: DataFrame,
    /// Columns ignored when matching partial duplicates.
    pub excluded_columns: Vec<String>,
    pub partial: DuplicateSet,
    pub partial_preview: DataFrame,
}

/// One grouped-statistics table of the report.
#[derive(Debug, Clone)]
pub struct AggregateSection {
    pub title: String,
    pub result: GroupedAggregate,
    /// Show only this many groups when set.
    pub display_limit: Option<usize>,
}

/// Everything a single analysis run produced, in report order.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub generated_at: String,
    pub source: Option<String>,
    /// `(rows, columns)` of the table as loaded.
    pub shape: (usize, usize),
    pub head: DataFrame,
    pub columns: Vec<ColumnInfo>,
    pub missing: MissingReport,
    pub imputation: ImputationOutcome,
    pub duplicates: DuplicateSummary,
    pub aggregates: Vec<AggregateSection>,
    pub churn_flags: ChurnFlagSummary,
    pub churn_rates: ChurnRateTable,
    /// The imputed table with the churn flag appended.
    pub table: DataFrame,
    pub duration_ms: u64,
}
