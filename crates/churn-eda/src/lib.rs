//! Customer Churn Exploratory Analysis Library
//!
//! Loads a tabular customer dataset with Polars, audits its quality, fills
//! missing values and summarises it by customer segment, ending with the
//! churn rate of every education / income / card segment.
//!
//! # Overview
//!
//! The analysis runs as a fixed sequence of stages over one table:
//!
//! - **Loading**: CSV parsing with lenient fallbacks and required-column checks
//! - **Profiling**: each column is classified as numeric or categorical once
//! - **Quality audit**: missing-value counts, exact and partial duplicate rows
//! - **Imputation**: median for numeric columns, mode for categorical ones
//! - **Aggregation**: grouped mean/median/min/max/sum of numeric metrics
//! - **Churn rate**: a binary flag derived from the status column, averaged per group
//!
//! Every failure aborts the run and carries an [`ErrorKind`] that the CLI
//! maps to a distinct exit code.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use churn_eda::{Analysis, AnalysisConfig, ConsoleReport};
//!
//! let analysis = Analysis::builder()
//!     .config(AnalysisConfig::default())
//!     .build()?;
//!
//! let report = analysis.run_file("data/BankChurners.csv")?;
//! println!("{}", ConsoleReport::render(&report));
//!
//! for row in report.churn_rates.rows.iter().take(3) {
//!     println!("{:?}: {:?}", row.key, row.rate);
//! }
//! ```
//!
//! # Configuration
//!
//! [`AnalysisConfig`] names the dataset columns and the status values that
//! mean "churned" and "still a customer":
//!
//! ```rust,ignore
//! use churn_eda::AnalysisConfig;
//!
//! let config = AnalysisConfig::builder()
//!     .status_column("Status")
//!     .attrited_value("Closed")
//!     .existing_value("Open")
//!     .preview_rows(10)
//!     .build()?;
//! ```
//!
//! # Using the stages directly
//!
//! Each stage is usable on its own:
//!
//! ```rust,ignore
//! use churn_eda::{Aggregator, AggregationRequest, Statistic, StatisticalImputer, TableProfiler};
//!
//! let schema = TableProfiler::describe(&df);
//! StatisticalImputer::impute(&mut df, &schema)?;
//!
//! let request = AggregationRequest::new("By card", ["Card_Category"])
//!     .metric("Credit_Limit", &[Statistic::Mean, Statistic::Median]);
//! let result = Aggregator::aggregate(&df, &schema, &request)?;
//! ```

pub mod aggregate;
pub mod churn;
pub mod config;
pub mod error;
pub mod imputers;
pub mod loader;
pub mod pipeline;
pub mod profiler;
pub mod quality;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use aggregate::{AggregationRequest, Aggregator, MetricSpec};
pub use churn::ChurnCalculator;
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ColumnMapping, ConfigValidationError};
pub use error::{AnalysisError, ErrorKind, Result as AnalysisResult, ResultExt};
pub use imputers::StatisticalImputer;
pub use loader::{DatasetLoader, require_columns};
pub use pipeline::{Analysis, AnalysisBuilder, AnalysisStage};
pub use profiler::TableProfiler;
pub use quality::QualityAuditor;
pub use reporting::ConsoleReport;
pub use types::{
    AggregateSection, AnalysisReport, ChurnFlagSummary, ChurnRateRow, ChurnRateTable,
    ColumnDescriptor, ColumnFill, ColumnInfo, ColumnKind, DuplicateSet, DuplicateSummary,
    FillValue, GroupKey, GroupStats, GroupedAggregate, ImputationOutcome, MissingEntry,
    MissingReport, Statistic, TableSchema,
};
