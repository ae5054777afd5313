//! The analysis pipeline.
//!
//! [`Analysis`] runs every stage against one table in a fixed order and
//! collects the results into an [`AnalysisReport`].

use crate::aggregate::{AggregationRequest, Aggregator};
use crate::churn::ChurnCalculator;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::imputers::StatisticalImputer;
use crate::loader::{require_columns, DatasetLoader};
use crate::pipeline::AnalysisStage;
use crate::profiler::TableProfiler;
use crate::quality::QualityAuditor;
use crate::types::{AggregateSection, AnalysisReport, DuplicateSummary};
use chrono::Local;
use polars::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// The churn analysis pipeline.
///
/// Use [`Analysis::builder()`] to create one with a custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use churn_eda::{Analysis, AnalysisConfig};
///
/// let config = AnalysisConfig::builder().preview_rows(10).build()?;
/// let analysis = Analysis::builder().config(config).build()?;
///
/// let df = analysis.load("data/BankChurners.csv")?;
/// let report = analysis.run(df)?;
/// println!("{} groups", report.churn_rates.rows.len());
/// ```
#[derive(Debug, Clone)]
pub struct Analysis {
    config: AnalysisConfig,
}

impl Analysis {
    /// Create a new analysis builder.
    pub fn builder() -> AnalysisBuilder {
        AnalysisBuilder::default()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Load the dataset and check that the identifier and status columns exist.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        info!("Loading dataset from: {}", path.display());

        let df = DatasetLoader::from_config(&self.config).load_csv(path)?;
        require_columns(
            &df,
            [
                self.config.columns.id.as_str(),
                self.config.columns.status.as_str(),
            ],
        )?;
        Ok(df)
    }

    /// Load a CSV file and run every stage on it.
    pub fn run_file(&self, path: impl AsRef<Path>) -> Result<AnalysisReport> {
        let path = path.as_ref();
        let df = self
            .load(path)
            .map_err(|e| e.with_context(AnalysisStage::Loading.display_name()))?;

        let mut report = self.run(df)?;
        report.source = Some(path.display().to_string());
        Ok(report)
    }

    /// Run every stage on an already loaded table.
    ///
    /// A failing stage aborts the run; later stages never see a partial
    /// result.
    pub fn run(&self, df: DataFrame) -> Result<AnalysisReport> {
        let report = self.run_internal(df)?;
        info!("Analysis completed in {}ms", report.duration_ms);
        Ok(report)
    }

    fn run_internal(&self, mut df: DataFrame) -> Result<AnalysisReport> {
        let start_time = Instant::now();
        let config = &self.config;
        let columns = &config.columns;

        info!("Starting churn analysis...");
        let shape = df.shape();

        // Step 1: profile once; kinds are reused by every later stage
        let (mut schema, head, column_info) = stage(AnalysisStage::Profiling, || {
            let schema = TableProfiler::describe(&df);
            let head = df.head(Some(config.preview_rows));
            let column_info = TableProfiler::column_info(&df, &schema);
            debug!(
                "{} numeric, {} categorical columns",
                schema.numeric_columns().count(),
                schema.categorical_columns().count()
            );
            Ok((schema, head, column_info))
        })?;

        // Step 2: missing values, before anything is filled
        let missing = stage(AnalysisStage::MissingValues, || {
            Ok(QualityAuditor::missing_report(&df))
        })?;

        // Step 3: imputation is the only in-place mutation of the loaded table
        let imputation = stage(AnalysisStage::Imputation, || {
            StatisticalImputer::impute(&mut df, &schema)
        })?;
        schema.refresh_dtypes(&df);

        // Step 4: duplicates
        let duplicates = stage(AnalysisStage::Duplicates, || {
            let exact = QualityAuditor::duplicate_rows(&df)?;
            let exact_preview = QualityAuditor::select_rows(&df, &exact, config.preview_rows)?;

            let excluded = [columns.id.as_str()];
            let partial = QualityAuditor::partial_duplicate_rows(&df, &excluded)?;
            let partial_preview =
                QualityAuditor::select_rows(&df, &partial, config.preview_rows)?;

            Ok(DuplicateSummary {
                exact,
                exact_preview,
                excluded_columns: excluded.iter().map(|c| c.to_string()).collect(),
                partial,
                partial_preview,
            })
        })?;

        // Step 5: grouped statistics
        let aggregates = stage(AnalysisStage::Aggregation, || {
            AggregationRequest::standard(columns)
                .into_iter()
                .enumerate()
                .map(|(i, request)| {
                    let result = Aggregator::aggregate(&df, &schema, &request)?;
                    Ok(AggregateSection {
                        title: request.name,
                        result,
                        // the age/gender table has one group per age and is cut short
                        display_limit: (i == 0).then_some(config.preview_rows),
                    })
                })
                .collect::<Result<Vec<_>>>()
        })?;

        // Step 6: churn
        let (churn_flags, churn_rates) = stage(AnalysisStage::ChurnRate, || {
            let calculator = ChurnCalculator::from_config(config);
            let flags = calculator.add_churn_flag(&mut df)?;
            let group_by = [
                columns.education.clone(),
                columns.income.clone(),
                columns.card_category.clone(),
            ];
            let rates = calculator.churn_rate(&df, &group_by)?;
            Ok((flags, rates))
        })?;

        Ok(AnalysisReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            source: None,
            shape,
            head,
            columns: column_info,
            missing,
            imputation,
            duplicates,
            aggregates,
            churn_flags,
            churn_rates,
            table: df,
            duration_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}

/// Run one stage, logging entry and tagging any error with the stage name.
fn stage<T>(stage: AnalysisStage, f: impl FnOnce() -> Result<T>) -> Result<T> {
    info!("Step {}: {}...", stage.step(), stage.display_name());
    f().map_err(|e| e.with_context(stage.display_name()))
}

/// Builder for [`Analysis`].
#[derive(Debug, Default)]
pub struct AnalysisBuilder {
    config: Option<AnalysisConfig>,
}

impl AnalysisBuilder {
    /// Set the configuration. Defaults to [`AnalysisConfig::default()`].
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the analysis, validating the configuration.
    pub fn build(self) -> Result<Analysis> {
        let config = self.config.unwrap_or_default();
        config.validate().map_err(AnalysisError::from)?;
        Ok(Analysis { config })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn sample() -> DataFrame {
        df![
            "CLIENTNUM" => [1i64, 2, 3, 4, 5, 6],
            "Attrition_Flag" => [
                "Existing Customer", "Attrited Customer", "Existing Customer",
                "Attrited Customer", "Existing Customer", "Attrited Customer",
            ],
            "Customer_Age" => [45i64, 45, 50, 45, 50, 45],
            "Gender" => [Some("M"), Some("M"), Some("F"), None, Some("F"), Some("M")],
            "Education_Level" => ["Graduate", "Graduate", "College", "Graduate", "College", "Graduate"],
            "Income_Category" => ["$60K - $80K", "$60K - $80K", "Less than $40K", "$60K - $80K", "Less than $40K", "$60K - $80K"],
            "Card_Category" => ["Blue", "Blue", "Blue", "Gold", "Blue", "Blue"],
            "Credit_Limit" => [Some(1000.0), Some(2000.0), None, Some(4000.0), Some(5000.0), Some(2000.0)],
            "Total_Trans_Amt" => [100i64, 200, 300, 400, 500, 200],
            "Total_Trans_Ct" => [10i64, 20, 30, 40, 50, 20],
        ]
        .unwrap()
    }

    #[test]
    fn test_run_produces_every_section() {
        let analysis = Analysis::builder().build().unwrap();
        let report = analysis.run(sample()).unwrap();

        assert_eq!(report.shape, (6, 10));
        assert_eq!(report.head.height(), 5);
        assert_eq!(report.columns.len(), 10);
        assert_eq!(report.missing.total_missing(), 2);
        assert_eq!(report.imputation.remaining_nulls, 0);
        assert_eq!(report.aggregates.len(), 3);
        assert_eq!(report.aggregates[0].display_limit, Some(5));
        assert_eq!(report.aggregates[1].display_limit, None);
        assert_eq!(report.churn_flags.attrited, 3);
        assert_eq!(report.table.width(), 11);
    }

    #[test]
    fn test_missing_report_reflects_table_before_imputation() {
        let analysis = Analysis::builder().build().unwrap();
        let report = analysis.run(sample()).unwrap();

        assert_eq!(report.missing.get("Credit_Limit").unwrap().count, 1);
        assert_eq!(report.table.column("Credit_Limit").unwrap().null_count(), 0);
    }

    #[test]
    fn test_partial_duplicates_ignore_identifier() {
        let analysis = Analysis::builder().build().unwrap();
        let report = analysis.run(sample()).unwrap();

        // rows 1 and 5 differ only in CLIENTNUM
        assert!(report.duplicates.exact.is_empty());
        assert_eq!(report.duplicates.partial.indices(), vec![1, 5]);
        assert_eq!(report.duplicates.partial_preview.height(), 2);
    }

    #[test]
    fn test_missing_aggregation_column_aborts() {
        let df = sample().drop("Total_Trans_Ct").unwrap();
        let analysis = Analysis::builder().build().unwrap();

        let err = analysis.run(df).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Aggregation);
        assert!(err.to_string().starts_with("Aggregating Groups"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AnalysisConfig::default();
        config.preview_rows = 0;

        let err = Analysis::builder().config(config).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
