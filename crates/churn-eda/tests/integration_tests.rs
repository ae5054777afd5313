//! Integration tests for the churn analysis pipeline.
//!
//! These tests run the full analysis against the CSV fixtures.

use churn_eda::reporting::SECTION_TITLES;
use churn_eda::{
    Analysis, AnalysisConfig, AnalysisError, ConsoleReport, DatasetLoader, ErrorKind,
    QualityAuditor, Statistic,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn default_analysis() -> Analysis {
    Analysis::builder().build().expect("default config is valid")
}

fn run_fixture(filename: &str) -> Result<churn_eda::AnalysisReport, AnalysisError> {
    default_analysis().run_file(fixtures_path().join(filename))
}

fn string_key(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some(v.to_string())).collect()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_sample_with_null_markers() {
    let df = DatasetLoader::default()
        .load_csv(fixtures_path().join("bank_churners_sample.csv"))
        .unwrap();

    assert_eq!(df.shape(), (12, 12));
    // "NA" and the empty field are both missing
    assert_eq!(df.column("Marital_Status").unwrap().null_count(), 2);
    assert_eq!(df.column("Credit_Limit").unwrap().null_count(), 1);
}

#[test]
fn test_nonexistent_file_is_io_error() {
    let err = run_fixture("does_not_exist.csv").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_missing_status_column_is_schema_error() {
    let err = run_fixture("missing_status.csv").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert_eq!(err.exit_code(), 3);
    assert!(err.to_string().contains("Attrition_Flag"));
}

// ============================================================================
// Full Analysis
// ============================================================================

#[test]
fn test_full_analysis_sample() {
    let report = run_fixture("bank_churners_sample.csv").unwrap();

    assert_eq!(report.shape, (12, 12));
    assert_eq!(report.head.height(), 5);
    assert!(report.source.as_deref().unwrap().ends_with("bank_churners_sample.csv"));
    assert_eq!(report.columns.len(), 12);
}

#[test]
fn test_missing_report_sample() {
    let report = run_fixture("bank_churners_sample.csv").unwrap();
    let missing = &report.missing;

    assert_eq!(missing.total_missing(), 4);
    assert_eq!(missing.columns_with_missing().count(), 3);
    assert_eq!(missing.get("Marital_Status").unwrap().count, 2);
    assert!((missing.get("Marital_Status").unwrap().percentage - 16.666_666).abs() < 1e-4);
    assert_eq!(missing.get("CLIENTNUM").unwrap().count, 0);
}

#[test]
fn test_imputation_sample() {
    let report = run_fixture("bank_churners_sample.csv").unwrap();
    let table = &report.table;

    assert_eq!(report.imputation.remaining_nulls, 0);
    assert_eq!(report.imputation.cells_filled(), 4);

    let credit = table
        .column("Credit_Limit")
        .unwrap()
        .get(4)
        .unwrap()
        .try_extract::<f64>()
        .unwrap();
    assert_eq!(credit, 11656.0);

    let education = table.column("Education_Level").unwrap().get(6).unwrap();
    assert_eq!(education.get_str(), Some("Graduate"));

    let marital = table.column("Marital_Status").unwrap().get(3).unwrap();
    assert_eq!(marital.get_str(), Some("Married"));
}

#[test]
fn test_duplicates_sample() {
    let report = run_fixture("bank_churners_sample.csv").unwrap();
    let duplicates = &report.duplicates;

    assert_eq!(duplicates.exact.indices(), vec![10]);
    assert_eq!(duplicates.exact_preview.height(), 1);
    assert_eq!(duplicates.excluded_columns, vec!["CLIENTNUM".to_string()]);
    assert_eq!(duplicates.partial.indices(), vec![0, 9, 10, 11]);
    assert_eq!(duplicates.partial_preview.height(), 4);
}

#[test]
fn test_duplicates_match_auditor_on_loaded_table() {
    let df = DatasetLoader::default()
        .load_csv(fixtures_path().join("bank_churners_sample.csv"))
        .unwrap();

    let exact = QualityAuditor::duplicate_rows(&df).unwrap();
    assert_eq!(exact.count(), 1);
}

#[test]
fn test_aggregations_sample() {
    let report = run_fixture("bank_churners_sample.csv").unwrap();
    assert_eq!(report.aggregates.len(), 3);

    let age_gender = &report.aggregates[0];
    assert_eq!(age_gender.result.groups.len(), 9);
    assert_eq!(age_gender.display_limit, Some(5));
    assert_eq!(
        age_gender
            .result
            .get(&[Some("45"), Some("M")], "Credit_Limit", Statistic::Mean),
        Some(12691.0)
    );
    assert_eq!(
        age_gender
            .result
            .get(&[Some("48"), Some("M")], "Total_Trans_Amt", Statistic::Sum),
        Some(2882.0)
    );
    // sorted by key: youngest first
    assert_eq!(age_gender.result.groups[0].key, string_key(&["32", "M"]));

    let education = &report.aggregates[1].result;
    let keys: Vec<_> = education.groups.iter().map(|g| g.key.clone()).collect();
    assert_eq!(
        keys,
        vec![
            string_key(&["Graduate"]),
            string_key(&["High School"]),
            string_key(&["Uneducated"]),
        ]
    );
    let graduate = [Some("Graduate")];
    assert_eq!(education.get(&graduate, "Credit_Limit", Statistic::Mean), Some(12252.0));
    assert_eq!(education.get(&graduate, "Credit_Limit", Statistic::Median), Some(9956.0));
    assert_eq!(education.get(&graduate, "Total_Trans_Amt", Statistic::Sum), Some(8478.0));

    let income = &report.aggregates[2].result;
    assert_eq!(income.groups.len(), 5);
}

#[test]
fn test_churn_rates_sample() {
    let report = run_fixture("bank_churners_sample.csv").unwrap();

    assert_eq!(report.churn_flags.attrited, 5);
    assert_eq!(report.churn_flags.existing, 7);
    assert_eq!(report.churn_flags.undefined, 0);

    let rates = &report.churn_rates;
    assert_eq!(
        rates.group_by,
        vec!["Education_Level", "Income_Category", "Card_Category"]
    );

    let order: Vec<Vec<Option<String>>> = rates.rows.iter().map(|r| r.key.clone()).collect();
    assert_eq!(
        order,
        vec![
            string_key(&["High School", "Less than $40K", "Blue"]),
            string_key(&["Graduate", "$40K - $60K", "Blue"]),
            string_key(&["High School", "$60K - $80K", "Silver"]),
            string_key(&["Graduate", "$80K - $120K", "Blue"]),
            string_key(&["High School", "$60K - $80K", "Blue"]),
            string_key(&["Graduate", "Less than $40K", "Blue"]),
            string_key(&["Uneducated", "$60K - $80K", "Blue"]),
            string_key(&["Graduate", "$120K +", "Gold"]),
        ]
    );

    let rate = rates.rows[3].rate.unwrap();
    assert!((rate - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(rates.rows[3].customers, 3);

    // non-increasing
    let values: Vec<f64> = rates.rows.iter().map(|r| r.rate.unwrap()).collect();
    assert!(values.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_churn_flag_column_appended() {
    let report = run_fixture("bank_churners_sample.csv").unwrap();
    let flag = report.table.column("Churn_Flag").unwrap();

    assert_eq!(flag.dtype(), &DataType::Int32);
    assert_eq!(flag.null_count(), 0);
    assert_eq!(report.table.width(), 13);
}

// ============================================================================
// Failure Modes
// ============================================================================

#[test]
fn test_all_null_column_is_imputation_error() {
    let err = run_fixture("all_null_column.csv").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Imputation);
    assert_eq!(err.exit_code(), 4);
    assert!(err.to_string().contains("Avg_Utilization_Ratio"));
}

#[test]
fn test_unknown_metric_column_is_aggregation_error() {
    let mut df = DatasetLoader::default()
        .load_csv(fixtures_path().join("bank_churners_sample.csv"))
        .unwrap();
    df.rename("Total_Trans_Ct", "Total_Trans_Count".into()).unwrap();

    let err = default_analysis().run(df).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Aggregation);
    assert_eq!(err.exit_code(), 5);
}

#[test]
fn test_exit_codes_distinct_and_nonzero() {
    let errors = [
        AnalysisError::LoadFailed {
            path: "x.csv".into(),
            reason: "bad".into(),
        },
        AnalysisError::MissingColumn("x".into()),
        AnalysisError::ImputationFailed {
            column: "x".into(),
            reason: "bad".into(),
        },
        AnalysisError::AggregationFailed {
            column: "x".into(),
            reason: "bad".into(),
        },
        AnalysisError::InvalidConfig("bad".into()),
        AnalysisError::Polars(PolarsError::NoData("empty".into())),
    ];

    let mut codes: Vec<u8> = errors.iter().map(AnalysisError::exit_code).collect();
    assert!(codes.iter().all(|c| *c != 0));
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_json_config_with_renamed_status() {
    let config =
        AnalysisConfig::from_json_file(fixtures_path().join("renamed_status_config.json")).unwrap();
    assert_eq!(config.columns.status, "Status");
    assert_eq!(config.columns.id, "CLIENTNUM");
    assert_eq!(config.preview_rows, 3);

    let report = Analysis::builder()
        .config(config)
        .build()
        .unwrap()
        .run_file(fixtures_path().join("renamed_status.csv"))
        .unwrap();

    assert_eq!(report.head.height(), 3);
    assert_eq!(report.churn_flags.undefined, 1);

    let rates = &report.churn_rates.rows;
    assert_eq!(rates.len(), 2);
    assert_eq!(rates[0].key, string_key(&["Graduate", "Less than $40K", "Blue"]));
    assert_eq!(rates[0].rate, Some(1.0));
    // the undefined status is left out of the mean, not counted as retained
    assert_eq!(rates[1].customers, 2);
    assert_eq!(rates[1].rate, Some(0.0));
}

#[test]
fn test_default_status_column_missing_in_renamed_fixture() {
    let err = run_fixture("renamed_status.csv").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
}

// ============================================================================
// Console Report
// ============================================================================

#[test]
fn test_console_report_sections_in_order() {
    let report = run_fixture("bank_churners_sample.csv").unwrap();
    let text = ConsoleReport::render(&report);

    let positions: Vec<usize> = SECTION_TITLES
        .iter()
        .map(|title| {
            text.find(&format!("\n{}", title))
                .unwrap_or_else(|| panic!("section {} missing", title))
        })
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));

    assert_eq!(text.matches("\nGROUPED STATISTICS: ").count(), 3);
    assert!(text.contains("... 5 of 9 groups shown"));
    assert!(text.contains("High School / Less than $40K / Blue"));
}
