//! Configuration types for the churn analysis pipeline.
//!
//! This module provides configuration options using the builder pattern.
//! A configuration can also be loaded from a (partial) JSON file; missing
//! fields fall back to the defaults, which match the bank-churners dataset.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Names of the dataset columns the analysis relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    /// Customer identifier, excluded from partial duplicate detection.
    pub id: String,
    /// Customer status (attrited or existing).
    pub status: String,
    pub age: String,
    pub gender: String,
    pub education: String,
    pub income: String,
    pub card_category: String,
    pub credit_limit: String,
    pub transaction_amount: String,
    pub transaction_count: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            id: "CLIENTNUM".to_string(),
            status: "Attrition_Flag".to_string(),
            age: "Customer_Age".to_string(),
            gender: "Gender".to_string(),
            education: "Education_Level".to_string(),
            income: "Income_Category".to_string(),
            card_category: "Card_Category".to_string(),
            credit_limit: "Credit_Limit".to_string(),
            transaction_amount: "Total_Trans_Amt".to_string(),
            transaction_count: "Total_Trans_Ct".to_string(),
        }
    }
}

impl ColumnMapping {
    /// Iterate over `(field, column name)` pairs.
    pub fn entries(&self) -> [(&'static str, &str); 10] {
        [
            ("id", self.id.as_str()),
            ("status", self.status.as_str()),
            ("age", self.age.as_str()),
            ("gender", self.gender.as_str()),
            ("education", self.education.as_str()),
            ("income", self.income.as_str()),
            ("card_category", self.card_category.as_str()),
            ("credit_limit", self.credit_limit.as_str()),
            ("transaction_amount", self.transaction_amount.as_str()),
            ("transaction_count", self.transaction_count.as_str()),
        ]
    }
}

/// Textual markers read as missing values when loading a CSV.
pub const DEFAULT_NULL_MARKERS: [&str; 8] = ["", "NA", "N/A", "NaN", "nan", "null", "NULL", "#N/A"];

/// Configuration for the analysis pipeline.
///
/// Use [`AnalysisConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use churn_eda::config::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .preview_rows(10)
///     .id_column("customer_id")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Dataset column names.
    pub columns: ColumnMapping,

    /// Status value mapped to a churn flag of 1.
    /// Default: "Attrited Customer"
    pub attrited_value: String,

    /// Status value mapped to a churn flag of 0.
    /// Default: "Existing Customer"
    pub existing_value: String,

    /// Name of the derived churn flag column.
    /// Default: "Churn_Flag"
    pub churn_flag_column: String,

    /// Number of rows shown in head and duplicate previews.
    /// Default: 5
    pub preview_rows: usize,

    /// Strings read as missing values by the loader.
    pub null_markers: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMapping::default(),
            attrited_value: "Attrited Customer".to_string(),
            existing_value: "Existing Customer".to_string(),
            churn_flag_column: "Churn_Flag".to_string(),
            preview_rows: 5,
            null_markers: DEFAULT_NULL_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Load a configuration from a JSON file and validate it.
    ///
    /// Fields absent from the file keep their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: AnalysisConfig = serde_json::from_str(&content).map_err(|e| {
            AnalysisError::InvalidConfig(format!("{}: {}", path.as_ref().display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        for (field, name) in self.columns.entries() {
            if name.trim().is_empty() {
                return Err(ConfigValidationError::EmptyColumnName(field.to_string()));
            }
        }

        if self.churn_flag_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyColumnName(
                "churn_flag_column".to_string(),
            ));
        }

        if let Some((field, _)) = self
            .columns
            .entries()
            .into_iter()
            .find(|(_, name)| *name == self.churn_flag_column)
        {
            return Err(ConfigValidationError::FlagColumnConflict {
                flag: self.churn_flag_column.clone(),
                field: field.to_string(),
            });
        }

        if self.preview_rows == 0 {
            return Err(ConfigValidationError::InvalidPreviewRows(self.preview_rows));
        }

        if self.attrited_value == self.existing_value {
            return Err(ConfigValidationError::AmbiguousStatusValues(
                self.attrited_value.clone(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Column name for '{0}' must not be empty")]
    EmptyColumnName(String),

    #[error("Invalid preview rows: {0} (must be at least 1)")]
    InvalidPreviewRows(usize),

    #[error("Attrited and existing status values must differ (both are '{0}')")]
    AmbiguousStatusValues(String),

    #[error("Churn flag column '{flag}' would overwrite the '{field}' column")]
    FlagColumnConflict { flag: String, field: String },
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    base: Option<AnalysisConfig>,
    id_column: Option<String>,
    status_column: Option<String>,
    attrited_value: Option<String>,
    existing_value: Option<String>,
    churn_flag_column: Option<String>,
    preview_rows: Option<usize>,
    null_markers: Option<Vec<String>>,
}

impl AnalysisConfigBuilder {
    /// Start from an existing configuration (e.g. one loaded from a file)
    /// instead of the defaults.
    pub fn base(mut self, config: AnalysisConfig) -> Self {
        self.base = Some(config);
        self
    }

    /// Set the identifier column name.
    pub fn id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = Some(column.into());
        self
    }

    /// Set the status column name.
    pub fn status_column(mut self, column: impl Into<String>) -> Self {
        self.status_column = Some(column.into());
        self
    }

    /// Set the status value counted as churned.
    pub fn attrited_value(mut self, value: impl Into<String>) -> Self {
        self.attrited_value = Some(value.into());
        self
    }

    /// Set the status value counted as retained.
    pub fn existing_value(mut self, value: impl Into<String>) -> Self {
        self.existing_value = Some(value.into());
        self
    }

    /// Set the name of the derived churn flag column.
    pub fn churn_flag_column(mut self, column: impl Into<String>) -> Self {
        self.churn_flag_column = Some(column.into());
        self
    }

    /// Set how many rows the previews show.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Replace the strings read as missing values.
    pub fn null_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_markers = Some(markers.into_iter().map(Into::into).collect());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<AnalysisConfig, ConfigValidationError> {
        let mut config = self.base.unwrap_or_default();

        if let Some(id) = self.id_column {
            config.columns.id = id;
        }
        if let Some(status) = self.status_column {
            config.columns.status = status;
        }
        if let Some(value) = self.attrited_value {
            config.attrited_value = value;
        }
        if let Some(value) = self.existing_value {
            config.existing_value = value;
        }
        if let Some(column) = self.churn_flag_column {
            config.churn_flag_column = column;
        }
        if let Some(rows) = self.preview_rows {
            config.preview_rows = rows;
        }
        if let Some(markers) = self.null_markers {
            config.null_markers = markers;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.columns.id, "CLIENTNUM");
        assert_eq!(config.columns.status, "Attrition_Flag");
        assert_eq!(config.attrited_value, "Attrited Customer");
        assert_eq!(config.preview_rows, 5);
        assert!(config.null_markers.iter().any(|m| m == "NA"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AnalysisConfig::builder()
            .id_column("customer_id")
            .status_column("status")
            .attrited_value("churned")
            .existing_value("active")
            .preview_rows(10)
            .build()
            .unwrap();

        assert_eq!(config.columns.id, "customer_id");
        assert_eq!(config.columns.status, "status");
        assert_eq!(config.attrited_value, "churned");
        assert_eq!(config.existing_value, "active");
        assert_eq!(config.preview_rows, 10);
        // Untouched fields keep defaults
        assert_eq!(config.columns.credit_limit, "Credit_Limit");
    }

    #[test]
    fn test_validation_zero_preview_rows() {
        let result = AnalysisConfig::builder().preview_rows(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidPreviewRows(0)
        ));
    }

    #[test]
    fn test_validation_empty_column_name() {
        let result = AnalysisConfig::builder().id_column("  ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyColumnName(field) if field == "id"
        ));
    }

    #[test]
    fn test_validation_same_status_values() {
        let result = AnalysisConfig::builder()
            .attrited_value("x")
            .existing_value("x")
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::AmbiguousStatusValues(_)
        ));
    }

    #[test]
    fn test_validation_flag_column_overwrites_status() {
        let result = AnalysisConfig::builder()
            .churn_flag_column("Attrition_Flag")
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::FlagColumnConflict { field, .. } if field == "status"
        ));
    }

    #[test]
    fn test_validation_flag_column_overwrites_group_column() {
        let result = AnalysisConfig::builder()
            .churn_flag_column("Card_Category")
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::FlagColumnConflict { field, .. } if field == "card_category"
        ));
    }

    #[test]
    fn test_from_json_file_malformed_is_config_error() {
        let path = std::env::temp_dir().join("churn_eda_config_malformed.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{ "preview_rows": "five" "#).unwrap();

        let err = AnalysisConfig::from_json_file(&path).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
        assert_eq!(err.exit_code(), 6);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "preview_rows": 3,
            "columns": { "id": "customer_id" }
        }"#;

        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.preview_rows, 3);
        assert_eq!(config.columns.id, "customer_id");
        assert_eq!(config.columns.status, "Attrition_Flag");
        assert_eq!(config.churn_flag_column, "Churn_Flag");
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join("churn_eda_config_test.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{ "attrited_value": "Churned" }}"#).unwrap();

        let config = AnalysisConfig::from_json_file(&path).unwrap();
        assert_eq!(config.attrited_value, "Churned");
        assert_eq!(config.existing_value, "Existing Customer");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_builder_overrides_base() {
        let base = AnalysisConfig {
            preview_rows: 8,
            ..AnalysisConfig::default()
        };
        let config = AnalysisConfig::builder()
            .base(base)
            .status_column("Status")
            .build()
            .unwrap();

        assert_eq!(config.preview_rows, 8);
        assert_eq!(config.columns.status, "Status");
    }
}
