//! Dataset loading.
//!
//! Reads a CSV file into a [`DataFrame`], trying progressively more lenient
//! parse settings before giving up.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions, NullValues};
use polars::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const INFER_SCHEMA_ROWS: usize = 1000;

/// Loads record tables from CSV files.
pub struct DatasetLoader {
    null_markers: Vec<String>,
}

impl DatasetLoader {
    pub fn new(null_markers: Vec<String>) -> Self {
        Self { null_markers }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.null_markers.clone())
    }

    /// Load a CSV file with multiple fallback strategies.
    ///
    /// Fails with an IO-kind error when the file is unreadable or cannot be
    /// parsed into rows and columns.
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AnalysisError::LoadFailed {
                path: path.display().to_string(),
                reason: "file not found".to_string(),
            });
        }

        // Strategy 1: standard loading with quote handling
        match self.read_path(path, Some(b'"')) {
            Ok(df) => return self.finish(path, df),
            Err(e) => debug!("Standard loading failed: {}", e),
        }

        // Strategy 2: without quote handling
        match self.read_path(path, None) {
            Ok(df) => return self.finish(path, df),
            Err(e) => debug!("Loading without quotes failed: {}", e),
        }

        // Strategy 3: pre-clean content
        let content = std::fs::read_to_string(path)?;
        let cleaned = clean_csv_content(&content);
        let df = CsvReadOptions::default()
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .with_has_header(true)
            .with_parse_options(self.parse_options(Some(b'"')))
            .into_reader_with_file_handle(Cursor::new(cleaned))
            .finish()
            .map_err(|e| AnalysisError::LoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        self.finish(path, df)
    }

    fn read_path(&self, path: &Path, quote_char: Option<u8>) -> PolarsResult<DataFrame> {
        CsvReadOptions::default()
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .with_has_header(true)
            .with_parse_options(self.parse_options(quote_char))
            .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
            .finish()
    }

    fn parse_options(&self, quote_char: Option<u8>) -> CsvParseOptions {
        let markers: Vec<PlSmallStr> = self
            .null_markers
            .iter()
            .map(|m| PlSmallStr::from(m.as_str()))
            .collect();

        CsvParseOptions::default()
            .with_quote_char(quote_char)
            .with_null_values(Some(NullValues::AllColumns(markers)))
    }

    fn finish(&self, path: &Path, df: DataFrame) -> Result<DataFrame> {
        if df.width() == 0 {
            return Err(AnalysisError::LoadFailed {
                path: path.display().to_string(),
                reason: "no columns found".to_string(),
            });
        }
        info!("Dataset loaded. Shape: {:?}", df.shape());
        Ok(df)
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

/// Check that every named column exists in the frame.
///
/// Fails with a schema-kind error naming the first absent column.
pub fn require_columns<'a>(
    df: &DataFrame,
    columns: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    for name in columns {
        if df.column(name).is_err() {
            return Err(AnalysisError::MissingColumn(name.to_string()));
        }
    }
    Ok(())
}

/// Clean CSV content
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
