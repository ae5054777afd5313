//! Error types for the churn analysis pipeline.
//!
//! Every stage returns [`Result`]; nothing is recovered locally because each
//! stage feeds the next. The binary maps an error's [`ErrorKind`] to a
//! distinct process exit code.

use thiserror::Error;

/// Broad category of an [`AnalysisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source could not be read or parsed.
    Io,
    /// A required column is absent.
    Schema,
    /// A column has no computable fill statistic.
    Imputation,
    /// A requested aggregation cannot be computed.
    Aggregation,
    /// The configuration is invalid.
    Config,
    /// Anything else (polars internals, serialization).
    Internal,
}

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The dataset could not be loaded or parsed into rows and columns.
    #[error("Failed to load dataset '{path}': {reason}")]
    LoadFailed { path: String, reason: String },

    /// A required column was not found in the dataset.
    #[error("Required column '{0}' not found in dataset")]
    MissingColumn(String),

    /// Imputation failed.
    #[error("Failed to impute missing values in column '{column}': {reason}")]
    ImputationFailed { column: String, reason: String },

    /// Aggregation failed.
    #[error("Failed to aggregate column '{column}': {reason}")]
    AggregationFailed { column: String, reason: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::LoadFailed { .. } => "LOAD_FAILED",
            Self::MissingColumn(_) => "MISSING_COLUMN",
            Self::ImputationFailed { .. } => "IMPUTATION_FAILED",
            Self::AggregationFailed { .. } => "AGGREGATION_FAILED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Category of this error. Context wrappers report their source's kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LoadFailed { .. } | Self::Io(_) => ErrorKind::Io,
            Self::MissingColumn(_) => ErrorKind::Schema,
            Self::ImputationFailed { .. } => ErrorKind::Imputation,
            Self::AggregationFailed { .. } => ErrorKind::Aggregation,
            Self::InvalidConfig(_) => ErrorKind::Config,
            Self::Polars(_) | Self::Json(_) => ErrorKind::Internal,
            Self::WithContext { source, .. } => source.kind(),
        }
    }

    /// Process exit code for this error. Never 0.
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Internal => 1,
            ErrorKind::Io => 2,
            ErrorKind::Schema => 3,
            ErrorKind::Imputation => 4,
            ErrorKind::Aggregation => 5,
            ErrorKind::Config => 6,
        }
    }
}

impl From<crate::config::ConfigValidationError> for AnalysisError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        AnalysisError::InvalidConfig(err.to_string())
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Polars(e).with_context(context))
    }
}
