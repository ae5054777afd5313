use serde::{Deserialize, Serialize};
use std::fmt;

/// Stages of an analysis run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    /// Reading the CSV source
    Loading,
    /// Classifying columns and building the schema overview
    Profiling,
    /// Counting missing values per column
    MissingValues,
    /// Filling missing values
    Imputation,
    /// Exact and partial duplicate detection
    Duplicates,
    /// Grouped statistics
    Aggregation,
    /// Churn flag and per-group churn rates
    ChurnRate,
}

impl AnalysisStage {
    /// Every stage that runs on a loaded table, in order.
    pub const ANALYSIS: [AnalysisStage; 6] = [
        Self::Profiling,
        Self::MissingValues,
        Self::Imputation,
        Self::Duplicates,
        Self::Aggregation,
        Self::ChurnRate,
    ];

    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Dataset",
            Self::Profiling => "Profiling Dataset",
            Self::MissingValues => "Counting Missing Values",
            Self::Imputation => "Imputing Values",
            Self::Duplicates => "Detecting Duplicates",
            Self::Aggregation => "Aggregating Groups",
            Self::ChurnRate => "Computing Churn Rates",
        }
    }

    /// 1-based position among the analysis stages; loading is step 0.
    pub fn step(&self) -> usize {
        Self::ANALYSIS
            .iter()
            .position(|s| s == self)
            .map_or(0, |i| i + 1)
    }
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_steps_follow_execution_order() {
        assert_eq!(AnalysisStage::Loading.step(), 0);
        assert_eq!(AnalysisStage::Profiling.step(), 1);
        assert_eq!(AnalysisStage::Imputation.step(), 3);
        assert_eq!(AnalysisStage::ChurnRate.step(), 6);
    }

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&AnalysisStage::MissingValues).unwrap();
        assert_eq!(json, "\"missing_values\"");
    }
}
