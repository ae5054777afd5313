use crate::config::ColumnMapping;
use crate::types::Statistic;

/// Statistics requested for one metric column.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    pub column: String,
    pub statistics: Vec<Statistic>,
}

/// Description of one grouped aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRequest {
    /// Title used in logs and report headings.
    pub name: String,
    pub group_by: Vec<String>,
    pub metrics: Vec<MetricSpec>,
    /// Sort groups by key ascending (nulls last) instead of first-seen order.
    pub sort_by_keys: bool,
}

impl AggregationRequest {
    pub fn new<I, S>(name: impl Into<String>, group_by: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            group_by: group_by.into_iter().map(Into::into).collect(),
            metrics: Vec::new(),
            sort_by_keys: false,
        }
    }

    /// Add statistics for a metric column.
    pub fn metric(mut self, column: impl Into<String>, statistics: &[Statistic]) -> Self {
        self.metrics.push(MetricSpec {
            column: column.into(),
            statistics: statistics.to_vec(),
        });
        self
    }

    pub fn sorted_by_keys(mut self, sort: bool) -> Self {
        self.sort_by_keys = sort;
        self
    }

    /// `(metric, statistic)` pairs in output order.
    pub fn output_columns(&self) -> Vec<(&str, Statistic)> {
        self.metrics
            .iter()
            .flat_map(|m| m.statistics.iter().map(move |s| (m.column.as_str(), *s)))
            .collect()
    }

    /// Credit limit, transaction amount and count by age and gender.
    pub fn age_gender(columns: &ColumnMapping) -> Self {
        Self::new("Age and Gender", [columns.age.as_str(), columns.gender.as_str()])
            .metric(
                columns.credit_limit.as_str(),
                &[Statistic::Mean, Statistic::Median, Statistic::Min, Statistic::Max],
            )
            .with_transaction_metrics(columns)
            .sorted_by_keys(true)
    }

    /// Credit limit, transaction amount and count by education level.
    pub fn education(columns: &ColumnMapping) -> Self {
        Self::by_single_category("Education Level", &columns.education, columns)
    }

    /// Credit limit, transaction amount and count by income category.
    pub fn income(columns: &ColumnMapping) -> Self {
        Self::by_single_category("Income Category", &columns.income, columns)
    }

    /// The three aggregations of the standard report, in report order.
    pub fn standard(columns: &ColumnMapping) -> Vec<Self> {
        vec![
            Self::age_gender(columns),
            Self::education(columns),
            Self::income(columns),
        ]
    }

    fn by_single_category(name: &str, key: &str, columns: &ColumnMapping) -> Self {
        Self::new(name, [key])
            .metric(
                columns.credit_limit.as_str(),
                &[Statistic::Mean, Statistic::Median],
            )
            .with_transaction_metrics(columns)
            .sorted_by_keys(true)
    }

    fn with_transaction_metrics(self, columns: &ColumnMapping) -> Self {
        self.metric(
            columns.transaction_amount.as_str(),
            &[Statistic::Mean, Statistic::Sum],
        )
        .metric(
            columns.transaction_count.as_str(),
            &[Statistic::Mean, Statistic::Sum],
        )
    }
}
