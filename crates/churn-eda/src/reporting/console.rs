use crate::types::{
    AggregateSection, AnalysisReport, ChurnRateTable, DuplicateSummary, ImputationOutcome,
    MissingReport,
};
use crate::utils::format_key;
use std::fmt::Write;

const RULE_WIDTH: usize = 80;

/// Section titles in the order they are rendered.
pub const SECTION_TITLES: [&str; 7] = [
    "HEAD PREVIEW",
    "SCHEMA INFO",
    "MISSING VALUES",
    "IMPUTATION",
    "DUPLICATES",
    "GROUPED STATISTICS",
    "CHURN RATE",
];

/// Renders an [`AnalysisReport`] as plain text for the terminal.
pub struct ConsoleReport;

impl ConsoleReport {
    pub fn render(report: &AnalysisReport) -> String {
        let mut out = String::new();

        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push('\n');
        out.push_str("CHURN ANALYSIS REPORT\n");
        out.push_str(&format!("Generated: {}\n", report.generated_at));
        if let Some(source) = &report.source {
            out.push_str(&format!("Source:    {}\n", source));
        }
        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push('\n');

        section(&mut out, SECTION_TITLES[0]);
        out.push_str(&format!("{}\n", report.head));

        section(&mut out, SECTION_TITLES[1]);
        Self::schema_info(&mut out, report);

        section(&mut out, SECTION_TITLES[2]);
        Self::missing_values(&mut out, &report.missing);

        section(&mut out, SECTION_TITLES[3]);
        Self::imputation(&mut out, &report.imputation);

        section(&mut out, SECTION_TITLES[4]);
        Self::duplicates(&mut out, &report.duplicates);

        for aggregate in &report.aggregates {
            section(
                &mut out,
                &format!("{}: {}", SECTION_TITLES[5], aggregate.title.to_uppercase()),
            );
            Self::aggregate(&mut out, aggregate);
        }

        section(
            &mut out,
            &format!(
                "{} BY {}",
                SECTION_TITLES[6],
                report.churn_rates.group_by.join(", ").to_uppercase()
            ),
        );
        Self::churn_rates(&mut out, report);

        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push('\n');
        out
    }

    fn schema_info(out: &mut String, report: &AnalysisReport) {
        let (rows, cols) = report.shape;
        let _ = writeln!(out, "Rows: {}  Columns: {}\n", rows, cols);

        let headers = ["Column", "Dtype", "Non-Null", "Kind"];
        let rows: Vec<Vec<String>> = report
            .columns
            .iter()
            .map(|c| {
                vec![
                    c.name.clone(),
                    c.dtype.clone(),
                    c.non_null.to_string(),
                    c.kind.to_string(),
                ]
            })
            .collect();
        out.push_str(&render_table(&headers, &rows));
    }

    fn missing_values(out: &mut String, missing: &MissingReport) {
        let headers = ["Column", "Missing", "Percent"];
        let rows: Vec<Vec<String>> = missing
            .entries
            .iter()
            .map(|e| {
                vec![
                    e.column.clone(),
                    e.count.to_string(),
                    format!("{:.2}%", e.percentage),
                ]
            })
            .collect();
        out.push_str(&render_table(&headers, &rows));
        let _ = writeln!(
            out,
            "\nTotal missing: {} across {} columns",
            missing.total_missing(),
            missing.columns_with_missing().count()
        );
    }

    fn imputation(out: &mut String, outcome: &ImputationOutcome) {
        if outcome.fills.is_empty() {
            out.push_str("No missing values to fill\n");
        } else {
            let headers = ["Column", "Kind", "Filled", "Value"];
            let rows: Vec<Vec<String>> = outcome
                .fills
                .iter()
                .map(|f| {
                    vec![
                        f.column.clone(),
                        f.kind.to_string(),
                        f.filled.to_string(),
                        f.value.to_string(),
                    ]
                })
                .collect();
            out.push_str(&render_table(&headers, &rows));
        }
        let _ = writeln!(out, "Remaining null values: {}", outcome.remaining_nulls);
    }

    fn duplicates(out: &mut String, duplicates: &DuplicateSummary) {
        let _ = writeln!(out, "Exact duplicate rows: {}", duplicates.exact.count());
        if !duplicates.exact.is_empty() {
            let _ = writeln!(out, "{}", duplicates.exact_preview);
        }

        let _ = writeln!(
            out,
            "Duplicate rows ignoring {}: {}",
            duplicates.excluded_columns.join(", "),
            duplicates.partial.count()
        );
        if !duplicates.partial.is_empty() {
            let _ = writeln!(out, "{}", duplicates.partial_preview);
        }
    }

    fn aggregate(out: &mut String, section: &AggregateSection) {
        let result = &section.result;
        let mut headers: Vec<String> = result.group_by.clone();
        headers.push("rows".to_string());
        headers.extend(result.columns.iter().map(|(m, s)| format!("{}_{}", m, s)));

        let limit = section.display_limit.unwrap_or(result.groups.len());
        let rows: Vec<Vec<String>> = result
            .groups
            .iter()
            .take(limit)
            .map(|g| {
                let mut row: Vec<String> = g
                    .key
                    .iter()
                    .map(|v| v.clone().unwrap_or_else(|| "null".to_string()))
                    .collect();
                row.push(g.rows.to_string());
                row.extend(g.values.iter().map(|v| format_value(*v)));
                row
            })
            .collect();

        let headers: Vec<&str> = headers.iter().map(String::as_str).collect();
        out.push_str(&render_table(&headers, &rows));
        if limit < result.groups.len() {
            let _ = writeln!(out, "... {} of {} groups shown", limit, result.groups.len());
        }
    }

    fn churn_rates(out: &mut String, report: &AnalysisReport) {
        let flags = &report.churn_flags;
        let _ = writeln!(
            out,
            "Attrited: {}  Existing: {}  Undefined: {}\n",
            flags.attrited, flags.existing, flags.undefined
        );
        out.push_str(&render_churn_table(&report.churn_rates));
    }
}

fn render_churn_table(table: &ChurnRateTable) -> String {
    let headers = ["Group", "Customers", "Churn Rate"];
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| {
            vec![
                format_key(&r.key),
                r.customers.to_string(),
                r.rate.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v)),
            ]
        })
        .collect();
    render_table(&headers, &rows)
}

fn section(out: &mut String, title: &str) {
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    out.push_str(&"-".repeat(title.len().clamp(40, RULE_WIDTH)));
    out.push('\n');
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "null".to_string(), |v| format!("{:.2}", v))
}

/// Left-aligned text table; each column is as wide as its widest cell.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    out.push_str(&line(headers.to_vec()));
    out.push('\n');
    out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table_aligns_columns() {
        let rows = vec![
            vec!["Gender".to_string(), "2".to_string()],
            vec!["Customer_Age".to_string(), "10".to_string()],
        ];
        let table = render_table(&["Column", "Missing"], &rows);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "Column        Missing");
        assert_eq!(lines[1], "-".repeat(21));
        assert_eq!(lines[2], "Gender        2");
        assert_eq!(lines[3], "Customer_Age  10");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(Some(150.0)), "150.00");
        assert_eq!(format_value(None), "null");
    }
}
