//! Report rendering.
//!
//! The console report is the only output of an analysis run. Sections
//! appear in a fixed order: head preview, schema info, missing values,
//! imputation, duplicates, the grouped-statistics tables and finally the
//! churn rates sorted from highest to lowest.

mod console;

pub use console::{ConsoleReport, SECTION_TITLES};
