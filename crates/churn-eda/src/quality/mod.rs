//! Data quality audit module.
//!
//! This module provides missing-value reporting and duplicate row detection
//! over a table snapshot. None of its functions modify the table.

mod analyzer;

pub use analyzer::QualityAuditor;
