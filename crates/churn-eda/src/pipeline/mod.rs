//! Pipeline module.
//!
//! Runs the analysis stages in order over a single table.

mod builder;
mod stage;

pub use builder::{Analysis, AnalysisBuilder};
pub use stage::AnalysisStage;
