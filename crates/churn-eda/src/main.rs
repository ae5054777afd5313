//! CLI entry point for the churn analysis.

use anyhow::{Context, Result};
use churn_eda::{Analysis, AnalysisConfig, AnalysisError, ConsoleReport};
use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Exploratory churn analysis of a customer dataset",
    long_about = "Loads a customer CSV, reports missing values and duplicates, fills \
                  missing values, and prints grouped statistics and churn rates.\n\n\
                  EXIT CODES:\n  \
                  1  internal error\n  \
                  2  input could not be read or parsed\n  \
                  3  required column missing\n  \
                  4  missing values could not be imputed\n  \
                  5  aggregation failed\n  \
                  6  invalid configuration\n\n\
                  EXAMPLES:\n  \
                  churn-eda -i data/BankChurners.csv\n\n  \
                  # Custom column names from a JSON file, more preview rows\n  \
                  churn-eda -i customers.csv --config columns.json --preview-rows 10"
)]
struct Args {
    /// Path to the CSV file to analyse
    #[arg(short, long)]
    input: PathBuf,

    /// JSON configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of rows shown in previews
    #[arg(long)]
    preview_rows: Option<usize>,

    /// Name of the customer identifier column
    #[arg(long)]
    id_column: Option<String>,

    /// Name of the customer status column
    #[arg(long)]
    status_column: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Load environment variables from .env file (RUST_LOG may be set there)
    dotenv().ok();

    init_logging(&args.log_level, args.quiet);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            let code = e
                .downcast_ref::<AnalysisError>()
                .map_or(1, AnalysisError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = build_config(args)?;
    let analysis = Analysis::builder().config(config).build()?;

    let report = analysis.run_file(&args.input)?;
    println!("{}", ConsoleReport::render(&report));

    Ok(())
}

/// Merge the optional config file with command-line overrides.
fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let base = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            AnalysisConfig::from_json_file(path)
                .with_context(|| format!("Reading configuration {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };

    let mut builder = AnalysisConfig::builder().base(base);
    if let Some(rows) = args.preview_rows {
        builder = builder.preview_rows(rows);
    }
    if let Some(ref id) = args.id_column {
        builder = builder.id_column(id);
    }
    if let Some(ref status) = args.status_column {
        builder = builder.status_column(status);
    }

    Ok(builder.build().map_err(AnalysisError::from)?)
}
