//! Command line arguments.

use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Text,
    /// The validation report as JSON
    Json,
}

/// Hourly forecast ingestion with star-schema reshaping and data-quality
/// certification.
#[derive(Debug, Parser)]
#[command(name = "rain-alert", version, about, long_about = None)]
pub struct Args {
    /// JSON configuration file layered over the defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Json, global = true)]
    pub log_format: LogFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by commands that produce a validation report.
#[derive(Debug, Clone, ClapArgs)]
pub struct RunOptions {
    /// Run date (YYYY-MM-DD), defaults to today in UTC
    #[arg(long, value_parser = parse_date)]
    pub run_date: Option<NaiveDate>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl RunOptions {
    pub fn run_date(&self) -> NaiveDate {
        self.run_date
            .unwrap_or_else(|| crate::time::now_utc().date_naive())
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run extract, transform and validate for one date
    Run(RunOptions),
    /// Validate the processed dataset of one date
    Validate(RunOptions),
    /// Write the markdown and CSV run report of one date
    Report {
        /// Run date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        run_date: NaiveDate,
    },
    /// Print the newest star-schema folder and its tables
    Latest,
    /// List all checks with their severity
    List,
    /// Print version information
    Version,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    crate::time::parse_run_date(value).map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}
