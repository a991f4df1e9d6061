//! Output formatting for rain-alert.
//!
//! Provides terminal and JSON formatters for validation reports.
//!
//! # Graceful Degradation
//!
//! - Non-TTY output: color disabled via NO_COLOR or --no-color
//! - Empty reports: valid output with zero checks
//! - Serialization failure: the JSON formatter falls back to a minimal object
//!
//! No function in this module will panic.

use std::collections::BTreeMap;

use crate::cli::args::OutputFormat;
use crate::engine::pipeline::{StageName, StageStatus};
use crate::engine::result::ValidationReport;
use crate::{CheckResult, Severity};

const SEPARATOR: &str =
    "--------------------------------------------------------------------------------";

/// Process exit code for a validation verdict.
pub fn exit_code(report: &ValidationReport) -> u8 {
    if report.status.is_pass() {
        0
    } else {
        2
    }
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format a validation report into a string
    fn format(&self, report: &ValidationReport) -> String;
}

/// Terminal (human-readable) formatter
pub struct TerminalFormatter {
    color: bool,
    verbose: bool,
    quiet: bool,
}

impl TerminalFormatter {
    pub fn new(color: bool, verbose: bool, quiet: bool) -> Self {
        TerminalFormatter {
            color,
            verbose,
            quiet,
        }
    }

    fn colorize(&self, text: &str, color_code: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", color_code, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.colorize(text, "32")
    }

    fn yellow(&self, text: &str) -> String {
        self.colorize(text, "33")
    }

    fn red(&self, text: &str) -> String {
        self.colorize(text, "31")
    }

    fn status_tag(&self, check: &CheckResult) -> String {
        match (check.passed, check.severity) {
            (true, _) => self.green("[PASS]"),
            (false, Severity::Error) => self.red("[FAIL]"),
            (false, Severity::Warn) => self.yellow("[WARN]"),
        }
    }

    fn check_line(&self, check: &CheckResult) -> String {
        let mut line = format!(
            "  {} {} ({}): {}",
            self.status_tag(check),
            check.name,
            check.severity,
            check.message
        );
        if self.verbose && !check.metrics.is_empty() {
            let metrics: Vec<String> = check
                .metrics
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            line.push_str(&format!(" [{}]", metrics.join(", ")));
        }
        line
    }

    /// One line per pipeline stage that ran, in execution order.
    pub fn format_stages(
        &self,
        statuses: &BTreeMap<StageName, StageStatus>,
        durations: &BTreeMap<StageName, f64>,
    ) -> String {
        let mut output = String::from("STAGES\n");
        for stage in StageName::ALL {
            let Some(status) = statuses.get(&stage) else {
                continue;
            };
            let tag = match status {
                StageStatus::Success => self.green("[ OK ]"),
                StageStatus::Failed => self.red("[FAIL]"),
            };
            let seconds = durations.get(&stage).copied().unwrap_or_default();
            output.push_str(&format!("  {} {} ({:.2}s)\n", tag, stage, seconds));
        }
        output
    }
}

impl OutputFormatter for TerminalFormatter {
    fn format(&self, report: &ValidationReport) -> String {
        let mut output = String::new();

        output.push_str(SEPARATOR);
        output.push('\n');
        output.push_str("rain-alert validation report\n");
        output.push_str(&format!("Run date: {}\n", report.run_date));
        output.push_str(&format!("Input: {}\n", report.inputs.forecast_hourly));
        output.push_str(&format!("Rows: {}\n", report.row_count));
        output.push_str(&format!("Generated: {}\n", report.generated_at_utc));
        output.push_str(SEPARATOR);
        output.push_str("\n\n");

        let shown: Vec<&CheckResult> = report
            .checks
            .iter()
            .filter(|c| !self.quiet || !c.passed)
            .collect();

        if !shown.is_empty() {
            output.push_str("CHECKS\n");
            for check in shown {
                output.push_str(&self.check_line(check));
                output.push('\n');
            }
            output.push('\n');
        }

        let summary = report.summary();
        output.push_str(SEPARATOR);
        output.push('\n');
        output.push_str(&format!(
            "SUMMARY: {} passed, {} errors failed, {} warnings failed\n",
            summary.checks_passed, summary.errors_failed, summary.warns_failed
        ));
        output.push_str(&format!("Validation: {}\n", report.outputs.validation));
        output.push_str(&format!("Exceptions: {}\n", report.outputs.exceptions));

        let exit_desc = if report.status.is_pass() {
            "pass"
        } else {
            "error checks failed"
        };
        output.push_str(&format!(
            "Exit code: {} ({})\n",
            exit_code(report),
            exit_desc
        ));
        output.push_str(SEPARATOR);

        output
    }
}

/// JSON formatter
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        JsonFormatter { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &ValidationReport) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        };
        rendered.unwrap_or_else(|e| {
            serde_json::json!({
                "run_date": report.run_date,
                "status": report.status,
                "error": e.to_string(),
            })
            .to_string()
        })
    }
}

/// Get the appropriate formatter for the output format
pub fn get_formatter(
    format: OutputFormat,
    no_color: bool,
    verbose: bool,
    quiet: bool,
) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(TerminalFormatter::new(!no_color, verbose, quiet)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}
