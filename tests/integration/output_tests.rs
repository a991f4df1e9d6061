//! Output formatting of real validation reports.

use rain_alert::cli::args::OutputFormat;
use rain_alert::cli::output::{exit_code, get_formatter, JsonFormatter, OutputFormatter, TerminalFormatter};
use rain_alert::stages::transform::transform_forecast;
use rain_alert::{validate, ValidationReport};

use crate::mocks::*;

fn report_for(payload: serde_json::Value) -> (tempfile::TempDir, ValidationReport) {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    write_raw(&settings, &payload);
    transform_forecast(run_date(), &settings).unwrap();
    let report = validate(run_date(), &settings).unwrap();
    (dir, report)
}

#[test]
fn test_terminal_lists_every_check_in_order() {
    let (_dir, report) = report_for(forecast_payload(48));
    let output = TerminalFormatter::new(false, false, false).format(&report);

    let positions: Vec<usize> = report
        .checks
        .iter()
        .map(|c| output.find(&format!("] {} (", c.name)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(output.contains("Rows: 48"));
    assert!(output.contains("SUMMARY: 8 passed, 0 errors failed, 0 warnings failed"));
    assert!(output.contains("Exit code: 0 (pass)"));
}

#[test]
fn test_terminal_verbose_shows_metrics() {
    let (_dir, report) = report_for(payload_with_duplicate());
    let output = TerminalFormatter::new(false, true, false).format(&report);
    assert!(output.contains("[FAIL] unique_key (ERROR)"));
    assert!(output.contains("duplicate_count=2"));
    assert_eq!(exit_code(&report), 2);
}

#[test]
fn test_json_round_trips_to_report() {
    let (_dir, report) = report_for(payload_with_duplicate());
    let output = JsonFormatter::new(false).format(&report);
    let parsed: ValidationReport = serde_json::from_str(&output).unwrap();

    assert_eq!(parsed.checks, report.checks);
    assert_eq!(parsed.status, report.status);
    assert!(parsed.exceptions.is_empty());
}

#[test]
fn test_get_formatter_selects_format() {
    let (_dir, report) = report_for(forecast_payload(48));
    let json = get_formatter(OutputFormat::Json, true, false, false).format(&report);
    assert!(json.trim_start().starts_with('{'));
    let text = get_formatter(OutputFormat::Text, true, false, false).format(&report);
    assert!(text.contains("rain-alert validation report"));
}
