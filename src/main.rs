//! rain-alert CLI entry point
//!
//! Fetches an hourly forecast, reshapes it into dimensional tables and
//! certifies the processed data with a battery of quality checks.

use anyhow::Context;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;

use rain_alert::cli::args::{Args, Command, OutputFormat, RunOptions};
use rain_alert::cli::output::{exit_code, get_formatter, TerminalFormatter};
use rain_alert::engine::executor::CheckExecutor;
use rain_alert::engine::pipeline::PipelineError;
use rain_alert::logging::init_tracing;
use rain_alert::report::{latest_star, ReportError, RunReport};
use rain_alert::version::get_build_info;
use rain_alert::{run_pipeline, validate, Settings};

/// Exit code when the requested work could not run.
const EXIT_ABORTED: u8 = 1;
/// Exit code for invalid usage.
const EXIT_USAGE: u8 = 3;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_tracing(args.log_format, args.verbose, args.quiet);

    match run(&args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_ABORTED)
        }
    }
}

fn run(args: &Args) -> anyhow::Result<u8> {
    match &args.command {
        Command::Version => {
            println!("{}", get_build_info());
            Ok(0)
        }
        Command::List => {
            print_check_list();
            Ok(0)
        }
        Command::Run(opts) => run_command(args, opts),
        Command::Validate(opts) => validate_command(args, opts),
        Command::Report { run_date } => {
            let settings = load_settings(args)?;
            match RunReport::build(&settings, *run_date) {
                Ok(report) => {
                    let (md, csv) = report.write(&settings).context("writing run report")?;
                    println!("{}", md.display());
                    println!("{}", csv.display());
                    Ok(0)
                }
                Err(ReportError::MissingInputs(missing)) => {
                    eprintln!("{}", missing);
                    Ok(EXIT_ABORTED)
                }
                Err(e) => Err(e).context("building run report"),
            }
        }
        Command::Latest => {
            let settings = load_settings(args)?;
            match latest_star(Path::new(&settings.data_star_dir)) {
                Some(latest) => {
                    println!("{}", latest);
                    Ok(0)
                }
                None => {
                    eprintln!("No star folders under {}", settings.data_star_dir);
                    Ok(EXIT_ABORTED)
                }
            }
        }
    }
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    Settings::load(args.config.as_deref()).context("loading configuration")
}

fn run_command(args: &Args, opts: &RunOptions) -> anyhow::Result<u8> {
    let settings = load_settings(args)?;
    let terminal = TerminalFormatter::new(!args.no_color, args.verbose > 0, args.quiet);

    match run_pipeline(opts.run_date(), &settings) {
        Ok(outcome) => {
            if opts.format == OutputFormat::Text {
                println!(
                    "{}",
                    terminal.format_stages(&outcome.stage_statuses, &outcome.stage_durations)
                );
            }
            if let Some(report) = &outcome.validation {
                let formatter = get_formatter(opts.format, args.no_color, args.verbose > 0, args.quiet);
                println!("{}", formatter.format(report));
            }
            if opts.format == OutputFormat::Text {
                println!("Run summary: {}", outcome.run_summary_path.display());
            }
            Ok(if outcome.status.is_pass() { 0 } else { 2 })
        }
        Err(PipelineError::StageFailed {
            stage,
            statuses,
            source,
        }) => {
            eprint!("{}", terminal.format_stages(&statuses, &Default::default()));
            eprintln!("Pipeline aborted in {} stage: {}", stage, source);
            Ok(EXIT_ABORTED)
        }
        Err(e) => Err(e).context("completing pipeline run"),
    }
}

fn validate_command(args: &Args, opts: &RunOptions) -> anyhow::Result<u8> {
    let settings = load_settings(args)?;
    let report = validate(opts.run_date(), &settings).context("validating processed data")?;
    let formatter = get_formatter(opts.format, args.no_color, args.verbose > 0, args.quiet);
    println!("{}", formatter.format(&report));
    Ok(exit_code(&report))
}

fn print_check_list() {
    let executor = CheckExecutor::with_default_checks();
    println!("Available checks:\n");
    for check in executor.checks() {
        println!(
            "  {:<22} {:<6} {}",
            check.name(),
            check.severity().as_str(),
            check.description()
        );
    }
}
