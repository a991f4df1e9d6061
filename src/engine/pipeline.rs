//! Stage orchestration.
//!
//! Sequences `extract -> transform -> validate` as a small state machine with
//! terminal states `Succeeded` and `Aborted`.
//!
//! # Run Summary
//!
//! A summary is written only when every stage succeeded. An aborted run
//! leaves no summary behind, so "no summary" means aborted while a summary
//! with status `fail` means the run completed with quality failures.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, info_span};

use crate::engine::result::ValidationReport;
use crate::paths::ArtifactPaths;
use crate::stages::{ExtractStage, ForecastSource, OpenMeteoClient, TransformStage, ValidateStage};
use crate::{storage, RainAlertError, Settings, ValidationStatus};

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
    Extract,
    Transform,
    Validate,
}

impl StageName {
    pub const ALL: [StageName; 3] = [StageName::Extract, StageName::Transform, StageName::Validate];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Extract => "extract",
            StageName::Transform => "transform",
            StageName::Validate => "validate",
        }
    }

    /// Stage that follows this one, `None` after validate.
    pub fn next(&self) -> Option<StageName> {
        match self {
            StageName::Extract => Some(StageName::Transform),
            StageName::Transform => Some(StageName::Validate),
            StageName::Validate => None,
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Success,
    Failed,
}

/// Where the orchestrator is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Running(StageName),
    Succeeded,
    Aborted(StageName),
}

impl PipelineState {
    pub fn initial() -> Self {
        PipelineState::Running(StageName::Extract)
    }

    /// Transition after the current stage finished with `status`. Terminal
    /// states never move.
    pub fn advance(self, status: StageStatus) -> Self {
        match (self, status) {
            (PipelineState::Running(stage), StageStatus::Success) => match stage.next() {
                Some(next) => PipelineState::Running(next),
                None => PipelineState::Succeeded,
            },
            (PipelineState::Running(stage), StageStatus::Failed) => PipelineState::Aborted(stage),
            (terminal, _) => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineState::Running(_))
    }
}

/// What a stage hands back to the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct StageOutput {
    /// Declared output paths keyed by name
    pub paths: BTreeMap<String, PathBuf>,
    /// Set only by the validate stage
    pub validation: Option<ValidationReport>,
}

impl StageOutput {
    pub fn from_paths<I, K>(paths: I) -> Self
    where
        I: IntoIterator<Item = (K, PathBuf)>,
        K: Into<String>,
    {
        StageOutput {
            paths: paths.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            validation: None,
        }
    }

    pub fn with_validation(mut self, report: ValidationReport) -> Self {
        self.validation = Some(report);
        self
    }
}

/// One unit of pipeline work.
pub trait PipelineStage: Send + Sync {
    fn run(&self, run_date: NaiveDate, settings: &Settings) -> crate::Result<StageOutput>;
}

/// A stage aborted the run, or the summary could not be written.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{stage} stage failed: {source}")]
    StageFailed {
        stage: StageName,
        /// Statuses of every stage that ran, including the failed one
        statuses: BTreeMap<StageName, StageStatus>,
        #[source]
        source: RainAlertError,
    },

    #[error("Failed to write run summary: {0}")]
    SummaryWrite(#[source] RainAlertError),
}

/// Artifact paths recorded in the run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunPaths {
    pub raw: Option<String>,
    pub processed: BTreeMap<String, String>,
    pub validation: BTreeMap<String, String>,
}

/// Persisted as `run_{date}.json` after a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_date: String,
    pub generated_at_utc: String,
    pub status: ValidationStatus,
    pub stage_statuses: BTreeMap<StageName, StageStatus>,
    pub stage_durations_s: BTreeMap<StageName, f64>,
    pub paths: RunPaths,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub status: ValidationStatus,
    pub stage_statuses: BTreeMap<StageName, StageStatus>,
    pub stage_durations: BTreeMap<StageName, f64>,
    pub stage_outputs: BTreeMap<StageName, BTreeMap<String, PathBuf>>,
    pub run_summary_path: PathBuf,
    pub validation: Option<ValidationReport>,
}

fn path_strings(paths: Option<&BTreeMap<String, PathBuf>>) -> BTreeMap<String, String> {
    paths
        .map(|paths| {
            paths
                .iter()
                .map(|(k, v)| (k.clone(), v.display().to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// Runs the three stages in order.
pub struct StageOrchestrator {
    extract: Box<dyn PipelineStage>,
    transform: Box<dyn PipelineStage>,
    validate: Box<dyn PipelineStage>,
}

impl StageOrchestrator {
    pub fn new(
        extract: Box<dyn PipelineStage>,
        transform: Box<dyn PipelineStage>,
        validate: Box<dyn PipelineStage>,
    ) -> Self {
        StageOrchestrator {
            extract,
            transform,
            validate,
        }
    }

    /// Production stages fetching from the configured forecast API.
    pub fn with_default_stages() -> Self {
        Self::with_source(Box::new(OpenMeteoClient::new()))
    }

    /// Production transform and validate stages fed by `source`.
    pub fn with_source(source: Box<dyn ForecastSource>) -> Self {
        Self::new(
            Box::new(ExtractStage::new(source)),
            Box::new(TransformStage),
            Box::new(ValidateStage),
        )
    }

    fn stage(&self, name: StageName) -> &dyn PipelineStage {
        match name {
            StageName::Extract => self.extract.as_ref(),
            StageName::Transform => self.transform.as_ref(),
            StageName::Validate => self.validate.as_ref(),
        }
    }

    /// Run every stage for `run_date`.
    ///
    /// Returns `Err` as soon as a stage fails; later stages do not run and no
    /// summary is written. Otherwise writes the run summary and returns the
    /// outcome, whose status is the validate stage's verdict.
    pub fn run(&self, run_date: NaiveDate, settings: &Settings) -> Result<PipelineOutcome, PipelineError> {
        let run_date_text = run_date.format("%Y-%m-%d").to_string();
        let _run = info_span!("pipeline", run_date = %run_date_text).entered();
        info!("pipeline_start");

        let mut statuses: BTreeMap<StageName, StageStatus> = BTreeMap::new();
        let mut durations: BTreeMap<StageName, f64> = BTreeMap::new();
        let mut outputs: BTreeMap<StageName, BTreeMap<String, PathBuf>> = BTreeMap::new();
        let mut validation: Option<ValidationReport> = None;
        let mut state = PipelineState::initial();

        while let PipelineState::Running(name) = state {
            let _stage = info_span!("stage", stage = %name).entered();
            info!("{}_start", name);

            let start = Instant::now();
            let result = self.stage(name).run(run_date, settings);
            let elapsed = start.elapsed().as_secs_f64();
            durations.insert(name, elapsed);

            match result {
                Ok(output) => {
                    statuses.insert(name, StageStatus::Success);
                    outputs.insert(name, output.paths);
                    if output.validation.is_some() {
                        validation = output.validation;
                    }
                    info!(duration_s = elapsed, "{}_end", name);
                    state = state.advance(StageStatus::Success);
                }
                Err(source) => {
                    statuses.insert(name, StageStatus::Failed);
                    error!(stage = %name, error = %source, "pipeline_failed");
                    return Err(PipelineError::StageFailed {
                        stage: name,
                        statuses,
                        source,
                    });
                }
            }
        }

        let status = validation
            .as_ref()
            .map(|report| report.status)
            .unwrap_or(ValidationStatus::Fail);

        let summary = RunSummary {
            run_date: run_date_text,
            generated_at_utc: crate::time::to_iso(crate::time::now_utc()),
            status,
            stage_statuses: statuses.clone(),
            stage_durations_s: durations.clone(),
            paths: RunPaths {
                raw: outputs
                    .get(&StageName::Extract)
                    .and_then(|p| p.get("raw_path"))
                    .map(|p| p.display().to_string()),
                processed: path_strings(outputs.get(&StageName::Transform)),
                validation: path_strings(outputs.get(&StageName::Validate)),
            },
        };

        let run_summary_path = ArtifactPaths::new(settings, run_date).run_summary();
        storage::write_json(&run_summary_path, &summary).map_err(PipelineError::SummaryWrite)?;

        info!(status = %status, "pipeline_end");

        Ok(PipelineOutcome {
            status,
            stage_statuses: statuses,
            stage_durations: durations,
            stage_outputs: outputs,
            run_summary_path,
            validation,
        })
    }
}
