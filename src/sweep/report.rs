//! Sweep results

use crate::experiment::{ExperimentDir, ExperimentStatus};
use crate::step::{ProcessError, StepKind, StepOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: StepKind,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    pub fn from_result(
        step: StepKind,
        result: &Result<StepOutcome, ProcessError>,
        duration: Duration,
    ) -> Self {
        let duration_ms = duration.as_millis() as u64;
        match result {
            Ok(outcome) => Self {
                step,
                success: true,
                exit_code: Some(outcome.exit_code),
                duration_ms,
                error: None,
            },
            Err(err) => Self {
                step,
                success: false,
                exit_code: err.exit_code(),
                duration_ms,
                error: Some(err.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExperimentReport {
    pub name: String,
    pub path: PathBuf,
    pub status: ExperimentStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExperimentReport {
    pub fn new(dir: &ExperimentDir) -> Self {
        Self {
            name: dir.name.clone(),
            path: dir.path.clone(),
            status: dir.status(),
            steps: Vec::new(),
            error: None,
        }
    }

    /// Both steps ran and no isolated failure was recorded
    pub fn was_processed(&self) -> bool {
        self.error.is_none() && self.steps.len() == 2
    }

    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.success).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub inspected: usize,
    pub not_experiments: usize,
    pub ongoing: usize,
    pub already_done: usize,
    pub pending: usize,
    pub processed: usize,
    pub failed_experiments: usize,
    pub failed_steps: usize,
}

impl SweepSummary {
    fn record(&mut self, experiment: &ExperimentReport) {
        self.inspected += 1;
        match experiment.status {
            ExperimentStatus::NotAnExperiment => self.not_experiments += 1,
            ExperimentStatus::Ongoing => self.ongoing += 1,
            ExperimentStatus::AlreadyDone => self.already_done += 1,
            ExperimentStatus::Pending => self.pending += 1,
        }
        if experiment.was_processed() {
            self.processed += 1;
        }
        if experiment.error.is_some() {
            self.failed_experiments += 1;
        }
        self.failed_steps += experiment.failed_steps();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub root: PathBuf,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub dry_run: bool,
    pub summary: SweepSummary,
    pub experiments: Vec<ExperimentReport>,
}

impl SweepReport {
    pub fn new(root: &Path, started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            started_at,
            duration_ms: 0,
            dry_run,
            summary: SweepSummary::default(),
            experiments: Vec::new(),
        }
    }

    pub fn push(&mut self, experiment: ExperimentReport) {
        self.summary.record(&experiment);
        self.experiments.push(experiment);
    }

    pub fn finish(&mut self, elapsed: Duration) {
        self.duration_ms = elapsed.as_millis() as u64;
    }

    pub fn get(&self, name: &str) -> Option<&ExperimentReport> {
        self.experiments.iter().find(|e| e.name == name)
    }

    /// Names of experiments with the given status, in sweep order
    pub fn names_with_status(&self, status: ExperimentStatus) -> Vec<&str> {
        self.experiments
            .iter()
            .filter(|e| e.status == status)
            .map(|e| e.name.as_str())
            .collect()
    }
}
