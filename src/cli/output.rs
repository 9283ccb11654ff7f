//! Output formatting for sweep reports and configuration
//!
//! JSON and YAML serialize the full [`SweepReport`]; the human format prints a
//! compact summary (and, for dry runs, one line per directory).

use anyhow::{Context, Result};
use std::fmt::Write as _;

use crate::config::SweepConfig;
use crate::experiment::ExperimentStatus;
use crate::sweep::SweepReport;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn format_report(&self, report: &SweepReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report)
                .context("Failed to serialize sweep report to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(report).context("Failed to serialize sweep report to YAML")
            }
            OutputFormat::Human => Ok(self.format_report_human(report)),
        }
    }

    pub fn format_config(&self, config: &SweepConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&config.to_display_map())
                .context("Failed to serialize config to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(&config.to_display_map())
                .context("Failed to serialize config to YAML"),
            OutputFormat::Human => Ok(config.to_string()),
        }
    }

    fn format_report_human(&self, report: &SweepReport) -> String {
        let mut out = String::new();
        let summary = &report.summary;

        if report.dry_run {
            for experiment in &report.experiments {
                let _ = writeln!(
                    out,
                    "{:<20} {}",
                    status_label(experiment.status),
                    experiment.path.display()
                );
            }
            if !report.experiments.is_empty() {
                out.push('\n');
            }
        } else {
            for experiment in &report.experiments {
                for step in experiment.steps.iter().filter(|s| !s.success) {
                    let _ = writeln!(
                        out,
                        "warning: {} step failed for {}: {}",
                        step.step,
                        experiment.path.display(),
                        step.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
        }

        let _ = writeln!(
            out,
            "{}: {} entries, {} processed, {} pending, {} failed steps",
            report.root.display(),
            summary.inspected,
            summary.processed,
            if report.dry_run {
                summary.pending
            } else {
                summary
                    .pending
                    .saturating_sub(summary.processed + summary.failed_experiments)
            },
            summary.failed_steps
        );
        let _ = write!(
            out,
            "  not experiments: {}, ongoing: {}, already done: {}",
            summary.not_experiments, summary.ongoing, summary.already_done
        );
        if summary.failed_experiments > 0 {
            let _ = write!(out, ", failed: {}", summary.failed_experiments);
        }
        out.push('\n');

        out
    }
}

fn status_label(status: ExperimentStatus) -> &'static str {
    match status {
        ExperimentStatus::NotAnExperiment => "not an experiment",
        ExperimentStatus::Ongoing => "ongoing",
        ExperimentStatus::AlreadyDone => "done",
        ExperimentStatus::Pending => "pending",
    }
}
