//! Subcommand handlers
//!
//! Each handler returns the process exit code.

use super::commands::{ConfigArgs, StatusArgs, SweepArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::config::{ConfigError, SweepConfig};
use crate::progress::{ConsoleHandler, LoggingHandler, MultiHandler};
use crate::step::StepCommand;
use crate::sweep::{FailurePolicy, StepFailurePolicy, SweepReport, Sweeper};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;

impl SweepArgs {
    /// Overlays command-line flags on `config`.
    pub fn apply_to(&self, config: &mut SweepConfig) -> Result<(), ConfigError> {
        apply_root(&self.root, config);

        if let Some(cmd) = &self.extract_cmd {
            config.extract_command = StepCommand::parse(cmd).map_err(|e| {
                ConfigError::ValidationFailed(format!("--extract-cmd: {}", e))
            })?;
        }
        if let Some(cmd) = &self.plot_cmd {
            config.plot_command = StepCommand::parse(cmd)
                .map_err(|e| ConfigError::ValidationFailed(format!("--plot-cmd: {}", e)))?;
        }
        if self.timeout.is_some() {
            config.step_timeout_secs = self.timeout;
        }
        if self.strict {
            config.step_failure_policy = StepFailurePolicy::Abort;
        }
        if self.keep_going {
            config.failure_policy = FailurePolicy::Isolate;
        }

        Ok(())
    }
}

fn apply_root(root: &Option<PathBuf>, config: &mut SweepConfig) {
    if let Some(root) = root {
        config.root_dir = root.clone();
    }
}

pub async fn handle_sweep(args: &SweepArgs, mut config: SweepConfig, quiet: bool) -> i32 {
    if let Err(e) = args.apply_to(&mut config).and_then(|_| config.validate()) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        return EXIT_CONFIG;
    }
    debug!(config = ?config, "Resolved sweep configuration");

    let format: OutputFormat = args.format.into();
    let mut progress = MultiHandler::new().with(Arc::new(LoggingHandler));
    // Progress lines share stdout with the report, so only show them when the
    // report is human-readable or goes to a file.
    if !quiet && (format == OutputFormat::Human || args.output.is_some()) {
        progress = progress.with(Arc::new(ConsoleHandler::stdout()));
    }

    let sweeper = Sweeper::from_config(&config).with_progress(Arc::new(progress));
    let result = if args.dry_run {
        sweeper.survey(&config.root_dir).await
    } else {
        sweeper.sweep(&config.root_dir).await
    };

    match result {
        Ok(report) => {
            let formatter = OutputFormatter::new(format);
            match emit_report(&formatter, &report, args.output.as_deref(), quiet) {
                Ok(()) => EXIT_SUCCESS,
                Err(e) => {
                    error!("Failed to write report: {:#}", e);
                    eprintln!("Error: {:#}", e);
                    EXIT_FAILURE
                }
            }
        }
        Err(e) => {
            error!("Sweep failed: {}", e);
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    }
}

pub async fn handle_status(args: &StatusArgs, mut config: SweepConfig, quiet: bool) -> i32 {
    apply_root(&args.root, &mut config);

    let sweeper =
        Sweeper::from_config(&config).with_progress(Arc::new(LoggingHandler));

    match sweeper.survey(&config.root_dir).await {
        Ok(report) => {
            let formatter = OutputFormatter::new(args.format.into());
            match emit_report(&formatter, &report, None, quiet) {
                Ok(()) => EXIT_SUCCESS,
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    EXIT_FAILURE
                }
            }
        }
        Err(e) => {
            error!("Status failed: {}", e);
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    }
}

pub fn handle_config(args: &ConfigArgs, config: &SweepConfig) -> i32 {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return EXIT_CONFIG;
    }

    match OutputFormatter::new(args.format.into()).format_config(config) {
        Ok(text) => {
            println!("{}", text.trim_end());
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_FAILURE
        }
    }
}

/// Writes the report to `output` if given, otherwise to stdout. A quiet
/// human-format run prints nothing.
fn emit_report(
    formatter: &OutputFormatter,
    report: &SweepReport,
    output: Option<&Path>,
    quiet: bool,
) -> Result<()> {
    let text = formatter.format_report(report)?;

    match output {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None if quiet && formatter.format() == OutputFormat::Human => {}
        None => println!("{}", text.trim_end()),
    }

    Ok(())
}
