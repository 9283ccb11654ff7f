//! The experiment sweep
//!
//! [`Sweeper`] walks the immediate children of a root directory, classifies
//! each one by its marker files and, for pending experiments, runs the
//! extraction step followed by the plotting step. Everything happens
//! sequentially: one directory at a time, one step at a time.

mod report;

pub use report::{ExperimentReport, StepReport, SweepReport, SweepSummary};

use crate::config::SweepConfig;
use crate::experiment::ExperimentDir;
use crate::fs::{DirEntry, FileSystem, RealFileSystem};
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use crate::step::{CommandStep, ExternalStep, ProcessError, StepKind};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// What a failed external step means for the sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepFailurePolicy {
    /// Record the failure and carry on as if the step had succeeded
    #[default]
    Ignore,
    /// Stop processing the experiment
    Abort,
}

/// Whether an aborted experiment stops the whole sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    #[default]
    FailFast,
    /// Record the failure against the experiment and move to the next one
    Isolate,
}

impl fmt::Display for StepFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepFailurePolicy::Ignore => f.write_str("ignore"),
            StepFailurePolicy::Abort => f.write_str("abort"),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::FailFast => f.write_str("fail-fast"),
            FailurePolicy::Isolate => f.write_str("isolate"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOptions {
    pub step_failure: StepFailurePolicy,
    pub failure: FailurePolicy,
}

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Experiment root does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("Experiment root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to list experiment root {path}: {message}")]
    ListFailed { path: PathBuf, message: String },

    #[error("{step} step failed for {path}: {source}")]
    Step {
        path: PathBuf,
        step: StepKind,
        #[source]
        source: ProcessError,
    },
}

pub struct Sweeper {
    fs: Arc<dyn FileSystem>,
    extract: Arc<dyn ExternalStep>,
    plot: Arc<dyn ExternalStep>,
    progress: Arc<dyn ProgressHandler>,
    options: SweepOptions,
}

impl Sweeper {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        extract: Arc<dyn ExternalStep>,
        plot: Arc<dyn ExternalStep>,
    ) -> Self {
        Self {
            fs,
            extract,
            plot,
            progress: Arc::new(NoOpHandler),
            options: SweepOptions::default(),
        }
    }

    /// Real file system and process-backed steps as described by `config`
    pub fn from_config(config: &SweepConfig) -> Self {
        let timeout = config.step_timeout();
        let extract = CommandStep::new("extract", config.extract_command.clone())
            .with_timeout(timeout);
        let plot = CommandStep::new("plot", config.plot_command.clone()).with_timeout(timeout);

        Self::new(
            Arc::new(RealFileSystem::new()),
            Arc::new(extract),
            Arc::new(plot),
        )
        .with_options(SweepOptions {
            step_failure: config.step_failure_policy,
            failure: config.failure_policy,
        })
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_options(mut self, options: SweepOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> SweepOptions {
        self.options
    }

    /// Classifies every child of `root` and processes the pending ones.
    pub async fn sweep(&self, root: &Path) -> Result<SweepReport, SweepError> {
        self.run(root, false).await
    }

    /// Classifies every child of `root` without running any step.
    pub async fn survey(&self, root: &Path) -> Result<SweepReport, SweepError> {
        self.run(root, true).await
    }

    async fn run(&self, root: &Path, dry_run: bool) -> Result<SweepReport, SweepError> {
        let start = Instant::now();
        let candidates = self.list_candidates(root)?;

        self.emit(ProgressEvent::Started {
            root: root.to_path_buf(),
            dry_run,
        });

        let mut report = SweepReport::new(root, Utc::now(), dry_run);

        for entry in candidates {
            let dir = ExperimentDir::inspect(&*self.fs, entry.name, entry.path);
            let status = dir.status();
            let mut experiment = ExperimentReport::new(&dir);

            self.emit(ProgressEvent::ExperimentStarted {
                path: dir.path.clone(),
            });
            debug!(path = %dir.path.display(), status = %status, "Classified");

            if !status.needs_processing() {
                self.emit(ProgressEvent::ExperimentSkipped {
                    path: dir.path.clone(),
                    status,
                });
            } else if dry_run {
                self.emit(ProgressEvent::ExperimentPending {
                    path: dir.path.clone(),
                });
            } else {
                let processing_started = Instant::now();
                match self.process(&dir, &mut experiment).await {
                    Ok(()) => self.emit(ProgressEvent::ExperimentProcessed {
                        path: dir.path.clone(),
                        duration: processing_started.elapsed(),
                    }),
                    Err(err) => {
                        self.emit(ProgressEvent::ExperimentFailed {
                            path: dir.path.clone(),
                            error: err.to_string(),
                        });
                        if self.options.failure == FailurePolicy::FailFast {
                            return Err(err);
                        }
                        experiment.error = Some(err.to_string());
                    }
                }
            }

            report.push(experiment);
        }

        report.finish(start.elapsed());
        self.emit(ProgressEvent::Completed {
            inspected: report.summary.inspected,
            processed: report.summary.processed,
            failed_steps: report.summary.failed_steps,
            total_time: start.elapsed(),
        });

        Ok(report)
    }

    /// Children of `root`, sorted by raw file name so output is reproducible.
    /// Entry paths are kept as listed; names that are not valid UTF-8 only
    /// lose fidelity in the display name.
    fn list_candidates(&self, root: &Path) -> Result<Vec<DirEntry>, SweepError> {
        if !self.fs.exists(root) {
            return Err(SweepError::RootNotFound(root.to_path_buf()));
        }
        if !self.fs.is_dir(root) {
            return Err(SweepError::NotADirectory(root.to_path_buf()));
        }

        let mut entries = self
            .fs
            .read_dir(root)
            .map_err(|e| SweepError::ListFailed {
                path: root.to_path_buf(),
                message: format!("{:#}", e),
            })?;

        entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
        Ok(entries)
    }

    /// Runs extraction then plotting. Under [`StepFailurePolicy::Ignore`]
    /// the plot step runs even if extraction failed.
    async fn process(
        &self,
        dir: &ExperimentDir,
        experiment: &mut ExperimentReport,
    ) -> Result<(), SweepError> {
        let steps: [(StepKind, &Arc<dyn ExternalStep>); 2] =
            [(StepKind::Extract, &self.extract), (StepKind::Plot, &self.plot)];

        for (kind, step) in steps {
            self.emit(ProgressEvent::StepStarted {
                path: dir.path.clone(),
                step: kind,
            });

            let started = Instant::now();
            let result = step.run(&dir.path).await;
            let duration = started.elapsed();

            self.emit(ProgressEvent::StepFinished {
                path: dir.path.clone(),
                step: kind,
                duration,
                error: result.as_ref().err().map(|e| e.to_string()),
            });
            experiment
                .steps
                .push(StepReport::from_result(kind, &result, duration));

            if let Err(source) = result {
                if self.options.step_failure == StepFailurePolicy::Abort {
                    return Err(SweepError::Step {
                        path: dir.path.clone(),
                        step: kind,
                        source,
                    });
                }
            }
        }

        Ok(())
    }

    fn emit(&self, event: ProgressEvent) {
        self.progress.on_progress(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{ExperimentStatus, DONE_MARKER};
    use crate::fs::MockFileSystem;
    use crate::progress::ConsoleHandler;
    use crate::step::{CallLog, RecordingStep};
    use std::io::Write;
    use std::sync::Mutex;

    struct Fixture {
        fs: Arc<MockFileSystem>,
        log: CallLog,
    }

    impl Fixture {
        /// expA: nothing, expB: log + ongoing, expC: log + pdf, expD: log only
        fn scenario() -> Self {
            let fs = Arc::new(MockFileSystem::with_root(PathBuf::from("/experiments")));
            fs.add_dir("expA");
            fs.add_file("expB/log.txt");
            fs.add_file("expB/ongoing");
            fs.add_file("expC/log.txt");
            fs.add_file("expC/plots/allplots.pdf");
            fs.add_file("expD/log.txt");
            Self {
                fs,
                log: CallLog::new(),
            }
        }

        fn root(&self) -> PathBuf {
            self.fs.root().to_path_buf()
        }

        fn sweeper(&self) -> Sweeper {
            self.sweeper_with(
                RecordingStep::new("extract", self.log.clone()),
                RecordingStep::new("plot", self.log.clone()),
            )
        }

        fn sweeper_with(&self, extract: RecordingStep, plot: RecordingStep) -> Sweeper {
            Sweeper::new(self.fs.clone(), Arc::new(extract), Arc::new(plot))
        }
    }

    /// Shared in-memory writer so console output can be inspected after the
    /// handler has been moved into the sweeper.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[tokio::test]
    async fn test_scenario_only_pending_is_processed() {
        let fixture = Fixture::scenario();
        let report = fixture.sweeper().sweep(&fixture.root()).await.unwrap();

        let calls = fixture.log.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].step, "extract");
        assert_eq!(calls[0].path, PathBuf::from("/experiments/expD"));
        assert_eq!(calls[1].step, "plot");
        assert_eq!(calls[1].path, PathBuf::from("/experiments/expD"));

        let statuses: Vec<ExperimentStatus> =
            report.experiments.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                ExperimentStatus::NotAnExperiment,
                ExperimentStatus::Ongoing,
                ExperimentStatus::AlreadyDone,
                ExperimentStatus::Pending,
            ]
        );
        assert_eq!(report.summary.processed, 1);
        assert!(report.get("expD").unwrap().was_processed());
    }

    #[tokio::test]
    async fn test_scenario_console_output() {
        let fixture = Fixture::scenario();
        let buffer = SharedBuffer::default();
        let sweeper = fixture
            .sweeper()
            .with_progress(Arc::new(ConsoleHandler::new(buffer.clone())));

        sweeper.sweep(&fixture.root()).await.unwrap();

        assert_eq!(
            buffer.contents(),
            "Looping over all experiments\n\
             /experiments/expA not an experiment directory.\n\
             /experiments/expB is ongoing\n\
             /experiments/expC already done.\n\
             /experiments/expD extracting data... generating plots... done.\n"
        );
    }

    #[tokio::test]
    async fn test_entries_are_sorted() {
        let fs = Arc::new(MockFileSystem::with_root(PathBuf::from("/r")));
        for name in ["zeta", "alpha", "mid", "beta"] {
            fs.add_file(format!("{}/log.txt", name));
        }
        let log = CallLog::new();
        let sweeper = Sweeper::new(
            fs.clone(),
            Arc::new(RecordingStep::new("extract", log.clone())),
            Arc::new(RecordingStep::new("plot", log.clone())),
        );

        sweeper.sweep(Path::new("/r")).await.unwrap();

        let order: Vec<PathBuf> = log.paths_for("extract");
        assert_eq!(
            order,
            ["alpha", "beta", "mid", "zeta"]
                .iter()
                .map(|n| PathBuf::from("/r").join(n))
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_second_sweep_is_idempotent() {
        let fixture = Fixture::scenario();
        let fs = fixture.fs.clone();
        let plot = RecordingStep::new("plot", fixture.log.clone())
            .on_run(move |path| fs.add_file(path.join(DONE_MARKER)));
        let sweeper =
            fixture.sweeper_with(RecordingStep::new("extract", fixture.log.clone()), plot);

        let first = sweeper.sweep(&fixture.root()).await.unwrap();
        assert_eq!(first.summary.processed, 1);

        let second = sweeper.sweep(&fixture.root()).await.unwrap();
        assert_eq!(second.summary.processed, 0);
        assert_eq!(
            second.get("expD").unwrap().status,
            ExperimentStatus::AlreadyDone
        );
        assert_eq!(fixture.log.len(), 2);
    }

    #[tokio::test]
    async fn test_survey_runs_no_steps() {
        let fixture = Fixture::scenario();
        let report = fixture.sweeper().survey(&fixture.root()).await.unwrap();

        assert!(fixture.log.is_empty());
        assert!(report.dry_run);
        assert_eq!(report.summary.pending, 1);
        assert_eq!(report.summary.processed, 0);
        assert_eq!(
            report.names_with_status(ExperimentStatus::Pending),
            vec!["expD"]
        );
    }

    #[tokio::test]
    async fn test_ignored_step_failure_continues() {
        let fixture = Fixture::scenario();
        fixture.fs.add_file("expE/log.txt");
        let extract =
            RecordingStep::new("extract", fixture.log.clone()).failing_on("/experiments/expD");
        let sweeper =
            fixture.sweeper_with(extract, RecordingStep::new("plot", fixture.log.clone()));

        let report = sweeper.sweep(&fixture.root()).await.unwrap();

        // plot still runs after a failed extract, and expE is still processed
        assert_eq!(fixture.log.len(), 4);
        assert_eq!(report.summary.failed_steps, 1);
        let exp_d = report.get("expD").unwrap();
        assert!(!exp_d.steps[0].success);
        assert!(exp_d.steps[1].success);
        assert!(exp_d.error.is_none());
        assert!(report.get("expE").unwrap().was_processed());
    }

    #[tokio::test]
    async fn test_strict_fail_fast_stops_sweep() {
        let fixture = Fixture::scenario();
        fixture.fs.add_file("expE/log.txt");
        let extract =
            RecordingStep::new("extract", fixture.log.clone()).failing_on("/experiments/expD");
        let sweeper = fixture
            .sweeper_with(extract, RecordingStep::new("plot", fixture.log.clone()))
            .with_options(SweepOptions {
                step_failure: StepFailurePolicy::Abort,
                failure: FailurePolicy::FailFast,
            });

        let err = sweeper.sweep(&fixture.root()).await.unwrap_err();

        match err {
            SweepError::Step { path, step, .. } => {
                assert_eq!(path, PathBuf::from("/experiments/expD"));
                assert_eq!(step, StepKind::Extract);
            }
            other => panic!("Expected Step error, got {:?}", other),
        }
        assert_eq!(fixture.log.len(), 1);
    }

    #[tokio::test]
    async fn test_strict_isolate_continues_with_next() {
        let fixture = Fixture::scenario();
        fixture.fs.add_file("expE/log.txt");
        let extract =
            RecordingStep::new("extract", fixture.log.clone()).failing_on("/experiments/expD");
        let buffer = SharedBuffer::default();
        let sweeper = fixture
            .sweeper_with(extract, RecordingStep::new("plot", fixture.log.clone()))
            .with_options(SweepOptions {
                step_failure: StepFailurePolicy::Abort,
                failure: FailurePolicy::Isolate,
            })
            .with_progress(Arc::new(ConsoleHandler::new(buffer.clone())));

        let report = sweeper.sweep(&fixture.root()).await.unwrap();

        assert_eq!(
            fixture.log.paths_for("extract"),
            vec![
                PathBuf::from("/experiments/expD"),
                PathBuf::from("/experiments/expE")
            ]
        );
        assert_eq!(
            fixture.log.paths_for("plot"),
            vec![PathBuf::from("/experiments/expE")]
        );
        assert_eq!(report.summary.failed_experiments, 1);
        assert_eq!(report.summary.processed, 1);
        assert!(report.get("expD").unwrap().error.is_some());
        assert!(buffer
            .contents()
            .contains("/experiments/expD extracting data... failed.\n"));
    }

    #[tokio::test]
    async fn test_missing_root() {
        let fixture = Fixture::scenario();
        let err = fixture
            .sweeper()
            .sweep(Path::new("/nowhere"))
            .await
            .unwrap_err();
        assert!(matches!(err, SweepError::RootNotFound(_)));
    }

    #[tokio::test]
    async fn test_root_is_file() {
        let fixture = Fixture::scenario();
        let err = fixture
            .sweeper()
            .sweep(Path::new("/experiments/expB/log.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, SweepError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_unreadable_root_aborts() {
        let fixture = Fixture::scenario();
        fixture.fs.deny_read("/experiments");

        let err = fixture
            .sweeper()
            .sweep(&fixture.root())
            .await
            .unwrap_err();
        match err {
            SweepError::ListFailed { message, .. } => {
                assert!(message.contains("Permission denied"))
            }
            other => panic!("Expected ListFailed, got {:?}", other),
        }
        assert!(fixture.log.is_empty());
    }

    #[tokio::test]
    async fn test_empty_root() {
        let fs = Arc::new(MockFileSystem::with_root(PathBuf::from("/empty")));
        fs.add_dir("/empty");
        let log = CallLog::new();
        let sweeper = Sweeper::new(
            fs,
            Arc::new(RecordingStep::new("extract", log.clone())),
            Arc::new(RecordingStep::new("plot", log.clone())),
        );

        let report = sweeper.sweep(Path::new("/empty")).await.unwrap();
        assert!(report.experiments.is_empty());
        assert_eq!(report.summary, SweepSummary::default());
    }

    #[test]
    fn test_from_config_takes_policies() {
        let mut config = SweepConfig::builtin();
        config.step_failure_policy = StepFailurePolicy::Abort;
        config.failure_policy = FailurePolicy::Isolate;

        let options = Sweeper::from_config(&config).options();
        assert_eq!(options.step_failure, StepFailurePolicy::Abort);
        assert_eq!(options.failure, FailurePolicy::Isolate);
    }

    #[test]
    fn test_policy_display_matches_config_spelling() {
        assert_eq!(StepFailurePolicy::Ignore.to_string(), "ignore");
        assert_eq!(FailurePolicy::FailFast.to_string(), "fail-fast");
        let parsed: FailurePolicy = serde_json::from_str("\"isolate\"").unwrap();
        assert_eq!(parsed, FailurePolicy::Isolate);
    }
}
