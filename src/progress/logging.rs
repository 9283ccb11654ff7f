//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { root, dry_run } => {
                info!(root = %root.display(), dry_run, "Starting sweep");
            }
            ProgressEvent::ExperimentStarted { path } => {
                debug!(path = %path.display(), "Inspecting directory");
            }
            ProgressEvent::ExperimentSkipped { path, status } => {
                debug!(path = %path.display(), status = %status, "Skipping directory");
            }
            ProgressEvent::ExperimentPending { path } => {
                info!(path = %path.display(), "Experiment pending");
            }
            ProgressEvent::StepStarted { path, step } => {
                debug!(path = %path.display(), step = %step, "Running step");
            }
            ProgressEvent::StepFinished {
                path,
                step,
                duration,
                error,
            } => match error {
                None => debug!(
                    path = %path.display(),
                    step = %step,
                    duration_ms = duration.as_millis(),
                    "Step complete"
                ),
                Some(error) => warn!(
                    path = %path.display(),
                    step = %step,
                    duration_ms = duration.as_millis(),
                    error = %error,
                    "Step failed"
                ),
            },
            ProgressEvent::ExperimentProcessed { path, duration } => {
                info!(
                    path = %path.display(),
                    duration_ms = duration.as_millis(),
                    "Experiment processed"
                );
            }
            ProgressEvent::ExperimentFailed { path, error } => {
                warn!(path = %path.display(), error = %error, "Experiment failed");
            }
            ProgressEvent::Completed {
                inspected,
                processed,
                failed_steps,
                total_time,
            } => {
                info!(
                    inspected,
                    processed,
                    failed_steps,
                    total_time_ms = total_time.as_millis(),
                    "Sweep complete"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::ExperimentStatus;
    use crate::step::StepKind;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_logging_all_events() {
        let handler = LoggingHandler;
        let path = PathBuf::from("experiments/run-1");

        let events = vec![
            ProgressEvent::Started {
                root: PathBuf::from("experiments"),
                dry_run: false,
            },
            ProgressEvent::ExperimentStarted { path: path.clone() },
            ProgressEvent::ExperimentSkipped {
                path: path.clone(),
                status: ExperimentStatus::AlreadyDone,
            },
            ProgressEvent::ExperimentPending { path: path.clone() },
            ProgressEvent::StepStarted {
                path: path.clone(),
                step: StepKind::Extract,
            },
            ProgressEvent::StepFinished {
                path: path.clone(),
                step: StepKind::Extract,
                duration: Duration::from_millis(10),
                error: None,
            },
            ProgressEvent::StepFinished {
                path: path.clone(),
                step: StepKind::Plot,
                duration: Duration::from_millis(10),
                error: Some("'python' exited with status 1".to_string()),
            },
            ProgressEvent::ExperimentProcessed {
                path: path.clone(),
                duration: Duration::from_millis(20),
            },
            ProgressEvent::ExperimentFailed {
                path,
                error: "boom".to_string(),
            },
            ProgressEvent::Completed {
                inspected: 1,
                processed: 1,
                failed_steps: 1,
                total_time: Duration::from_secs(1),
            },
        ];

        for event in events {
            handler.on_progress(&event);
        }
    }
}
