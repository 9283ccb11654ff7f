//! External processing steps
//!
//! The sweeper knows nothing about how traces are extracted or plots are
//! drawn. It only hands an experiment path to an [`ExternalStep`] and looks at
//! the result. [`CommandStep`] is the production implementation and runs a
//! child process with the experiment path appended as its last argument.

mod command;
mod recording;

pub use command::{CommandStep, StepCommand};
pub use recording::{CallLog, RecordingStep, StepCall};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Which of the two per-experiment steps is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Extract,
    Plot,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Extract => f.write_str("extract"),
            StepKind::Plot => f.write_str("plot"),
        }
    }
}

/// Result of a step that ran to a successful exit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub exit_code: i32,
    pub duration: Duration,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed waiting for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with status {code}")]
    ExitStatus { program: String, code: i32 },

    #[error("'{program}' was terminated by a signal")]
    Terminated { program: String },

    #[error("'{program}' timed out after {seconds} seconds")]
    Timeout { program: String, seconds: u64 },
}

impl ProcessError {
    /// Exit code of the child if it ran to completion
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::ExitStatus { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// A processing step run against a single experiment directory
#[async_trait]
pub trait ExternalStep: Send + Sync {
    /// Short human-readable name used in logs
    fn name(&self) -> &str;

    /// Runs the step to completion for the experiment at `path`.
    async fn run(&self, path: &Path) -> Result<StepOutcome, ProcessError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_kind_display() {
        assert_eq!(StepKind::Extract.to_string(), "extract");
        assert_eq!(StepKind::Plot.to_string(), "plot");
    }

    #[test]
    fn test_process_error_messages() {
        let err = ProcessError::ExitStatus {
            program: "python".to_string(),
            code: 3,
        };
        assert_eq!(err.to_string(), "'python' exited with status 3");
        assert_eq!(err.exit_code(), Some(3));

        let err = ProcessError::Timeout {
            program: "python".to_string(),
            seconds: 5,
        };
        assert!(err.to_string().contains("timed out after 5 seconds"));
        assert_eq!(err.exit_code(), None);
    }
}
