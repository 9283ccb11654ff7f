//! Recording step for tests and dry experiments
//!
//! Records every invocation in a shared [`CallLog`] instead of spawning a
//! process. Two recording steps sharing one log show the order in which the
//! sweeper called them.

use super::{ExternalStep, ProcessError, StepOutcome};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCall {
    pub step: String,
    pub path: PathBuf,
}

/// Shared, ordered record of invocations
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<StepCall>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<StepCall> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Paths passed to the named step, in call order
    pub fn paths_for(&self, step: &str) -> Vec<PathBuf> {
        self.lock()
            .iter()
            .filter(|c| c.step == step)
            .map(|c| c.path.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StepCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, step: &str, path: &Path) {
        self.lock().push(StepCall {
            step: step.to_string(),
            path: path.to_path_buf(),
        });
    }
}

type RunHook = Box<dyn Fn(&Path) + Send + Sync>;

pub struct RecordingStep {
    name: String,
    log: CallLog,
    exit_code: i32,
    fail_on: Option<PathBuf>,
    hook: Option<RunHook>,
}

impl RecordingStep {
    pub fn new(name: impl Into<String>, log: CallLog) -> Self {
        Self {
            name: name.into(),
            log,
            exit_code: 0,
            fail_on: None,
            hook: None,
        }
    }

    /// Every run exits with `code`.
    pub fn exiting_with(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Only the run for `path` exits with status 1.
    pub fn failing_on(mut self, path: impl Into<PathBuf>) -> Self {
        self.fail_on = Some(path.into());
        self
    }

    /// Side effect performed on every run, e.g. writing the marker a real
    /// program would produce.
    pub fn on_run(mut self, hook: impl Fn(&Path) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }
}

#[async_trait]
impl ExternalStep for RecordingStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, path: &Path) -> Result<StepOutcome, ProcessError> {
        self.log.record(&self.name, path);
        if let Some(hook) = &self.hook {
            hook(path);
        }

        let code = match &self.fail_on {
            Some(target) if target == path => 1,
            _ => self.exit_code,
        };
        if code != 0 {
            return Err(ProcessError::ExitStatus {
                program: self.name.clone(),
                code,
            });
        }

        Ok(StepOutcome {
            exit_code: 0,
            duration: Duration::ZERO,
        })
    }
}
