//! Sweep progress events and the handlers that consume them

use crate::experiment::ExperimentStatus;
use crate::step::StepKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Events emitted while sweeping a root directory
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Sweep started
    Started { root: PathBuf, dry_run: bool },

    /// A child of the root is about to be classified
    ExperimentStarted { path: PathBuf },

    /// The child was classified and will not be processed
    ExperimentSkipped {
        path: PathBuf,
        status: ExperimentStatus,
    },

    /// Pending experiment found during a dry run
    ExperimentPending { path: PathBuf },

    /// External step started
    StepStarted { path: PathBuf, step: StepKind },

    /// External step finished, successfully or not
    StepFinished {
        path: PathBuf,
        step: StepKind,
        duration: Duration,
        error: Option<String>,
    },

    /// Both steps ran for this experiment
    ExperimentProcessed { path: PathBuf, duration: Duration },

    /// Processing was abandoned for this experiment
    ExperimentFailed { path: PathBuf, error: String },

    /// Sweep finished
    Completed {
        inspected: usize,
        processed: usize,
        failed_steps: usize,
        total_time: Duration,
    },
}

/// Trait for handling progress events during a sweep
pub trait ProgressHandler: Send + Sync {
    /// Receives every event in emission order; must not block for long.
    fn on_progress(&self, event: &ProgressEvent);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Forwards every event to each inner handler in order
#[derive(Default, Clone)]
pub struct MultiHandler {
    handlers: Vec<Arc<dyn ProgressHandler>>,
}

impl MultiHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl ProgressHandler for MultiHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        for handler in &self.handlers {
            handler.on_progress(event);
        }
    }
}
