//! Line-oriented console progress
//!
//! Each directory gets one line on stdout, built up piece by piece and
//! flushed after every piece so long-running steps show where the sweep is:
//!
//! ```text
//! Looping over all experiments
//! experiments/a not an experiment directory.
//! experiments/b is ongoing
//! experiments/c already done.
//! experiments/d extracting data... generating plots... done.
//! ```

use super::{ProgressEvent, ProgressHandler};
use crate::step::StepKind;
use std::io::{self, Write};
use std::sync::Mutex;

pub struct ConsoleHandler<W: Write + Send = io::Stdout> {
    out: Mutex<W>,
}

impl ConsoleHandler<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleHandler<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        // Progress output is advisory; a closed stdout must not stop the sweep.
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

impl<W: Write + Send> ProgressHandler for ConsoleHandler<W> {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { .. } => self.emit("Looping over all experiments\n"),
            ProgressEvent::ExperimentStarted { path } => {
                self.emit(&path.display().to_string());
            }
            ProgressEvent::ExperimentSkipped { status, .. } => {
                if let Some(message) = status.skip_message() {
                    self.emit(&format!(" {}\n", message));
                }
            }
            ProgressEvent::ExperimentPending { .. } => self.emit(" pending.\n"),
            ProgressEvent::StepStarted { step, .. } => match step {
                StepKind::Extract => self.emit(" extracting data..."),
                StepKind::Plot => self.emit(" generating plots..."),
            },
            ProgressEvent::ExperimentProcessed { .. } => self.emit(" done.\n"),
            ProgressEvent::ExperimentFailed { .. } => self.emit(" failed.\n"),
            ProgressEvent::StepFinished { .. } | ProgressEvent::Completed { .. } => {}
        }
    }
}
