//! Experiment directory model and classification
//!
//! An experiment directory is recognised purely by the presence of marker
//! files. Marker contents are never read.
//!
//! | Marker               | Meaning                                   |
//! |----------------------|-------------------------------------------|
//! | `log.txt`            | the directory holds an experiment         |
//! | `ongoing`            | the experiment is still running           |
//! | `plots/allplots.pdf` | extraction and plotting already happened  |

use crate::fs::FileSystem;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Trace log every experiment writes; its absence means "not an experiment".
pub const LOG_MARKER: &str = "log.txt";

/// Sentinel left behind while an experiment is still producing data.
pub const ONGOING_MARKER: &str = "ongoing";

/// Final artifact of the plotting step.
pub const DONE_MARKER: &str = "plots/allplots.pdf";

/// Classification of one candidate directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    NotAnExperiment,
    Ongoing,
    AlreadyDone,
    Pending,
}

impl ExperimentStatus {
    /// Whether extraction and plotting should run for this status
    pub fn needs_processing(self) -> bool {
        self == ExperimentStatus::Pending
    }

    /// Console wording for statuses that end the line without processing
    pub fn skip_message(self) -> Option<&'static str> {
        match self {
            ExperimentStatus::NotAnExperiment => Some("not an experiment directory."),
            ExperimentStatus::Ongoing => Some("is ongoing"),
            ExperimentStatus::AlreadyDone => Some("already done."),
            ExperimentStatus::Pending => None,
        }
    }
}

impl fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExperimentStatus::NotAnExperiment => "not an experiment",
            ExperimentStatus::Ongoing => "ongoing",
            ExperimentStatus::AlreadyDone => "already done",
            ExperimentStatus::Pending => "pending",
        };
        f.write_str(label)
    }
}

/// Marker state of one child of the sweep root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperimentDir {
    pub name: String,
    pub path: PathBuf,
    pub has_log: bool,
    pub is_ongoing: bool,
    pub is_complete: bool,
}

impl ExperimentDir {
    /// Probes the marker files under `path`.
    ///
    /// Works for any path: a plain file or a missing path simply has no
    /// markers and classifies as [`ExperimentStatus::NotAnExperiment`].
    pub fn inspect(fs: &dyn FileSystem, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: name.into(),
            has_log: fs.has_marker(&path, LOG_MARKER),
            is_ongoing: fs.has_marker(&path, ONGOING_MARKER),
            is_complete: fs.has_marker(&path, DONE_MARKER),
            path,
        }
    }

    /// First matching rule wins: log, then ongoing, then done.
    pub fn status(&self) -> ExperimentStatus {
        if !self.has_log {
            ExperimentStatus::NotAnExperiment
        } else if self.is_ongoing {
            ExperimentStatus::Ongoing
        } else if self.is_complete {
            ExperimentStatus::AlreadyDone
        } else {
            ExperimentStatus::Pending
        }
    }
}
