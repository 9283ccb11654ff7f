//! Configuration management for expsweep
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. Built-in defaults ([`SweepConfig::builtin`])
//! 2. Environment variables (applied by [`SweepConfig::default`])
//! 3. An optional TOML file ([`SweepConfig::merge_file`])
//! 4. Command-line flags (applied by the CLI handlers)
//!
//! # Environment Variables
//!
//! - `EXPSWEEP_ROOT`: Directory holding the experiments - default: "experiments"
//! - `EXPSWEEP_EXTRACT_CMD`: Extraction command - default: "python extractFromTrace.py"
//! - `EXPSWEEP_PLOT_CMD`: Plotting command - default: "python generateSummaryPlots.py"
//! - `EXPSWEEP_STEP_TIMEOUT`: Per-step timeout in seconds - default: none
//! - `EXPSWEEP_LOG_LEVEL`: Logging level - default: "info"
//!
//! Commands are split on whitespace; the experiment path is appended as the
//! final argument when a step runs.
//!
//! # Config File
//!
//! ```toml
//! root_dir = "/data/experiments"
//! extract_command = "python3 extractFromTrace.py"
//! plot_command = "python3 generateSummaryPlots.py"
//! step_timeout_secs = 3600
//! step_failure_policy = "abort"
//! failure_policy = "isolate"
//! log_level = "debug"
//! ```

use crate::step::StepCommand;
use crate::sweep::{FailurePolicy, StepFailurePolicy};
use crate::util::logging::{parse_level, VALID_LEVELS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_ROOT_DIR: &str = "experiments";
const DEFAULT_EXTRACT_COMMAND: [&str; 2] = ["python", "extractFromTrace.py"];
const DEFAULT_PLOT_COMMAND: [&str; 2] = ["python", "generateSummaryPlots.py"];
const DEFAULT_LOG_LEVEL: &str = "info";
const MAX_STEP_TIMEOUT_SECS: u64 = 86_400;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to read config file {path}: {message}")]
    ReadFailed { path: PathBuf, message: String },

    #[error("Invalid config file {path}: {message}")]
    InvalidFile { path: PathBuf, message: String },
}

/// Everything a sweep needs, passed explicitly to the sweeper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepConfig {
    pub root_dir: PathBuf,
    pub extract_command: StepCommand,
    pub plot_command: StepCommand,
    pub step_timeout_secs: Option<u64>,
    pub step_failure_policy: StepFailurePolicy,
    pub failure_policy: FailurePolicy,
    pub log_level: String,
}

/// Shape of the TOML config file; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub root_dir: Option<PathBuf>,
    pub extract_command: Option<StepCommand>,
    pub plot_command: Option<StepCommand>,
    pub step_timeout_secs: Option<u64>,
    pub step_failure_policy: Option<StepFailurePolicy>,
    pub failure_policy: Option<FailurePolicy>,
    pub log_level: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

fn default_command([program, script]: [&str; 2]) -> StepCommand {
    StepCommand::new(program, [script])
}

impl Default for SweepConfig {
    /// Built-in defaults overlaid with `EXPSWEEP_*` environment variables.
    /// Values that fail to parse fall back to the built-in default.
    fn default() -> Self {
        let mut config = Self::builtin();

        if let Ok(root) = env::var("EXPSWEEP_ROOT") {
            if !root.trim().is_empty() {
                config.root_dir = PathBuf::from(root);
            }
        }

        if let Some(cmd) = env::var("EXPSWEEP_EXTRACT_CMD")
            .ok()
            .and_then(|v| StepCommand::parse(&v).ok())
        {
            config.extract_command = cmd;
        }

        if let Some(cmd) = env::var("EXPSWEEP_PLOT_CMD")
            .ok()
            .and_then(|v| StepCommand::parse(&v).ok())
        {
            config.plot_command = cmd;
        }

        if let Some(secs) = env::var("EXPSWEEP_STEP_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.step_timeout_secs = Some(secs);
        }

        if let Ok(level) = env::var("EXPSWEEP_LOG_LEVEL") {
            config.log_level = level.to_lowercase();
        }

        config
    }
}

impl SweepConfig {
    /// Defaults that reproduce the classic layout: `experiments/` swept with
    /// the two python scripts, no timeout, failures ignored.
    pub fn builtin() -> Self {
        Self {
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            extract_command: default_command(DEFAULT_EXTRACT_COMMAND),
            plot_command: default_command(DEFAULT_PLOT_COMMAND),
            step_timeout_secs: None,
            step_failure_policy: StepFailurePolicy::default(),
            failure_policy: FailurePolicy::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Environment defaults, then the file at `path` if given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = path {
            config.merge_file(FileConfig::load(path)?);
        }
        Ok(config)
    }

    pub fn merge_file(&mut self, file: FileConfig) {
        if let Some(root) = file.root_dir {
            self.root_dir = root;
        }
        if let Some(cmd) = file.extract_command {
            self.extract_command = cmd;
        }
        if let Some(cmd) = file.plot_command {
            self.plot_command = cmd;
        }
        if file.step_timeout_secs.is_some() {
            self.step_timeout_secs = file.step_timeout_secs;
        }
        if let Some(policy) = file.step_failure_policy {
            self.step_failure_policy = policy;
        }
        if let Some(policy) = file.failure_policy {
            self.failure_policy = policy;
        }
        if let Some(level) = file.log_level {
            self.log_level = level.to_lowercase();
        }
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs.map(Duration::from_secs)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for blank step programs, a timeout outside
    /// 1 second to 1 day, or an unknown log level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, cmd) in [
            ("extract_command", &self.extract_command),
            ("plot_command", &self.plot_command),
        ] {
            if cmd.program.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} must name a program",
                    field
                )));
            }
        }

        if self.root_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "root_dir must not be empty".to_string(),
            ));
        }

        if let Some(secs) = self.step_timeout_secs {
            if secs == 0 {
                return Err(ConfigError::ValidationFailed(
                    "Step timeout must be at least 1 second".to_string(),
                ));
            }
            if secs > MAX_STEP_TIMEOUT_SECS {
                return Err(ConfigError::ValidationFailed(
                    "Step timeout cannot exceed 1 day".to_string(),
                ));
            }
        }

        if parse_level(&self.log_level).is_none() {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}. Valid options: {}",
                self.log_level, VALID_LEVELS
            )));
        }

        Ok(())
    }

    /// Flat key/value view for JSON/YAML output
    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("root_dir".to_string(), self.root_dir.display().to_string());
        map.insert(
            "extract_command".to_string(),
            self.extract_command.to_string(),
        );
        map.insert("plot_command".to_string(), self.plot_command.to_string());
        if let Some(secs) = self.step_timeout_secs {
            map.insert("step_timeout_secs".to_string(), secs.to_string());
        }
        map.insert(
            "step_failure_policy".to_string(),
            self.step_failure_policy.to_string(),
        );
        map.insert(
            "failure_policy".to_string(),
            self.failure_policy.to_string(),
        );
        map.insert("log_level".to_string(), self.log_level.clone());

        map
    }
}

impl fmt::Display for SweepConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Expsweep Configuration:")?;
        writeln!(f, "  Root: {}", self.root_dir.display())?;
        writeln!(f, "  Extract Command: {}", self.extract_command)?;
        writeln!(f, "  Plot Command: {}", self.plot_command)?;
        match self.step_timeout_secs {
            Some(secs) => writeln!(f, "  Step Timeout: {}s", secs)?,
            None => writeln!(f, "  Step Timeout: none")?,
        }
        writeln!(f, "  Step Failures: {}", self.step_failure_policy)?;
        writeln!(f, "  Failure Policy: {}", self.failure_policy)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
