//! expsweep - batch processing for experiment output directories
//!
//! An experiment root holds one directory per measurement run. `expsweep`
//! looks at each of them, decides from marker files whether it still needs
//! work, and if so runs an extraction program followed by a plotting program
//! with the experiment directory as argument.
//!
//! # Example Usage
//!
//! ```no_run
//! use expsweep::{SweepConfig, Sweeper};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SweepConfig::default();
//! config.validate()?;
//!
//! let report = Sweeper::from_config(&config).sweep(&config.root_dir).await?;
//! println!("{} experiments processed", report.summary.processed);
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`experiment`]: marker files and directory classification
//! - [`sweep`]: the sweep loop, failure policies and reports
//! - [`step`]: external step abstraction and the process-backed implementation
//! - [`fs`]: file system abstraction with an in-memory mock
//! - [`progress`]: progress events and handlers
//! - [`config`]: layered configuration
//! - [`cli`]: command-line interface

pub mod cli;
pub mod config;
pub mod experiment;
pub mod fs;
pub mod progress;
pub mod step;
pub mod sweep;
pub mod util;

pub use config::{ConfigError, FileConfig, SweepConfig};
pub use experiment::{ExperimentDir, ExperimentStatus};
pub use step::{CommandStep, ExternalStep, ProcessError, StepCommand, StepKind};
pub use sweep::{
    FailurePolicy, StepFailurePolicy, SweepError, SweepOptions, SweepReport, Sweeper,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_expsweep() {
        assert_eq!(NAME, "expsweep");
    }
}
