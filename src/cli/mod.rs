pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, ConfigArgs, StatusArgs, SweepArgs};
pub use handlers::{handle_config, handle_status, handle_sweep};
pub use output::{OutputFormat, OutputFormatter};
